//! Shared handler state.

use std::sync::Arc;

use crate::{domain::TraceService, usecase::BrokerHandle};

pub struct AppState {
    /// Entry point to the relay; all room state lives behind it
    pub broker: BrokerHandle,
    pub trace_service: Arc<dyn TraceService>,
}
