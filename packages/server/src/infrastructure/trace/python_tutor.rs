//! Python Tutor `web_exec` client.
//!
//! The backend takes a form-encoded script and answers with a JSON `trace`
//! array; each entry is normalised into a [`TraceStep`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::{
    ExecutionTrace, StackFrame, TraceLanguage, TraceService, TraceServiceError, TraceStep,
};

pub const DEFAULT_ENDPOINT: &str = "https://pythontutor.com/web_exec";

const USER_AGENT: &str = concat!("kyodo-server/", env!("CARGO_PKG_VERSION"));

/// Fixed execution options: no cumulative mode, primitives inline, user code only
const OPTIONS_JSON: &str =
    r#"{"cumulative_mode":false,"heap_primitives":false,"show_only_user_code":true}"#;

#[derive(Debug, Deserialize)]
struct WebExecResponse {
    trace: Option<Vec<RawStep>>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    event: String,
    #[serde(default)]
    func_name: Option<String>,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stack_to_render: Vec<RawFrame>,
    #[serde(default)]
    globals: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    func_name: String,
    #[serde(default)]
    encoded_locals: Map<String, Value>,
}

impl From<RawStep> for TraceStep {
    fn from(raw: RawStep) -> Self {
        Self {
            line: raw.line,
            event: raw.event,
            function_name: raw.func_name,
            stdout: raw.stdout,
            frames: raw
                .stack_to_render
                .into_iter()
                .map(|frame| StackFrame {
                    function_name: frame.func_name,
                    variables: frame.encoded_locals,
                })
                .collect(),
            globals: raw.globals,
        }
    }
}

/// [`TraceService`] backed by Python Tutor
#[derive(Debug, Clone)]
pub struct PythonTutorClient {
    http: Client,
    endpoint: String,
}

impl PythonTutorClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TraceServiceError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TraceServiceError::Network(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl TraceService for PythonTutorClient {
    async fn trace(
        &self,
        language: TraceLanguage,
        code: &str,
    ) -> Result<ExecutionTrace, TraceServiceError> {
        let params = [
            ("user_script", code),
            ("raw_input_json", "null"),
            ("options_json", OPTIONS_JSON),
            ("lang", language.backend_code()),
        ];

        tracing::debug!(
            "Requesting trace ({}, {} bytes) from {}",
            language.backend_code(),
            code.len(),
            self.endpoint
        );
        let res = self
            .http
            .post(&self.endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| TraceServiceError::Network(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(TraceServiceError::Upstream { status, body });
        }

        let body = res
            .json::<WebExecResponse>()
            .await
            .map_err(|e| TraceServiceError::Decode(e.to_string()))?;
        let steps = body
            .trace
            .ok_or_else(|| TraceServiceError::Decode("response has no trace".to_string()))?;

        Ok(ExecutionTrace {
            steps: steps.into_iter().map(TraceStep::from).collect(),
        })
    }
}
