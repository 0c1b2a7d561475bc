//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::{ExecutionTrace, RoomName, TraceLanguage, TraceServiceError},
    infrastructure::dto::http::{ErrorResponse, RoomDetailDto, RoomSummaryDto, VisualizeRequest},
    ui::state::AppState,
    usecase::BrokerError,
};
use kyodo_shared::time::timestamp_to_rfc3339;

fn unavailable(e: BrokerError) -> StatusCode {
    tracing::error!("Relay state unavailable: {}", e);
    StatusCode::SERVICE_UNAVAILABLE
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of rooms
pub async fn get_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomSummaryDto>>, StatusCode> {
    let rooms = state.broker.list_rooms().await.map_err(unavailable)?;

    // Domain Model から DTO への変換
    let summaries = rooms
        .into_iter()
        .map(|room| RoomSummaryDto {
            name: room.name.into_string(),
            members: room
                .members
                .into_iter()
                .map(|m| m.display_name.into_string())
                .collect(),
            message_count: room.message_count,
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        })
        .collect();

    Ok(Json(summaries))
}

/// Get room detail by name
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    // A name that cannot be valid cannot exist either
    let room = RoomName::new(room).map_err(|_| StatusCode::NOT_FOUND)?;
    let snapshot = state
        .broker
        .room_detail(room)
        .await
        .map_err(unavailable)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(RoomDetailDto {
        name: snapshot.name.into_string(),
        members: snapshot.members.into_iter().map(Into::into).collect(),
        message_count: snapshot.message_count,
        active_calls: snapshot.active_calls,
        created_at: timestamp_to_rfc3339(snapshot.created_at.value()),
    }))
}

/// Step-trace a program through the visualization service
pub async fn visualize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VisualizeRequest>,
) -> Result<Json<ExecutionTrace>, (StatusCode, Json<ErrorResponse>)> {
    let language = request.language.parse::<TraceLanguage>().map_err(|_| {
        tracing::warn!("Visualize request for unsupported language '{}'", request.language);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Language not supported.")),
        )
    })?;

    match state.trace_service.trace(language, &request.code).await {
        Ok(trace) => {
            tracing::info!("Trace produced {} step(s)", trace.steps.len());
            Ok(Json(trace))
        }
        Err(e) => {
            tracing::error!("Trace service failed: {}", e);
            let details = match e {
                TraceServiceError::Upstream { body, .. } if !body.is_empty() => body,
                other => other.to_string(),
            };
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new("Visualizer request failed").with_details(details)),
            ))
        }
    }
}
