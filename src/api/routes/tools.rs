//! Tool dispatch handler.

use crate::api::AppState;
use crate::error::Error;
use crate::tools::{ToolRequest, ToolResponse};
use crate::types::SessionId;
use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use utoipa::IntoParams;

/// Query parameters of the tool dispatch route
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SessionQuery {
    /// Session the invocation belongs to
    pub session_id: SessionId,
}

/// POST /api/v1/tools - Dispatch a tool request for a session
#[utoipa::path(
    post,
    path = "/api/v1/tools",
    tag = "tools",
    params(SessionQuery),
    request_body = ToolRequest,
    responses(
        (status = 200, description = "Tool result", body = ToolResponse),
        (status = 400, description = "Request failed boundary validation"),
        (status = 401, description = "No valid credential obtainable"),
        (status = 422, description = "Semantically invalid input (bad URL scheme, not a file)"),
        (status = 502, description = "Upstream service failure")
    )
)]
pub async fn invoke_tool(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    Json(request): Json<ToolRequest>,
) -> Result<Json<ToolResponse>, Error> {
    let response = state.tube.invoke(query.session_id, request).await?;
    Ok(Json(response))
}
