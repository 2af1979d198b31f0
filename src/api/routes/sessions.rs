//! Session history handler.

use crate::api::AppState;
use crate::error::Error;
use crate::types::{SessionId, TurnRecord};
use axum::{
    Json,
    extract::{Path, State},
};

/// GET /api/v1/sessions/:id/history - Ordered turn records of a session
///
/// Unknown session identifiers yield an empty list, not an error.
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/history",
    tag = "sessions",
    params(
        ("id" = SessionId, Path, description = "Session identifier")
    ),
    responses(
        (status = 200, description = "Ordered turn records (empty for unknown sessions)", body = Vec<TurnRecord>),
        (status = 500, description = "Session record unreadable")
    )
)]
pub async fn get_session_history(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<Json<Vec<TurnRecord>>, Error> {
    let history = state.tube.session_history(id).await?;
    Ok(Json(history))
}
