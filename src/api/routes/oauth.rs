//! OAuth callback handler.
//!
//! The authorization server redirects the user's browser here with the
//! authorization code; the handler passes it to the auth flow and shows a
//! minimal confirmation page.

use crate::api::AppState;
use crate::error::Error;
use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;
use utoipa::IntoParams;

/// Query parameters delivered by the authorization server
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    /// CSRF state token identifying the pending flow
    pub state: String,
    /// Authorization code to exchange for tokens
    pub code: String,
}

/// GET /oauth/callback - Receive the authorization code
#[utoipa::path(
    get,
    path = "/oauth/callback",
    tag = "oauth",
    params(CallbackQuery),
    responses(
        (status = 200, description = "Authorization completed, credential persisted"),
        (status = 400, description = "Unknown state token"),
        (status = 401, description = "Code exchange rejected by the authorization server")
    )
)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Html<&'static str>, Error> {
    state
        .tube
        .complete_authorization(&query.state, &query.code)
        .await?;

    Ok(Html(
        "<!DOCTYPE html><html><body><p>Authorization complete. \
         You can close this window and return to the chat.</p></body></html>",
    ))
}
