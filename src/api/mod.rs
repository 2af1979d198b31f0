//! REST API server module
//!
//! Exposes the tool-dispatch endpoint the external agent loop calls, the
//! OAuth callback that closes the interactive authorization flow, session
//! history, the redacted configuration, a health check, an OpenAPI 3.1
//! spec, and a server-sent-events stream of pipeline events.

use crate::config::Config;
use crate::error::Result;
use crate::tube::RedditTube;
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Tools
/// - `POST /api/v1/tools?session_id=` - Dispatch a tool request
///
/// ## Sessions
/// - `GET /api/v1/sessions/:id/history` - Ordered turn records of a session
///
/// ## OAuth
/// - `GET /oauth/callback` - Receives the authorization code (exempt from
///   API-key auth: the authorization server's redirect carries no header)
///
/// ## System
/// - `GET /api/v1/config` - Current config (sensitive fields redacted)
/// - `GET /api/v1/health` - Health check
/// - `GET /api/v1/events` - Server-sent events stream
/// - `GET /api/v1/openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(tube: Arc<RedditTube>, config: Arc<Config>) -> Router {
    let state = AppState::new(tube, config.clone());

    // Routes behind the optional API key
    let mut protected = Router::new()
        .route("/api/v1/tools", post(routes::invoke_tool))
        .route(
            "/api/v1/sessions/:id/history",
            get(routes::get_session_history),
        )
        .route("/api/v1/config", get(routes::get_config))
        .route("/api/v1/health", get(routes::health_check))
        .route("/api/v1/openapi.json", get(routes::openapi_spec))
        .route("/api/v1/events", get(routes::event_stream));

    if config.server.api_key.is_some() {
        protected = protected.layer(middleware::from_fn_with_state(
            config.server.api_key.clone(),
            auth::require_api_key,
        ));
    }

    // The OAuth callback stays outside the protected set
    let router = protected.route("/oauth/callback", get(routes::oauth_callback));

    // Merge Swagger UI routes if enabled in config (before applying state).
    // The UI serves its own copy of the spec under /api-docs so it does not
    // collide with the /api/v1/openapi.json route above.
    let router = if config.server.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state).layer(TraceLayer::new_for_http());

    // Apply CORS middleware if enabled in config
    if config.server.cors_enabled {
        let cors = build_cors_layer(&config.server.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// Origins may contain "*" to allow any origin; otherwise only the listed
/// origins are allowed, with all methods and headers.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Creates a TCP listener, binds it to the configured address, and serves
/// the router until the server is shut down.
///
/// # Errors
/// Returns an error when the listener cannot bind or the server fails.
///
/// # Example
///
/// ```no_run
/// use reddit_tube::{Config, RedditTube};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let tube = Arc::new(RedditTube::new((*config).clone())?);
///
/// // Start API server (blocks until shutdown)
/// reddit_tube::api::start_api_server(tube, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(tube: Arc<RedditTube>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.server.bind_address;

    tracing::info!(address = %bind_address, "starting API server");

    let app = create_router(tube, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
