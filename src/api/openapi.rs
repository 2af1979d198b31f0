//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the reddit-tube REST
//! API using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the reddit-tube REST API
///
/// The spec can be accessed via:
/// - `/api/v1/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "reddit-tube REST API",
        version = "0.1.0",
        description = "Chat-tool backend for couriering Reddit media to YouTube: tool dispatch, OAuth callback, session history, and pipeline events",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6789", description = "Local development server")
    ),
    paths(
        // Tools
        crate::api::routes::invoke_tool,

        // Sessions
        crate::api::routes::get_session_history,

        // OAuth
        crate::api::routes::oauth_callback,

        // System
        crate::api::routes::get_config,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::SessionId,
        crate::types::VideoId,
        crate::types::ListingMode,
        crate::types::PrivacyStatus,
        crate::types::Submission,
        crate::types::DownloadedMedia,
        crate::types::UploadMetadata,
        crate::types::UploadState,
        crate::types::TurnKind,
        crate::types::TurnRecord,
        crate::types::Event,

        // Tool contract
        crate::tools::ToolRequest,
        crate::tools::ToolResponse,
        crate::tools::CategoryInfo,

        // Config types from config.rs
        crate::config::Config,
        crate::config::RedditConfig,
        crate::config::YouTubeConfig,
        crate::config::StorageConfig,
        crate::config::LlmConfig,
        crate::config::ApiConfig,

        // Error envelope
        crate::error::ApiError,
        crate::error::ErrorDetail,
    ))
)]
pub struct ApiDoc;
