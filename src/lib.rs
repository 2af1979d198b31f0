//! # reddit-tube
//!
//! Chat-tool backend library for couriering media from Reddit to YouTube.
//!
//! An external LLM agent loop drives this library through typed tool
//! requests: list submissions from a subreddit, download their media,
//! obtain an OAuth2 credential (reuse, refresh, or interactive consent),
//! and push the file to YouTube over the resumable-upload protocol. Every
//! invocation is recorded in a per-session history file.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI; a small axum REST surface exposes
//!   tool dispatch, the OAuth callback, and session history for embedding
//! - **Typed boundaries** - Tool requests are a tagged enum validated
//!   before dispatch, never loose argument bags
//! - **Event-driven** - Consumers subscribe to pipeline events, no polling
//! - **No hidden retries** - Upstream failures stop the current operation
//!   and surface to the conversational layer as-is
//!
//! ## Quick Start
//!
//! ```no_run
//! use reddit_tube::{Config, RedditTube, SessionId, ToolRequest};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let tube = Arc::new(RedditTube::new(config)?);
//!
//!     // Subscribe to pipeline events
//!     let mut events = tube.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Serve the tools endpoint and OAuth callback
//!     let server = tube.spawn_api_server();
//!
//!     // Or invoke tools directly
//!     let session = SessionId::new();
//!     let response = tube.invoke(session, ToolRequest::VerifyToken).await?;
//!     println!("{response:?}");
//!
//!     server.await??;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// OAuth2 credential acquisition
pub mod auth;
/// Configuration types
pub mod config;
/// Media retrieval to local storage
pub mod downloader;
/// Error types
pub mod error;
/// Submission listing against the content source
pub mod fetcher;
/// File-backed session persistence
pub mod session;
/// Chat-tool contract and dispatch
pub mod tools;
/// The central courier orchestrator
pub mod tube;
/// Core types and events
pub mod types;
/// Resumable upload driver
pub mod uploader;

// Re-export commonly used types
pub use auth::{AuthFlow, ClientSecrets, Credential, TokenStore};
pub use config::{ApiConfig, Config, LlmConfig, RedditConfig, StorageConfig, YouTubeConfig};
pub use downloader::MediaDownloader;
pub use error::{
    ApiError, AuthError, DownloadError, Error, ErrorDetail, Result, SessionError, SourceError,
    ToHttpStatus, UploadError,
};
pub use fetcher::RedditFetcher;
pub use session::SessionStore;
pub use tools::{CategoryInfo, ToolRequest, ToolResponse};
pub use tube::RedditTube;
pub use types::{
    DownloadedMedia, Event, ListingMode, PrivacyStatus, SessionId, Submission, TurnKind,
    TurnRecord, UploadMetadata, UploadState, VideoId,
};
pub use uploader::YouTubeUploader;
