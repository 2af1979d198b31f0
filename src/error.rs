//! Error types for reddit-tube
//!
//! This module provides the error handling for the library, including:
//! - Domain-specific error types (Auth, Source, Download, Upload, Session)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes
//!
//! None of the components retry internally: every error is a clean stop of
//! the current operation, surfaced to the calling tool/agent layer as-is.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for reddit-tube operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for reddit-tube
///
/// This is the primary error type used throughout the library. Each variant
/// includes contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "REDDIT_CLIENT_ID")
        key: Option<String>,
    },

    /// Cannot obtain a valid platform credential
    #[error("authentication error: {0}")]
    Authentication(#[from] AuthError),

    /// Listing call against the content source failed
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Media retrieval failed
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// Transport failure while uploading
    #[error("upload error: {0}")]
    Upload(#[from] UploadError),

    /// Session record could not be read or written
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A tool request failed boundary validation before dispatch
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Authentication errors (OAuth2 credential acquisition)
///
/// Fatal for the current upload request but never for the process.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The client secrets file does not exist
    #[error("client secrets file not found at {path}")]
    MissingSecrets {
        /// Configured path to the client secrets file
        path: PathBuf,
    },

    /// The client secrets file could not be parsed
    #[error("invalid client secrets: {reason}")]
    InvalidSecrets {
        /// Why the file was rejected
        reason: String,
    },

    /// The refresh-token grant was rejected by the authorization server
    #[error("token refresh failed: {reason}")]
    RefreshFailed {
        /// Server response or transport failure description
        reason: String,
    },

    /// The authorization-code exchange failed
    #[error("authorization code exchange failed: {reason}")]
    ExchangeFailed {
        /// Server response or transport failure description
        reason: String,
    },

    /// No authorization code arrived at the callback before the deadline
    #[error("interactive authorization timed out after {waited_secs}s")]
    AuthorizationTimedOut {
        /// How long the flow waited for the callback
        waited_secs: u64,
    },

    /// The callback carried a state token that matches no pending flow
    #[error("unknown authorization state token: {state}")]
    UnknownState {
        /// The state token received on the callback
        state: String,
    },

    /// The pending authorization was dropped before a code arrived
    #[error("authorization callback channel closed before a code arrived")]
    CallbackDropped,
}

/// Content-source errors (listing the upstream)
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source's own token endpoint rejected the request
    #[error("source token request failed with HTTP {status}")]
    TokenRequestFailed {
        /// HTTP status returned by the token endpoint
        status: u16,
    },

    /// The listing call returned a non-success status
    #[error("listing r/{subreddit} failed with HTTP {status}")]
    ListingFailed {
        /// Subreddit that was being listed
        subreddit: String,
        /// HTTP status returned by the listing endpoint
        status: u16,
    },

    /// The listing response body did not match the expected envelope
    #[error("malformed listing response: {reason}")]
    MalformedListing {
        /// Why the body was rejected
        reason: String,
    },
}

/// Media download errors
#[derive(Debug, Error)]
pub enum DownloadError {
    /// URL scheme is not downloadable (only http/https are)
    #[error("unsupported URL scheme: {url}")]
    UnsupportedUrl {
        /// The offending URL
        url: String,
    },

    /// URL could not be parsed at all
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// Parse failure description
        reason: String,
    },

    /// The media host returned a non-success status
    #[error("download of {url} failed with HTTP {status}")]
    RequestFailed {
        /// The URL being downloaded
        url: String,
        /// HTTP status returned by the media host
        status: u16,
    },

    /// The transfer broke off mid-stream
    #[error("download of {url} interrupted: {reason}")]
    Interrupted {
        /// The URL being downloaded
        url: String,
        /// Transport failure description
        reason: String,
    },
}

/// Resumable upload errors
#[derive(Debug, Error)]
pub enum UploadError {
    /// The upload source path is not a regular file
    #[error("upload source {path} is not a regular file")]
    NotAFile {
        /// The path that was handed to the uploader
        path: PathBuf,
    },

    /// The initiation request was rejected
    #[error("upload initiation failed with HTTP {status}")]
    InitiationFailed {
        /// HTTP status returned by the initiation endpoint
        status: u16,
    },

    /// The initiation response carried no session URI
    #[error("upload initiation response carried no Location header")]
    MissingSessionUri,

    /// A chunk was rejected mid-upload
    #[error("chunk at offset {offset} rejected with HTTP {status}")]
    ChunkFailed {
        /// Byte offset of the rejected chunk
        offset: u64,
        /// HTTP status returned for the chunk
        status: u16,
    },

    /// The transport failed mid-upload (connection reset, timeout, ...)
    #[error("upload transport failure: {reason}")]
    Transport {
        /// Transport failure description
        reason: String,
    },

    /// The final response did not contain a video identifier
    #[error("malformed upload response: {reason}")]
    MalformedResponse {
        /// Why the final response was rejected
        reason: String,
    },
}

/// Session store errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// A session record file exists but cannot be parsed
    #[error("session record {path} is corrupt: {reason}")]
    Corrupt {
        /// Path of the unreadable record
        path: PathBuf,
        /// Parse failure description
        reason: String,
    },
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
/// It follows a standard format with machine-readable error codes,
/// human-readable messages, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "unsupported_url",
///     "message": "unsupported URL scheme: ftp://example.com/clip.mp4",
///     "details": {
///       "url": "ftp://example.com/clip.mp4"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "unsupported_url")
    ///
    /// Clients can use this for programmatic error handling.
    pub code: String,

    /// Human-readable error message
    ///
    /// This is suitable for displaying to end users.
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::InvalidRequest(_) => 400,
            Error::Authentication(AuthError::UnknownState { .. }) => 400,

            // 401 Unauthorized - no valid credential obtainable
            Error::Authentication(_) => 401,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 422 Unprocessable Entity - Semantic errors
            Error::Download(DownloadError::UnsupportedUrl { .. }) => 422,
            Error::Download(DownloadError::InvalidUrl { .. }) => 422,
            Error::Upload(UploadError::NotAFile { .. }) => 422,

            // 502 Bad Gateway - External service errors
            Error::Source(_) => 502,
            Error::Download(_) => 502,
            Error::Upload(_) => 502,
            Error::Network(_) => 502,

            // 500 Internal Server Error - Server-side issues
            Error::Session(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Authentication(e) => match e {
                AuthError::MissingSecrets { .. } => "missing_secrets",
                AuthError::InvalidSecrets { .. } => "invalid_secrets",
                AuthError::RefreshFailed { .. } => "refresh_failed",
                AuthError::ExchangeFailed { .. } => "exchange_failed",
                AuthError::AuthorizationTimedOut { .. } => "authorization_timed_out",
                AuthError::UnknownState { .. } => "unknown_state",
                AuthError::CallbackDropped => "callback_dropped",
            },
            Error::Source(e) => match e {
                SourceError::TokenRequestFailed { .. } => "source_token_failed",
                SourceError::ListingFailed { .. } => "listing_failed",
                SourceError::MalformedListing { .. } => "malformed_listing",
            },
            Error::Download(e) => match e {
                DownloadError::UnsupportedUrl { .. } => "unsupported_url",
                DownloadError::InvalidUrl { .. } => "invalid_url",
                DownloadError::RequestFailed { .. } => "download_request_failed",
                DownloadError::Interrupted { .. } => "download_interrupted",
            },
            Error::Upload(e) => match e {
                UploadError::NotAFile { .. } => "not_a_file",
                UploadError::InitiationFailed { .. } => "upload_initiation_failed",
                UploadError::MissingSessionUri => "missing_session_uri",
                UploadError::ChunkFailed { .. } => "chunk_failed",
                UploadError::Transport { .. } => "upload_transport",
                UploadError::MalformedResponse { .. } => "malformed_upload_response",
            },
            Error::Session(SessionError::Corrupt { .. }) => "session_corrupt",
            Error::InvalidRequest(_) => "invalid_request",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::NotFound(_) => "not_found",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::Download(DownloadError::UnsupportedUrl { url }) => Some(serde_json::json!({
                "url": url,
            })),
            Error::Download(DownloadError::RequestFailed { url, status }) => {
                Some(serde_json::json!({
                    "url": url,
                    "status": status,
                }))
            }
            Error::Upload(UploadError::NotAFile { path }) => Some(serde_json::json!({
                "path": path,
            })),
            Error::Upload(UploadError::ChunkFailed { offset, status }) => {
                Some(serde_json::json!({
                    "offset": offset,
                    "status": status,
                }))
            }
            Error::Source(SourceError::ListingFailed { subreddit, status }) => {
                Some(serde_json::json!({
                    "subreddit": subreddit,
                    "status": status,
                }))
            }
            Error::Authentication(AuthError::AuthorizationTimedOut { waited_secs }) => {
                Some(serde_json::json!({
                    "waited_secs": waited_secs,
                }))
            }
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
