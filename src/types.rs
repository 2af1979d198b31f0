//! Core types and events for reddit-tube

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use utoipa::ToSchema;

/// Unique identifier for a chat session
///
/// Sessions group a sequence of conversational turns and their associated
/// tool invocations. The identifier is opaque to this library; the agent
/// layer mints it.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct SessionId(pub uuid::Uuid);

impl SessionId {
    /// Mint a fresh random session identifier
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Get the inner UUID value
    pub fn get(&self) -> uuid::Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<uuid::Uuid> for SessionId {
    fn from(id: uuid::Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Identifier assigned by the platform to a completed upload
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Wrap a platform-assigned identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// View the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ranking algorithm used to enumerate content items
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListingMode {
    /// Newest-first
    New,
    /// Currently popular
    Hot,
    /// Highest-scored over a period
    #[default]
    Top,
}

impl ListingMode {
    /// The path segment the source API uses for this mode
    pub fn as_path_segment(&self) -> &'static str {
        match self {
            ListingMode::New => "new",
            ListingMode::Hot => "hot",
            ListingMode::Top => "top",
        }
    }
}

impl std::fmt::Display for ListingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_path_segment())
    }
}

/// Visibility of an uploaded video
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    /// Visible only to the owner
    #[default]
    Private,
    /// Publicly listed
    Public,
    /// Reachable by link but not listed
    Unlisted,
}

impl PrivacyStatus {
    /// The string value the platform API expects
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyStatus::Private => "private",
            PrivacyStatus::Public => "public",
            PrivacyStatus::Unlisted => "unlisted",
        }
    }
}

/// A single item returned by the submission fetcher
///
/// Immutable once fetched; not persisted beyond the in-memory fetch result.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Submission {
    /// External identifier assigned by the source
    pub id: String,

    /// Submission title
    pub title: String,

    /// Body text (empty for link posts)
    pub body: String,

    /// The post URL
    pub url: String,

    /// Direct media URL when the source hosts the video itself
    ///
    /// For video posts this is the highest-quality stream the source
    /// advertises; preferred over `url` when downloading.
    pub media_url: Option<String>,

    /// Whether the source flags this submission as a hosted video
    pub is_video: bool,

    /// Listing mode this submission was fetched under
    pub listing: ListingMode,

    /// Zero-based position in the source's native ranking order
    pub rank: usize,
}

/// Record of one successfully downloaded media file
///
/// Shape of the download-history entries handed back to the agent layer.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadedMedia {
    /// Title of the source submission
    pub title: String,

    /// URL the media was fetched from
    pub url: String,

    /// Local path of the downloaded file
    #[schema(value_type = String)]
    pub file_path: PathBuf,

    /// Description carried over from the submission body
    pub description: String,

    /// Suggested platform category for a follow-up upload
    pub category_id: String,
}

/// Metadata attached to an upload
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadMetadata {
    /// Video title
    pub title: String,

    /// Video description
    #[serde(default)]
    pub description: String,

    /// Tag set (deduplicated, stable order)
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Platform category identifier
    pub category_id: String,

    /// Visibility of the uploaded video
    #[serde(default)]
    pub privacy: PrivacyStatus,
}

/// State of a single upload job
///
/// `NotStarted → InProgress(percent) → Complete(video_id)`, with
/// `InProgress → Failed` on transport error. There are no transitions out
/// of `Failed` or `Complete`; a job is never retried automatically.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadState {
    /// Job created, no bytes sent yet
    NotStarted,
    /// Bytes in flight
    InProgress {
        /// Cumulative progress, 0-100, non-decreasing
        percent: u8,
    },
    /// Final response received
    Complete {
        /// Platform-assigned video identifier
        video_id: VideoId,
    },
    /// Transport error aborted the job
    Failed,
}

impl UploadState {
    /// Whether the job can make no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Complete { .. } | UploadState::Failed)
    }
}

/// Kind of a persisted conversational turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    /// Plain chat text
    Text,
    /// A tool was invoked
    ToolCall,
    /// A tool produced a result (or an error)
    ToolResult,
}

/// One entry in a session's ordered history
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TurnRecord {
    /// Who produced the turn ("user", "assistant", a tool name, ...)
    pub role: String,

    /// What kind of turn this is
    pub kind: TurnKind,

    /// Turn payload; tool calls and results carry structured JSON
    #[schema(value_type = Object)]
    pub content: serde_json::Value,

    /// When the turn was recorded
    pub created_at: DateTime<Utc>,
}

impl TurnRecord {
    /// Record a plain text turn
    pub fn text(role: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            kind: TurnKind::Text,
            content: serde_json::Value::String(message.into()),
            created_at: Utc::now(),
        }
    }

    /// Record a tool invocation
    pub fn tool_call(tool: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            role: tool.into(),
            kind: TurnKind::ToolCall,
            content: arguments,
            created_at: Utc::now(),
        }
    }

    /// Record a tool result
    pub fn tool_result(tool: impl Into<String>, result: serde_json::Value) -> Self {
        Self {
            role: tool.into(),
            kind: TurnKind::ToolResult,
            content: result,
            created_at: Utc::now(),
        }
    }
}

/// Event emitted during the courier pipeline
///
/// Consumers subscribe via [`crate::RedditTube::subscribe`]; the API layer
/// forwards these over server-sent events.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A listing was fetched from the source
    SubmissionsFetched {
        /// Subreddit that was listed
        subreddit: String,
        /// Listing mode used
        mode: ListingMode,
        /// Number of submissions returned
        count: usize,
    },

    /// A media download began
    DownloadStarted {
        /// URL being fetched
        url: String,
    },

    /// A media download finished
    DownloadComplete {
        /// Local path of the downloaded file
        #[schema(value_type = String)]
        path: PathBuf,
    },

    /// A media download failed
    DownloadFailed {
        /// URL that failed
        url: String,
        /// Failure description
        error: String,
    },

    /// Interactive authorization is waiting for the user to approve access
    AuthorizationPending {
        /// Consent URL the user must open
        url: String,
    },

    /// A stored credential was refreshed
    CredentialRefreshed {
        /// New expiry of the refreshed credential
        expiry: Option<DateTime<Utc>>,
    },

    /// Interactive authorization completed and the credential was persisted
    AuthorizationComplete,

    /// An upload began
    UploadStarted {
        /// Local path being uploaded
        #[schema(value_type = String)]
        path: PathBuf,
    },

    /// Upload progress advanced
    ///
    /// Percentages are non-decreasing per job and end at 100.
    UploadProgress {
        /// Cumulative progress, 0-100
        percent: u8,
    },

    /// An upload completed
    UploadComplete {
        /// Platform-assigned video identifier
        video_id: VideoId,
    },

    /// An upload failed mid-transport
    UploadFailed {
        /// Failure description
        error: String,
    },
}
