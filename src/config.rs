//! Configuration types for reddit-tube
//!
//! The configuration is an explicit struct constructed once at startup
//! (usually via [`Config::from_env`]) and passed by reference to each
//! component. Component logic performs no ambient environment lookups.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use utoipa::ToSchema;

use crate::error::{Error, Result};

/// Content-source (Reddit) configuration
///
/// Script-app credentials for the password grant, plus the endpoint bases.
/// Base URLs are configurable so tests can point components at a local
/// mock server.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RedditConfig {
    /// OAuth client id of the script app
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret of the script app
    #[serde(default)]
    pub client_secret: String,

    /// Account username
    #[serde(default)]
    pub username: String,

    /// Account password
    #[serde(default)]
    pub password: String,

    /// User agent string sent on every source request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Authenticated API base (default: `https://oauth.reddit.com`)
    #[serde(default = "default_reddit_api_base")]
    pub api_base: String,

    /// Token-endpoint base (default: `https://www.reddit.com`)
    #[serde(default = "default_reddit_auth_base")]
    pub auth_base: String,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            username: String::new(),
            password: String::new(),
            user_agent: default_user_agent(),
            api_base: default_reddit_api_base(),
            auth_base: default_reddit_auth_base(),
        }
    }
}

/// Upload-platform (YouTube) configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct YouTubeConfig {
    /// Path to the OAuth2 client secrets file (used only during
    /// interactive authorization and token refresh)
    #[serde(default = "default_client_secrets_file")]
    #[schema(value_type = String)]
    pub client_secrets_file: PathBuf,

    /// Path to the token file holding the persisted credential
    #[serde(default = "default_token_file")]
    #[schema(value_type = String)]
    pub token_file: PathBuf,

    /// OAuth scopes requested during authorization
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Redirect URI registered for the OAuth callback
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Resumable-upload endpoint base
    /// (default: `https://www.googleapis.com/upload/youtube/v3`)
    #[serde(default = "default_upload_base")]
    pub upload_base: String,

    /// Data API endpoint base (default: `https://www.googleapis.com/youtube/v3`)
    #[serde(default = "default_youtube_api_base")]
    pub api_base: String,

    /// Upload chunk size in bytes
    ///
    /// `None` sends the whole file in a single request, leaving the chunk
    /// boundary to the transport. When set, the uploader issues ranged PUTs
    /// of this size.
    #[serde(default)]
    pub chunk_size: Option<u64>,

    /// How long the interactive flow waits for the authorization callback
    /// (default: 180 seconds)
    #[serde(default = "default_authorization_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub authorization_timeout: Duration,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            client_secrets_file: default_client_secrets_file(),
            token_file: default_token_file(),
            scopes: default_scopes(),
            redirect_uri: default_redirect_uri(),
            upload_base: default_upload_base(),
            api_base: default_youtube_api_base(),
            chunk_size: None,
            authorization_timeout: default_authorization_timeout(),
        }
    }
}

/// Local storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    /// Root directory for downloaded media, one subdirectory per source name
    /// (default: "./downloads")
    #[serde(default = "default_download_dir")]
    #[schema(value_type = String)]
    pub download_dir: PathBuf,

    /// Directory for session history files, one JSON file per session id
    /// (default: "./sessions")
    #[serde(default = "default_session_dir")]
    #[schema(value_type = String)]
    pub session_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            session_dir: default_session_dir(),
        }
    }
}

/// LLM backend selection
///
/// Consumed by the external agent loop driving the tools endpoint; carried
/// here because the deployment provides it through the same environment.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LlmConfig {
    /// Model family (e.g., "openai")
    #[serde(default = "default_model_family")]
    pub family: String,

    /// Model name
    #[serde(default)]
    pub model: String,

    /// Chat-completions base URL
    #[serde(default = "default_model_base_url")]
    pub base_url: String,

    /// API key for the backend
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            family: default_model_family(),
            model: String::new(),
            base_url: default_model_base_url(),
            api_key: None,
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Bind address for the API server (default: 127.0.0.1:6789)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Public base URL used by tool implementations when they hand URLs to
    /// the user (default: "http://localhost:6789")
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Optional API key; when set, requests must carry a matching
    /// `X-Api-Key` header
    #[serde(default)]
    pub api_key: Option<String>,

    /// Enable CORS (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins ("*" = any)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Serve the interactive Swagger UI (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            base_url: default_api_base_url(),
            api_key: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for [`crate::RedditTube`]
///
/// Fields are organized into logical sub-configs:
/// - [`reddit`](RedditConfig) — source credentials and endpoints
/// - [`youtube`](YouTubeConfig) — platform secrets, token file, upload knobs
/// - [`storage`](StorageConfig) — download and session directories
/// - [`llm`](LlmConfig) — backend selection for the external agent
/// - [`server`](ApiConfig) — REST API settings
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Content-source settings
    #[serde(default)]
    pub reddit: RedditConfig,

    /// Upload-platform settings
    #[serde(default)]
    pub youtube: YouTubeConfig,

    /// Local storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// LLM backend selection
    #[serde(default)]
    pub llm: LlmConfig,

    /// REST API settings
    #[serde(default)]
    pub server: ApiConfig,
}

impl Config {
    /// Build a configuration from the process environment
    ///
    /// Reads the deployment-provided variables (`REDDIT_CLIENT_ID`,
    /// `REDDIT_CLIENT_SECRET`, `REDDIT_USERNAME`, `REDDIT_PASSWORD`,
    /// `REDDIT_USER_AGENT`, `YOUTUBE_CLIENT_SECRETS_FILE`,
    /// `YOUTUBE_TOKEN_FILE`, `OAUTH_REDIRECT_URI`, `DOWNLOAD_DIR`,
    /// `SESSION_DIR`, `MODEL_FAMILY`, `MODEL_NAME`, `MODEL_BASE_URL`,
    /// `MODEL_API_KEY`, `API_BASE_URL`, `API_BIND_ADDRESS`, `API_KEY`).
    /// Unset variables fall back to the documented defaults.
    ///
    /// # Errors
    /// Returns a config error when `API_BIND_ADDRESS` is set but not a
    /// valid socket address.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Some(v) = env_var("REDDIT_CLIENT_ID") {
            config.reddit.client_id = v;
        }
        if let Some(v) = env_var("REDDIT_CLIENT_SECRET") {
            config.reddit.client_secret = v;
        }
        if let Some(v) = env_var("REDDIT_USERNAME") {
            config.reddit.username = v;
        }
        if let Some(v) = env_var("REDDIT_PASSWORD") {
            config.reddit.password = v;
        }
        if let Some(v) = env_var("REDDIT_USER_AGENT") {
            config.reddit.user_agent = v;
        }
        if let Some(v) = env_var("YOUTUBE_CLIENT_SECRETS_FILE") {
            config.youtube.client_secrets_file = PathBuf::from(v);
        }
        if let Some(v) = env_var("YOUTUBE_TOKEN_FILE") {
            config.youtube.token_file = PathBuf::from(v);
        }
        if let Some(v) = env_var("OAUTH_REDIRECT_URI") {
            config.youtube.redirect_uri = v;
        }
        if let Some(v) = env_var("DOWNLOAD_DIR") {
            config.storage.download_dir = PathBuf::from(v);
        }
        if let Some(v) = env_var("SESSION_DIR") {
            config.storage.session_dir = PathBuf::from(v);
        }
        if let Some(v) = env_var("MODEL_FAMILY") {
            config.llm.family = v;
        }
        if let Some(v) = env_var("MODEL_NAME") {
            config.llm.model = v;
        }
        if let Some(v) = env_var("MODEL_BASE_URL") {
            config.llm.base_url = v;
        }
        if let Some(v) = env_var("MODEL_API_KEY") {
            config.llm.api_key = Some(v);
        }
        if let Some(v) = env_var("API_BASE_URL") {
            config.server.base_url = v;
        }
        if let Some(v) = env_var("API_KEY") {
            config.server.api_key = Some(v);
        }
        if let Some(v) = env_var("API_BIND_ADDRESS") {
            config.server.bind_address = v.parse().map_err(|_| Error::Config {
                message: format!("'{v}' is not a valid socket address"),
                key: Some("API_BIND_ADDRESS".into()),
            })?;
        }

        Ok(config)
    }

    /// Validate settings that components rely on
    ///
    /// # Errors
    /// Returns a config error naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.reddit.user_agent.trim().is_empty() {
            return Err(Error::Config {
                message: "user agent must not be empty".into(),
                key: Some("REDDIT_USER_AGENT".into()),
            });
        }
        if self.youtube.scopes.is_empty() {
            return Err(Error::Config {
                message: "at least one OAuth scope is required".into(),
                key: Some("youtube.scopes".into()),
            });
        }
        if self.youtube.chunk_size == Some(0) {
            return Err(Error::Config {
                message: "chunk size must be positive when set".into(),
                key: Some("youtube.chunk_size".into()),
            });
        }
        if self.youtube.authorization_timeout.is_zero() {
            return Err(Error::Config {
                message: "authorization timeout must be positive".into(),
                key: Some("youtube.authorization_timeout".into()),
            });
        }
        Ok(())
    }

    /// A copy of the configuration with secrets masked, for the config API
    /// route
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        mask(&mut config.reddit.client_secret);
        mask(&mut config.reddit.password);
        if let Some(key) = config.llm.api_key.as_mut() {
            mask(key);
        }
        if let Some(key) = config.server.api_key.as_mut() {
            mask(key);
        }
        config
    }
}

fn mask(value: &mut String) {
    if !value.is_empty() {
        *value = "********".into();
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn default_user_agent() -> String {
    concat!("reddit-tube/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_reddit_api_base() -> String {
    "https://oauth.reddit.com".to_string()
}

fn default_reddit_auth_base() -> String {
    "https://www.reddit.com".to_string()
}

fn default_client_secrets_file() -> PathBuf {
    PathBuf::from("./client_secrets.json")
}

fn default_token_file() -> PathBuf {
    PathBuf::from("./youtube_token.json")
}

fn default_scopes() -> Vec<String> {
    vec!["https://www.googleapis.com/auth/youtube.upload".to_string()]
}

fn default_redirect_uri() -> String {
    "http://localhost:6789/oauth/callback".to_string()
}

fn default_upload_base() -> String {
    "https://www.googleapis.com/upload/youtube/v3".to_string()
}

fn default_youtube_api_base() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_authorization_timeout() -> Duration {
    Duration::from_secs(180)
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_session_dir() -> PathBuf {
    PathBuf::from("./sessions")
}

fn default_model_family() -> String {
    "openai".to_string()
}

fn default_model_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6789))
}

fn default_api_base_url() -> String {
    "http://localhost:6789".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
