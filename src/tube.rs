//! The central courier orchestrator
//!
//! [`RedditTube`] owns the configuration, the shared HTTP client, the
//! pipeline components, and the broadcast event channel. Tool invocations
//! run strictly sequentially per call: fetch, then download, then
//! authenticate, then upload — there is no internal fan-out, and batches
//! loop one submission at a time in fetch order.

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;

use crate::auth::AuthFlow;
use crate::config::Config;
use crate::downloader::MediaDownloader;
use crate::error::Result;
use crate::fetcher::RedditFetcher;
use crate::session::SessionStore;
use crate::types::{Event, SessionId, TurnRecord};
use crate::uploader::YouTubeUploader;

/// Capacity of the broadcast event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Chat-tool backend: couriers media from the content source to the
/// upload platform
///
/// One instance serves all sessions. Construct it once from a validated
/// [`Config`], wrap it in an [`Arc`], and hand it to the API server and/or
/// call [`RedditTube::invoke`] directly.
pub struct RedditTube {
    pub(crate) config: Arc<Config>,
    pub(crate) http: reqwest::Client,
    pub(crate) fetcher: RedditFetcher,
    pub(crate) downloader: MediaDownloader,
    pub(crate) uploader: YouTubeUploader,
    pub(crate) auth: AuthFlow,
    pub(crate) sessions: SessionStore,
    pub(crate) event_tx: broadcast::Sender<Event>,
}

impl RedditTube {
    /// Create the orchestrator from a configuration
    ///
    /// Validates the configuration and builds the shared HTTP client; no
    /// network traffic happens here.
    ///
    /// # Errors
    /// Returns a config error when validation fails or the HTTP client
    /// cannot be constructed.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .user_agent(config.reddit.user_agent.clone())
            .build()?;

        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let fetcher = RedditFetcher::new(config.reddit.clone(), http.clone());
        let downloader = MediaDownloader::new(http.clone());
        let uploader = YouTubeUploader::new(config.youtube.clone(), http.clone(), event_tx.clone());
        let auth = AuthFlow::new(config.youtube.clone(), http.clone(), event_tx.clone());
        let sessions = SessionStore::new(config.storage.session_dir.clone());

        info!(
            download_dir = %config.storage.download_dir.display(),
            session_dir = %config.storage.session_dir.display(),
            "reddit-tube initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            http,
            fetcher,
            downloader,
            uploader,
            auth,
            sessions,
            event_tx,
        })
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Subscribe to pipeline events
    ///
    /// The channel is lossy for slow consumers (broadcast semantics); the
    /// API layer forwards these over server-sent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Hand an authorization code from the OAuth callback to the auth flow
    ///
    /// # Errors
    /// See [`AuthFlow::complete_authorization`].
    pub async fn complete_authorization(&self, state: &str, code: &str) -> Result<()> {
        self.auth.complete_authorization(state, code).await
    }

    /// Ordered history of a session (empty for unknown identifiers)
    ///
    /// # Errors
    /// Returns an error only when an existing record cannot be read.
    pub async fn session_history(&self, session_id: SessionId) -> Result<Vec<TurnRecord>> {
        self.sessions.load(session_id).await
    }

    /// Spawn the REST API server on the configured bind address
    ///
    /// Returns the join handle of the server task.
    pub fn spawn_api_server(self: &Arc<Self>) -> JoinHandle<Result<()>> {
        let tube = Arc::clone(self);
        let config = Arc::clone(&self.config);
        tokio::spawn(async move { crate::api::start_api_server(tube, config).await })
    }
}
