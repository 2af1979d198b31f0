//! Application state for the API server

use crate::config::Config;
use crate::tube::RedditTube;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the orchestrator and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The central orchestrator instance
    pub tube: Arc<RedditTube>,

    /// Configuration (read access for the config route)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(tube: Arc<RedditTube>, config: Arc<Config>) -> Self {
        Self { tube, config }
    }
}
