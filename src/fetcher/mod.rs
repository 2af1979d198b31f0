//! Submission listing against the content source
//!
//! Talks to Reddit as an OAuth "script" app: a password-grant bearer token
//! is requested from the source's own token endpoint and cached until it
//! expires, then listings are read from the authenticated API base.
//!
//! The fetcher returns submissions in the source's native ranking order for
//! the requested mode and performs no filtering, dedup, or keyword matching
//! of its own — that belongs to the calling tool layer. Upstream failures
//! surface as [`SourceError`] and are never retried here.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::RedditConfig;
use crate::error::{Result, SourceError};
use crate::types::{ListingMode, Submission};

/// Skew subtracted from the bearer expiry before reuse
const BEARER_SKEW_SECS: i64 = 30;

#[derive(Clone, Debug)]
struct BearerToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl BearerToken {
    fn is_valid(&self) -> bool {
        self.expires_at - chrono::Duration::seconds(BEARER_SKEW_SECS) > Utc::now()
    }
}

/// Lists submissions from the content source
pub struct RedditFetcher {
    http: reqwest::Client,
    config: RedditConfig,
    bearer: Mutex<Option<BearerToken>>,
}

#[derive(Deserialize)]
struct SourceTokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Deserialize)]
struct ListingChild {
    data: RawSubmission,
}

#[derive(Deserialize)]
struct RawSubmission {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    is_video: bool,
    #[serde(default)]
    media: Option<RawMedia>,
}

#[derive(Deserialize)]
struct RawMedia {
    reddit_video: Option<RawRedditVideo>,
}

#[derive(Deserialize)]
struct RawRedditVideo {
    fallback_url: Option<String>,
}

impl RedditFetcher {
    /// Create a fetcher using the shared HTTP client
    pub fn new(config: RedditConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            config,
            bearer: Mutex::new(None),
        }
    }

    /// List at most `limit` submissions of `subreddit` under `mode`
    ///
    /// Returns the submissions in the source's native ranking order. When
    /// the source has fewer items than `limit`, the result length equals the
    /// available count. A `limit` of zero yields an empty sequence without
    /// touching the network.
    ///
    /// # Errors
    /// Returns [`SourceError`] when the token request or listing call fails
    /// (auth, network, rate limit) or the response envelope is malformed.
    pub async fn fetch(
        &self,
        subreddit: &str,
        mode: ListingMode,
        limit: u32,
    ) -> Result<Vec<Submission>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let bearer = self.bearer().await?;
        let url = format!(
            "{}/r/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            subreddit,
            mode.as_path_segment()
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&bearer)
            .header("User-Agent", &self.config.user_agent)
            .query(&[("limit", limit.to_string()), ("raw_json", "1".to_string())])
            .send()
            .await
            .map_err(|e| SourceError::ListingFailed {
                subreddit: subreddit.to_string(),
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::ListingFailed {
                subreddit: subreddit.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let listing: Listing = response
            .json()
            .await
            .map_err(|e| SourceError::MalformedListing {
                reason: e.to_string(),
            })?;

        let submissions: Vec<Submission> = listing
            .data
            .children
            .into_iter()
            .take(limit as usize)
            .enumerate()
            .map(|(rank, child)| {
                let raw = child.data;
                let media_url = raw
                    .media
                    .and_then(|m| m.reddit_video)
                    .and_then(|v| v.fallback_url);
                Submission {
                    id: raw.id,
                    title: raw.title,
                    body: raw.selftext,
                    url: raw.url,
                    media_url,
                    is_video: raw.is_video,
                    listing: mode,
                    rank,
                }
            })
            .collect();

        debug!(
            subreddit = subreddit,
            mode = %mode,
            count = submissions.len(),
            "listing fetched"
        );
        Ok(submissions)
    }

    /// Return a cached bearer token or request a fresh one
    async fn bearer(&self) -> Result<String> {
        let mut guard = self.bearer.lock().await;
        if let Some(token) = guard.as_ref()
            && token.is_valid()
        {
            return Ok(token.token.clone());
        }

        let url = format!(
            "{}/api/v1/access_token",
            self.config.auth_base.trim_end_matches('/')
        );

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .header("User-Agent", &self.config.user_agent)
            .form(&[
                ("grant_type", "password"),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::TokenRequestFailed {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "source token request rejected");
            return Err(SourceError::TokenRequestFailed {
                status: status.as_u16(),
            }
            .into());
        }

        let token: SourceTokenResponse =
            response
                .json()
                .await
                .map_err(|e| SourceError::MalformedListing {
                    reason: format!("token response: {e}"),
                })?;

        let expires_in = token.expires_in.unwrap_or(3600);
        let fresh = BearerToken {
            token: token.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in),
        };
        let value = fresh.token.clone();
        *guard = Some(fresh);
        Ok(value)
    }
}
