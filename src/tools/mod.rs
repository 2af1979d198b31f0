//! Chat-tool contract and dispatch
//!
//! Tools are the entry points the external agent loop calls. Requests are a
//! tagged-variant enum validated at the boundary before dispatch — no
//! loosely-typed argument bags. Around every invocation the session store
//! records a `tool_call` entry and a `tool_result` entry (successful or
//! not), so the conversational layer can replay what happened.
//!
//! The download tool applies the keyword and is-video post-filters here, on
//! top of the fetcher's unfiltered listing, and processes submissions in a
//! plain sequential loop in fetch order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::{Error, Result};
use crate::tube::RedditTube;
use crate::types::{
    DownloadedMedia, Event, ListingMode, PrivacyStatus, SessionId, TurnRecord, UploadMetadata,
    VideoId,
};

/// Platform category suggested for couriered videos ("People & Blogs")
const DEFAULT_CATEGORY_ID: &str = "22";

/// Minimum listing size fetched before the post-filters run
///
/// The listing is over-sampled so keyword and is-video filtering still has
/// material to work with when the requested limit is small.
const LISTING_SAMPLE: u32 = 5;

/// Largest accepted download limit per tool call
const MAX_DOWNLOAD_LIMIT: u32 = 25;

fn default_limit() -> u32 {
    1
}

fn default_region() -> String {
    "US".to_string()
}

/// A validated tool invocation
///
/// The JSON representation is tagged by `tool`, e.g.
/// `{"tool": "download_reddit_video", "subreddit": "videos", "limit": 1}`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolRequest {
    /// Fetch a subreddit listing, filter it, and download the matches
    DownloadRedditVideo {
        /// Subreddit to list (bare name, no "r/" prefix)
        subreddit: String,
        /// Ranking algorithm for the listing
        #[serde(default)]
        listing: ListingMode,
        /// Keywords the submission title must contain (any of, case
        /// insensitive); empty = no keyword filter
        #[serde(default)]
        keywords: Vec<String>,
        /// Maximum number of videos to download
        #[serde(default = "default_limit")]
        limit: u32,
    },

    /// Upload a previously downloaded file to the platform
    UploadToYoutube {
        /// Path of the media file to upload
        #[schema(value_type = String)]
        file_path: PathBuf,
        /// Video title
        title: String,
        /// Video description
        #[serde(default)]
        description: String,
        /// Tag set
        #[serde(default)]
        tags: BTreeSet<String>,
        /// Platform category identifier
        #[serde(default = "default_category_id")]
        category_id: String,
        /// Visibility of the uploaded video
        #[serde(default)]
        privacy: PrivacyStatus,
    },

    /// Produce an OAuth consent URL for the user to open
    GenerateAuthUrl,

    /// Report whether a usable stored credential exists
    VerifyToken,

    /// List the platform's video categories for a region
    ListCategories {
        /// Two-letter region code
        #[serde(default = "default_region")]
        region_code: String,
    },
}

fn default_category_id() -> String {
    DEFAULT_CATEGORY_ID.to_string()
}

impl ToolRequest {
    /// Name the agent layer uses for this tool
    pub fn name(&self) -> &'static str {
        match self {
            ToolRequest::DownloadRedditVideo { .. } => "download_reddit_video",
            ToolRequest::UploadToYoutube { .. } => "upload_to_youtube",
            ToolRequest::GenerateAuthUrl => "generate_auth_url",
            ToolRequest::VerifyToken => "verify_token",
            ToolRequest::ListCategories { .. } => "list_categories",
        }
    }

    /// Boundary validation, run before dispatch
    ///
    /// # Errors
    /// Returns [`Error::InvalidRequest`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        match self {
            ToolRequest::DownloadRedditVideo {
                subreddit, limit, ..
            } => {
                if subreddit.trim().is_empty() {
                    return Err(Error::InvalidRequest("subreddit must not be empty".into()));
                }
                if subreddit.contains('/') || subreddit.contains(char::is_whitespace) {
                    return Err(Error::InvalidRequest(
                        "subreddit must be a bare name without '/' or whitespace".into(),
                    ));
                }
                if *limit > MAX_DOWNLOAD_LIMIT {
                    return Err(Error::InvalidRequest(format!(
                        "limit must be at most {MAX_DOWNLOAD_LIMIT}"
                    )));
                }
                Ok(())
            }
            ToolRequest::UploadToYoutube {
                file_path,
                title,
                category_id,
                ..
            } => {
                if file_path.as_os_str().is_empty() {
                    return Err(Error::InvalidRequest("file_path must not be empty".into()));
                }
                if title.trim().is_empty() {
                    return Err(Error::InvalidRequest("title must not be empty".into()));
                }
                if category_id.trim().is_empty() {
                    return Err(Error::InvalidRequest("category_id must not be empty".into()));
                }
                Ok(())
            }
            ToolRequest::ListCategories { region_code } => {
                if region_code.len() != 2 || !region_code.chars().all(|c| c.is_ascii_alphabetic())
                {
                    return Err(Error::InvalidRequest(
                        "region_code must be a two-letter code".into(),
                    ));
                }
                Ok(())
            }
            ToolRequest::GenerateAuthUrl | ToolRequest::VerifyToken => Ok(()),
        }
    }
}

/// A typed tool result
///
/// The JSON representation is tagged by `type`, mirroring the request
/// contract.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolResponse {
    /// Downloaded media, in fetch order
    VideoList {
        /// One entry per downloaded file
        items: Vec<DownloadedMedia>,
    },

    /// A completed upload
    Uploaded {
        /// Platform-assigned video identifier
        video_id: VideoId,
    },

    /// A consent URL the user must open
    AuthUrl {
        /// The OAuth consent URL
        url: String,
    },

    /// A plain status message
    Message {
        /// Human-readable message
        message: String,
    },

    /// Platform video categories
    Categories {
        /// One entry per category
        items: Vec<CategoryInfo>,
    },
}

/// One platform video category
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryInfo {
    /// Category identifier
    pub id: String,
    /// Category title
    pub title: String,
}

#[derive(Deserialize)]
struct CategoryListing {
    #[serde(default)]
    items: Vec<CategoryItem>,
}

#[derive(Deserialize)]
struct CategoryItem {
    id: String,
    snippet: CategorySnippet,
}

#[derive(Deserialize)]
struct CategorySnippet {
    title: String,
}

impl RedditTube {
    /// Invoke a tool on behalf of a session
    ///
    /// Validates the request, records a `tool_call` entry, dispatches, and
    /// records a `tool_result` entry whether the tool succeeded or failed.
    /// The failure itself is returned unchanged for the agent layer to
    /// relay to the user.
    ///
    /// # Errors
    /// Returns the tool's error, or a session error when the record cannot
    /// be written.
    pub async fn invoke(&self, session_id: SessionId, request: ToolRequest) -> Result<ToolResponse> {
        request.validate()?;

        let name = request.name();
        info!(session = %session_id, tool = name, "tool invoked");

        self.sessions
            .append(
                session_id,
                TurnRecord::tool_call(name, serde_json::to_value(&request)?),
            )
            .await?;

        let result = self.dispatch(request).await;

        let record = match &result {
            Ok(response) => TurnRecord::tool_result(name, serde_json::to_value(response)?),
            Err(e) => TurnRecord::tool_result(name, serde_json::json!({ "error": e.to_string() })),
        };
        self.sessions.append(session_id, record).await?;

        result
    }

    async fn dispatch(&self, request: ToolRequest) -> Result<ToolResponse> {
        match request {
            ToolRequest::DownloadRedditVideo {
                subreddit,
                listing,
                keywords,
                limit,
            } => self.download_reddit_video(&subreddit, listing, &keywords, limit).await,
            ToolRequest::UploadToYoutube {
                file_path,
                title,
                description,
                tags,
                category_id,
                privacy,
            } => {
                let metadata = UploadMetadata {
                    title,
                    description,
                    tags,
                    category_id,
                    privacy,
                };
                self.upload_to_youtube(&file_path, &metadata).await
            }
            ToolRequest::GenerateAuthUrl => {
                let url = self.auth.authorization_url().await?;
                Ok(ToolResponse::AuthUrl { url })
            }
            ToolRequest::VerifyToken => Ok(ToolResponse::Message {
                message: self.verify_token().await,
            }),
            ToolRequest::ListCategories { region_code } => self.list_categories(&region_code).await,
        }
    }

    /// Fetch, filter, and sequentially download matching video submissions
    async fn download_reddit_video(
        &self,
        subreddit: &str,
        listing: ListingMode,
        keywords: &[String],
        limit: u32,
    ) -> Result<ToolResponse> {
        let sample = limit.max(LISTING_SAMPLE);
        let submissions = self.fetcher.fetch(subreddit, listing, sample).await?;

        let _ = self.event_tx.send(Event::SubmissionsFetched {
            subreddit: subreddit.to_string(),
            mode: listing,
            count: submissions.len(),
        });

        let dest_dir = self.config.storage.download_dir.join(subreddit);
        let mut downloaded: Vec<DownloadedMedia> = Vec::new();

        // Strictly sequential, in fetch order; a failed item is skipped,
        // not retried.
        for submission in &submissions {
            if downloaded.len() >= limit as usize {
                break;
            }
            if !keywords.is_empty() && !title_matches(&submission.title, keywords) {
                continue;
            }
            if !submission.is_video {
                continue;
            }

            let source = submission
                .media_url
                .as_deref()
                .unwrap_or(&submission.url)
                .to_string();
            let _ = self.event_tx.send(Event::DownloadStarted {
                url: source.clone(),
            });

            match self.downloader.download_submission(submission, &dest_dir).await {
                Ok(path) => {
                    let _ = self.event_tx.send(Event::DownloadComplete {
                        path: path.clone(),
                    });
                    downloaded.push(DownloadedMedia {
                        title: submission.title.clone(),
                        url: submission.url.clone(),
                        file_path: path,
                        description: submission.body.clone(),
                        category_id: DEFAULT_CATEGORY_ID.to_string(),
                    });
                }
                Err(e) => {
                    warn!(url = %source, error = %e, "skipping submission, download failed");
                    let _ = self.event_tx.send(Event::DownloadFailed {
                        url: source,
                        error: e.to_string(),
                    });
                }
            }
        }

        if downloaded.is_empty() {
            return Ok(ToolResponse::Message {
                message: "No videos found".into(),
            });
        }
        Ok(ToolResponse::VideoList { items: downloaded })
    }

    /// Obtain a credential, then upload one concrete file
    async fn upload_to_youtube(
        &self,
        file_path: &std::path::Path,
        metadata: &UploadMetadata,
    ) -> Result<ToolResponse> {
        let credential = self.auth.obtain_credential().await?;
        let video_id = self.uploader.upload(&credential, file_path, metadata).await?;
        Ok(ToolResponse::Uploaded { video_id })
    }

    /// The original conversational contract: a plain yes/no message
    async fn verify_token(&self) -> String {
        match self.auth.token_store().load().await {
            Some(credential) if credential.is_valid() || credential.refresh_token.is_some() => {
                "Token authenticated".into()
            }
            _ => "Token not authenticated".into(),
        }
    }

    /// List the platform's video categories for a region
    async fn list_categories(&self, region_code: &str) -> Result<ToolResponse> {
        let credential = self.auth.obtain_credential().await?;

        let url = format!(
            "{}/videoCategories",
            self.config.youtube.api_base.trim_end_matches('/')
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&credential.access_token)
            .query(&[("part", "snippet"), ("regionCode", region_code)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Other(format!(
                "category listing failed with HTTP {}",
                status.as_u16()
            )));
        }

        let listing: CategoryListing = response.json().await?;
        let items = listing
            .items
            .into_iter()
            .map(|item| CategoryInfo {
                id: item.id,
                title: item.snippet.title,
            })
            .collect();

        Ok(ToolResponse::Categories { items })
    }
}

/// Case-insensitive "any keyword appears in the title" match
fn title_matches(title: &str, keywords: &[String]) -> bool {
    let title = title.to_lowercase();
    keywords.iter().any(|kw| title.contains(&kw.to_lowercase()))
}
