//! Resumable upload driver for the platform API
//!
//! Implements the platform's resumable-upload protocol: an initiation
//! request carrying the video metadata yields a session URI, then the file
//! body is sent with `Content-Range` headers until the server answers with
//! the final response and a video identifier. HTTP 308 acknowledges a chunk
//! and advances the offset.
//!
//! Chunk boundaries follow [`crate::config::YouTubeConfig::chunk_size`]:
//! when unset the whole file goes in a single request (the transport
//! chooses). Progress percentages are emitted after each acknowledged chunk
//! and are non-decreasing, ending at 100.
//!
//! A transport error aborts the job; the session URI is not persisted, so
//! there is no resumption across process restarts. The job state machine is
//! `NOT_STARTED → IN_PROGRESS → COMPLETE | FAILED` with no transitions out
//! of the terminal states and no automatic retry.

use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::auth::Credential;
use crate::config::YouTubeConfig;
use crate::error::{Result, UploadError};
use crate::types::{Event, UploadMetadata, UploadState, VideoId};

/// HTTP status the platform uses to acknowledge a chunk
const RESUME_INCOMPLETE: u16 = 308;

/// Drives resumable uploads against the platform API
pub struct YouTubeUploader {
    http: reqwest::Client,
    config: YouTubeConfig,
    events: broadcast::Sender<Event>,
}

#[derive(Deserialize)]
struct UploadResponse {
    id: Option<String>,
}

impl YouTubeUploader {
    /// Create an uploader using the shared HTTP client
    pub fn new(config: YouTubeConfig, http: reqwest::Client, events: broadcast::Sender<Event>) -> Self {
        Self {
            http,
            config,
            events,
        }
    }

    /// Upload `file_path` with the given metadata and return the video id
    ///
    /// The source must be a regular file; directories are rejected before
    /// any network traffic. Emits [`Event::UploadStarted`], a non-decreasing
    /// sequence of [`Event::UploadProgress`] ending at 100, and either
    /// [`Event::UploadComplete`] or [`Event::UploadFailed`].
    ///
    /// # Errors
    /// Returns [`UploadError`] on rejection or transport failure; the job is
    /// discarded, never retried automatically.
    pub async fn upload(
        &self,
        credential: &Credential,
        file_path: &Path,
        metadata: &UploadMetadata,
    ) -> Result<VideoId> {
        let file_meta = fs::metadata(file_path)
            .await
            .map_err(|_| UploadError::NotAFile {
                path: file_path.to_path_buf(),
            })?;
        if !file_meta.is_file() {
            return Err(UploadError::NotAFile {
                path: file_path.to_path_buf(),
            }
            .into());
        }

        let total = file_meta.len();
        let mut state = UploadState::NotStarted;
        debug!(path = %file_path.display(), bytes = total, state = ?state, "upload job created");

        let session_uri = self.initiate(credential, metadata, total).await?;
        state = UploadState::InProgress { percent: 0 };
        let _ = self.events.send(Event::UploadStarted {
            path: file_path.to_path_buf(),
        });
        debug!(path = %file_path.display(), bytes = total, "upload session opened");

        match self
            .send_body(credential, &session_uri, file_path, total, &mut state)
            .await
        {
            Ok(video_id) => {
                state = UploadState::Complete {
                    video_id: video_id.clone(),
                };
                debug_assert!(state.is_terminal());
                info!(video_id = %video_id, "upload complete");
                let _ = self.events.send(Event::UploadComplete {
                    video_id: video_id.clone(),
                });
                Ok(video_id)
            }
            Err(e) => {
                state = UploadState::Failed;
                debug_assert!(state.is_terminal());
                warn!(error = %e, "upload failed");
                let _ = self.events.send(Event::UploadFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Open the upload session and return its URI
    async fn initiate(
        &self,
        credential: &Credential,
        metadata: &UploadMetadata,
        total: u64,
    ) -> Result<String> {
        let body = serde_json::json!({
            "snippet": {
                "title": metadata.title,
                "description": metadata.description,
                "tags": metadata.tags,
                "categoryId": metadata.category_id,
            },
            "status": {
                "privacyStatus": metadata.privacy.as_str(),
            },
        });

        let url = format!("{}/videos", self.config.upload_base.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(&credential.access_token)
            .header("X-Upload-Content-Type", "application/octet-stream")
            .header("X-Upload-Content-Length", total.to_string())
            .json(&body)
            .send()
            .await
            .map_err(|e| UploadError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::InitiationFailed {
                status: status.as_u16(),
            }
            .into());
        }

        response
            .headers()
            .get("Location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| UploadError::MissingSessionUri.into())
    }

    /// Send the file body chunk by chunk until the final response
    async fn send_body(
        &self,
        credential: &Credential,
        session_uri: &str,
        file_path: &Path,
        total: u64,
        state: &mut UploadState,
    ) -> Result<VideoId> {
        // Empty files are a single zero-length request
        if total == 0 {
            let response = self
                .http
                .put(session_uri)
                .bearer_auth(&credential.access_token)
                .header("Content-Range", "bytes */0")
                .body(Vec::new())
                .send()
                .await
                .map_err(|e| UploadError::Transport {
                    reason: e.to_string(),
                })?;
            return self.finish(response, 0, state).await;
        }

        let chunk_size = self.config.chunk_size.unwrap_or(total).max(1);
        let mut file = fs::File::open(file_path).await?;
        let mut offset: u64 = 0;

        loop {
            let len = chunk_size.min(total - offset);
            let end = offset + len - 1;

            file.seek(std::io::SeekFrom::Start(offset)).await?;
            let mut buffer = vec![0u8; len as usize];
            file.read_exact(&mut buffer).await?;

            let response = self
                .http
                .put(session_uri)
                .bearer_auth(&credential.access_token)
                .header("Content-Range", format!("bytes {offset}-{end}/{total}"))
                .body(buffer)
                .send()
                .await
                .map_err(|e| UploadError::Transport {
                    reason: e.to_string(),
                })?;

            let status = response.status().as_u16();
            if status == RESUME_INCOMPLETE {
                offset = next_offset(&response).unwrap_or(end + 1);
                if offset >= total {
                    return Err(UploadError::MalformedResponse {
                        reason: "server reported incomplete after the final chunk".into(),
                    }
                    .into());
                }
                self.report_progress(offset, total, state);
                continue;
            }

            return self.finish(response, offset, state).await;
        }
    }

    /// Handle the terminal response of the upload session
    async fn finish(
        &self,
        response: reqwest::Response,
        offset: u64,
        state: &mut UploadState,
    ) -> Result<VideoId> {
        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::ChunkFailed {
                offset,
                status: status.as_u16(),
            }
            .into());
        }

        let parsed: UploadResponse =
            response
                .json()
                .await
                .map_err(|e| UploadError::MalformedResponse {
                    reason: e.to_string(),
                })?;

        let id = parsed.id.ok_or_else(|| UploadError::MalformedResponse {
            reason: "final response carried no video id".into(),
        })?;

        // The final callback always lands on 100
        if let UploadState::InProgress { percent } = state
            && *percent < 100
        {
            *state = UploadState::InProgress { percent: 100 };
            let _ = self.events.send(Event::UploadProgress { percent: 100 });
        }

        Ok(VideoId::new(id))
    }

    /// Emit a progress event, clamped so the sequence never decreases
    fn report_progress(&self, offset: u64, total: u64, state: &mut UploadState) {
        let computed = ((offset.saturating_mul(100)) / total.max(1)).min(100) as u8;

        if let UploadState::InProgress { percent } = state {
            let next = computed.max(*percent);
            if next > *percent {
                *state = UploadState::InProgress { percent: next };
                let _ = self.events.send(Event::UploadProgress { percent: next });
            }
        }
    }
}

/// Next byte offset from a 308 response's `Range: bytes=0-N` header
fn next_offset(response: &reqwest::Response) -> Option<u64> {
    let range = response.headers().get("Range")?.to_str().ok()?;
    let (_, end) = range.strip_prefix("bytes=")?.split_once('-')?;
    end.parse::<u64>().ok().map(|n| n + 1)
}
