//! Media retrieval to local storage
//!
//! Downloads exactly one media resource per call. The URL scheme is
//! validated before anything touches the filesystem, so an unsupported URL
//! never leaves a file (or directory) behind. Bodies are streamed into a
//! `.part` staging file that is renamed into place on completion; an
//! interrupted transfer removes the staging file and surfaces a
//! [`DownloadError`] without retrying.

use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

use crate::error::{DownloadError, Result};
use crate::types::Submission;

/// Longest filename stem derived from a URL or title
const MAX_FILENAME_LEN: usize = 128;

/// Retrieves media files over HTTP(S)
pub struct MediaDownloader {
    http: reqwest::Client,
}

impl MediaDownloader {
    /// Create a downloader using the shared HTTP client
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Download the media behind `url` into `dest_dir`
    ///
    /// The destination directory is created if needed (idempotent). The
    /// filename is derived from the URL's last path segment,
    /// percent-decoded and sanitized.
    ///
    /// # Errors
    /// [`DownloadError::UnsupportedUrl`] for non-http(s) schemes (checked
    /// before any filesystem effect), [`DownloadError::RequestFailed`] for
    /// non-success statuses, [`DownloadError::Interrupted`] when the stream
    /// breaks mid-transfer.
    pub async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf> {
        let parsed = Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DownloadError::UnsupportedUrl {
                url: url.to_string(),
            }
            .into());
        }

        let filename = filename_from_url(&parsed);
        self.fetch_to(&parsed, dest_dir, &filename).await
    }

    /// Download a submission's media, preferring the source-hosted stream
    ///
    /// Video submissions carry a direct `media_url` pointing at the highest
    /// quality the source advertises; it is preferred over the post URL.
    /// The file is named after the submission title, with the extension
    /// taken from the media URL.
    ///
    /// # Errors
    /// Same as [`MediaDownloader::download`].
    pub async fn download_submission(
        &self,
        submission: &Submission,
        dest_dir: &Path,
    ) -> Result<PathBuf> {
        let source = submission.media_url.as_deref().unwrap_or(&submission.url);

        let parsed = Url::parse(source).map_err(|e| DownloadError::InvalidUrl {
            url: source.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DownloadError::UnsupportedUrl {
                url: source.to_string(),
            }
            .into());
        }

        let extension = extension_from_url(&parsed).unwrap_or_else(|| "mp4".to_string());
        let filename = format!("{}.{}", sanitize(&submission.title), extension);
        self.fetch_to(&parsed, dest_dir, &filename).await
    }

    async fn fetch_to(&self, url: &Url, dest_dir: &Path, filename: &str) -> Result<PathBuf> {
        fs::create_dir_all(dest_dir).await?;

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DownloadError::Interrupted {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::RequestFailed {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let final_path = dest_dir.join(filename);
        let staging_path = dest_dir.join(format!("{filename}.part"));

        let mut file = fs::File::create(&staging_path).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(file);
                    if let Err(cleanup) = fs::remove_file(&staging_path).await {
                        warn!(path = %staging_path.display(), error = %cleanup, "failed to remove staging file");
                    }
                    return Err(DownloadError::Interrupted {
                        url: url.to_string(),
                        reason: e.to_string(),
                    }
                    .into());
                }
            };
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        drop(file);
        fs::rename(&staging_path, &final_path).await?;

        debug!(url = %url, path = %final_path.display(), bytes = written, "media downloaded");
        Ok(final_path)
    }
}

/// Filename from the URL's last path segment, percent-decoded and sanitized
fn filename_from_url(url: &Url) -> String {
    let raw = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("media");

    let decoded = urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());

    sanitize(&decoded)
}

/// Extension of the URL's last path segment, when it has one
fn extension_from_url(url: &Url) -> Option<String> {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|segment| {
            Path::new(segment)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_string)
        })
}

/// Replace path-hostile characters and bound the length
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = cleaned.trim().trim_matches('.');
    let bounded: String = trimmed.chars().take(MAX_FILENAME_LEN).collect();

    if bounded.is_empty() {
        "media".to_string()
    } else {
        bounded
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::ListingMode;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn submission(url: &str, media_url: Option<&str>, title: &str) -> Submission {
        Submission {
            id: "abc".into(),
            title: title.into(),
            body: String::new(),
            url: url.into(),
            media_url: media_url.map(str::to_string),
            is_video: media_url.is_some(),
            listing: ListingMode::Hot,
            rank: 0,
        }
    }

    #[tokio::test]
    async fn unsupported_scheme_creates_nothing() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("videos");
        let downloader = MediaDownloader::new(reqwest::Client::new());

        let err = downloader
            .download("ftp://example.com/clip.mp4", &dest)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Download(DownloadError::UnsupportedUrl { .. })
        ));
        assert!(
            !dest.exists(),
            "no file or directory may be created for an unsupported URL"
        );
    }

    #[tokio::test]
    async fn downloads_body_to_named_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake mp4 bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let downloader = MediaDownloader::new(reqwest::Client::new());

        let path = downloader
            .download(&format!("{}/media/clip.mp4", server.uri()), dir.path())
            .await
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "clip.mp4");
        assert_eq!(std::fs::read(&path).unwrap(), b"fake mp4 bytes");
    }

    #[tokio::test]
    async fn http_error_leaves_no_final_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone.mp4"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let downloader = MediaDownloader::new(reqwest::Client::new());

        let err = downloader
            .download(&format!("{}/gone.mp4", server.uri()), dir.path())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Download(DownloadError::RequestFailed { status: 404, .. })
        ));
        assert!(!dir.path().join("gone.mp4").exists());
    }

    #[tokio::test]
    async fn submission_download_prefers_media_url_and_title_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v/DASH_1080.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hq".to_vec()))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let downloader = MediaDownloader::new(reqwest::Client::new());
        let sub = submission(
            "https://www.reddit.com/r/videos/comments/abc/",
            Some(&format!("{}/v/DASH_1080.mp4", server.uri())),
            "A cat does a thing",
        );

        let path = downloader.download_submission(&sub, dir.path()).await.unwrap();

        assert_eq!(path.file_name().unwrap(), "A cat does a thing.mp4");
        assert_eq!(std::fs::read(&path).unwrap(), b"hq");
    }

    #[tokio::test]
    async fn destination_directory_creation_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("videos");
        let downloader = MediaDownloader::new(reqwest::Client::new());
        let url = format!("{}/a.mp4", server.uri());

        downloader.download(&url, &dest).await.unwrap();
        // Second call into the already-existing directory must also succeed
        downloader.download(&url, &dest).await.unwrap();
    }

    #[tokio::test]
    async fn no_part_file_remains_after_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let downloader = MediaDownloader::new(reqwest::Client::new());
        downloader
            .download(&format!("{}/b.mp4", server.uri()), dir.path())
            .await
            .unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty(), "staging file must be renamed away");
    }

    #[test]
    fn sanitize_replaces_hostile_characters() {
        assert_eq!(sanitize("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize("what? \"why\" <ok>"), "what_ _why_ _ok_");
        assert_eq!(sanitize(""), "media");
        assert_eq!(sanitize("..."), "media");
    }

    #[test]
    fn sanitize_bounds_length() {
        let long = "x".repeat(500);
        assert_eq!(sanitize(&long).chars().count(), MAX_FILENAME_LEN);
    }

    #[test]
    fn filename_from_url_decodes_percent_escapes() {
        let url = Url::parse("https://example.com/media/my%20clip.mp4").unwrap();
        assert_eq!(filename_from_url(&url), "my clip.mp4");
    }

    #[test]
    fn extension_from_url_reads_last_segment() {
        let url = Url::parse("https://example.com/a/b/clip.webm?x=1").unwrap();
        assert_eq!(extension_from_url(&url).as_deref(), Some("webm"));

        let bare = Url::parse("https://example.com/noext").unwrap();
        assert!(extension_from_url(&bare).is_none());
    }
}
