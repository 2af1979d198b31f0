//! Shared fixtures for the end-to-end pipeline tests.

use chrono::Utc;
use reddit_tube::{Config, Credential, RedditTube};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A RedditTube wired against two mock upstreams and isolated storage
pub struct TestHarness {
    pub tube: Arc<RedditTube>,
    pub reddit: MockServer,
    pub google: MockServer,
    pub dir: TempDir,
}

impl TestHarness {
    pub fn download_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("downloads")
    }
}

/// Build a harness: mock Reddit + mock Google + temp storage
pub async fn harness() -> TestHarness {
    let reddit = MockServer::start().await;
    let google = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    write_client_secrets(dir.path(), &format!("{}/token", google.uri())).await;

    let mut config = Config::default();
    config.reddit.client_id = "cid".into();
    config.reddit.client_secret = "csecret".into();
    config.reddit.username = "user".into();
    config.reddit.password = "pass".into();
    config.reddit.user_agent = "reddit-tube e2e".into();
    config.reddit.api_base = reddit.uri();
    config.reddit.auth_base = reddit.uri();
    config.youtube.upload_base = google.uri();
    config.youtube.api_base = google.uri();
    config.youtube.client_secrets_file = dir.path().join("client_secrets.json");
    config.youtube.token_file = dir.path().join("token.json");
    config.storage.download_dir = dir.path().join("downloads");
    config.storage.session_dir = dir.path().join("sessions");

    let tube = Arc::new(RedditTube::new(config).unwrap());
    TestHarness {
        tube,
        reddit,
        google,
        dir,
    }
}

async fn write_client_secrets(dir: &Path, token_uri: &str) {
    let body = serde_json::json!({
        "installed": {
            "client_id": "gcid",
            "client_secret": "gsecret",
            "auth_uri": "https://accounts.example.com/o/oauth2/auth",
            "token_uri": token_uri,
        }
    });
    std::fs::write(
        dir.join("client_secrets.json"),
        serde_json::to_vec(&body).unwrap(),
    )
    .unwrap();
}

/// Write a valid (non-expired) credential to the harness token file
pub fn seed_valid_credential(harness: &TestHarness) {
    let credential = Credential {
        access_token: "seeded-access".into(),
        refresh_token: Some("seeded-refresh".into()),
        expiry: Some(Utc::now() + chrono::Duration::hours(1)),
        token_type: "Bearer".into(),
        scopes: vec!["https://www.googleapis.com/auth/youtube.upload".into()],
    };
    std::fs::write(
        harness.dir.path().join("token.json"),
        serde_json::to_vec_pretty(&credential).unwrap(),
    )
    .unwrap();
}

/// Mount the Reddit password-grant token endpoint
pub async fn mount_reddit_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "reddit-bearer",
            "token_type": "bearer",
            "expires_in": 3600,
        })))
        .mount(server)
        .await;
}

/// A listing child for the mock subreddit response
pub fn video_post(server: &MockServer, id: &str, title: &str) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "id": id,
            "title": title,
            "selftext": format!("description of {id}"),
            "url": format!("https://www.reddit.com/r/videos/comments/{id}/"),
            "is_video": true,
            "media": {
                "reddit_video": {
                    "fallback_url": format!("{}/media/{id}.mp4", server.uri())
                }
            },
        }
    })
}

pub fn text_post(id: &str, title: &str) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "id": id,
            "title": title,
            "selftext": "just text",
            "url": format!("https://www.reddit.com/r/videos/comments/{id}/"),
            "is_video": false,
        }
    })
}

/// Mount a subreddit listing under the given mode
pub async fn mount_listing(
    server: &MockServer,
    subreddit: &str,
    mode: &str,
    posts: Vec<serde_json::Value>,
) {
    Mock::given(method("GET"))
        .and(path(format!("/r/{subreddit}/{mode}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "kind": "Listing",
            "data": {"children": posts},
        })))
        .mount(server)
        .await;
}

/// Mount the media host for one post id
pub async fn mount_media(server: &MockServer, id: &str, bytes: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/media/{id}.mp4")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.to_vec()))
        .mount(server)
        .await;
}

/// Mount a single-request resumable upload session returning `video_id`
pub async fn mount_upload(server: &MockServer, video_id: &str) {
    Mock::given(method("POST"))
        .and(path("/videos"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Location", format!("{}/upload-session/e2e", server.uri()).as_str()),
        )
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/upload-session/e2e"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": video_id})),
        )
        .mount(server)
        .await;
}
