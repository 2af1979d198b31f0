//! End-to-end pipeline tests: fetch → download → authenticate → upload,
//! driven through the tool contract against mock upstreams.

mod common;

use common::*;
use reddit_tube::{
    Error, Event, ListingMode, PrivacyStatus, SessionId, ToolRequest, ToolResponse, UploadError,
};
use std::collections::BTreeSet;
use std::path::PathBuf;

fn download_request(limit: u32, keywords: Vec<String>) -> ToolRequest {
    ToolRequest::DownloadRedditVideo {
        subreddit: "videos".into(),
        listing: ListingMode::Hot,
        keywords,
        limit,
    }
}

fn upload_request(file_path: PathBuf, title: &str) -> ToolRequest {
    ToolRequest::UploadToYoutube {
        file_path,
        title: title.into(),
        description: "couriered by test".into(),
        tags: BTreeSet::from(["e2e".to_string()]),
        category_id: "22".into(),
        privacy: PrivacyStatus::Private,
    }
}

#[tokio::test]
async fn download_then_upload_round_trip() {
    let h = harness().await;
    let session = SessionId::new();

    mount_reddit_token(&h.reddit).await;
    mount_listing(
        &h.reddit,
        "videos",
        "hot",
        vec![
            video_post(&h.reddit, "aaa", "A cat clip"),
            text_post("bbb", "Not a video"),
            video_post(&h.reddit, "ccc", "A dog clip"),
        ],
    )
    .await;
    mount_media(&h.reddit, "aaa", b"cat bytes").await;
    mount_media(&h.reddit, "ccc", b"dog bytes").await;
    seed_valid_credential(&h);
    mount_upload(&h.google, "vid-e2e").await;

    let mut events = h.tube.subscribe();

    // Download: 2 of the 3 listed posts are videos
    let response = h
        .tube
        .invoke(session, download_request(5, vec![]))
        .await
        .unwrap();

    let items = match response {
        ToolResponse::VideoList { items } => items,
        other => panic!("expected video list, got {other:?}"),
    };
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "A cat clip");
    assert_eq!(items[1].title, "A dog clip");
    assert!(items[0].file_path.starts_with(h.download_dir().join("videos")));
    assert_eq!(
        std::fs::read(&items[0].file_path).unwrap(),
        b"cat bytes",
        "downloaded file must hold the media body"
    );

    // Upload the first concrete file (not its directory)
    let response = h
        .tube
        .invoke(session, upload_request(items[0].file_path.clone(), "A cat clip"))
        .await
        .unwrap();

    match response {
        ToolResponse::Uploaded { video_id } => assert_eq!(video_id.as_str(), "vid-e2e"),
        other => panic!("expected uploaded, got {other:?}"),
    }

    // Both invocations were recorded around dispatch
    let history = h.tube.session_history(session).await.unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].role, "download_reddit_video");
    assert_eq!(history[2].role, "upload_to_youtube");

    // Progress ended at 100 before the completion event
    let mut percents = Vec::new();
    let mut completed = false;
    while let Ok(event) = events.try_recv() {
        match event {
            Event::UploadProgress { percent } => percents.push(percent),
            Event::UploadComplete { .. } => completed = true,
            _ => {}
        }
    }
    assert!(completed);
    assert_eq!(percents.last().copied(), Some(100));
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn keyword_filter_is_applied_by_the_tool_layer() {
    let h = harness().await;

    mount_reddit_token(&h.reddit).await;
    mount_listing(
        &h.reddit,
        "videos",
        "hot",
        vec![
            video_post(&h.reddit, "aaa", "A cat clip"),
            video_post(&h.reddit, "ccc", "A dog clip"),
        ],
    )
    .await;
    mount_media(&h.reddit, "ccc", b"dog bytes").await;

    let response = h
        .tube
        .invoke(
            SessionId::new(),
            download_request(5, vec!["DOG".to_string()]),
        )
        .await
        .unwrap();

    match response {
        ToolResponse::VideoList { items } => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].title, "A dog clip");
        }
        other => panic!("expected video list, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_listing_yields_a_message_not_an_error() {
    let h = harness().await;

    mount_reddit_token(&h.reddit).await;
    mount_listing(&h.reddit, "videos", "hot", vec![]).await;

    let response = h
        .tube
        .invoke(SessionId::new(), download_request(3, vec![]))
        .await
        .unwrap();

    match response {
        ToolResponse::Message { message } => assert_eq!(message, "No videos found"),
        other => panic!("expected message, got {other:?}"),
    }
}

#[tokio::test]
async fn source_failure_is_recorded_in_the_session_and_surfaced() {
    let h = harness().await;
    let session = SessionId::new();

    // No mocks on the reddit server: the token request fails
    let err = h
        .tube
        .invoke(session, download_request(1, vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Source(_)));

    let history = h.tube.session_history(session).await.unwrap();
    assert_eq!(history.len(), 2, "tool_call and error tool_result");
    let error_record = &history[1];
    assert!(
        error_record.content["error"]
            .as_str()
            .unwrap()
            .contains("source"),
        "the recorded result must carry the error text"
    );
}

#[tokio::test]
async fn uploading_a_directory_is_rejected() {
    let h = harness().await;
    seed_valid_credential(&h);

    let dir = h.dir.path().join("downloads");
    std::fs::create_dir_all(&dir).unwrap();

    let err = h
        .tube
        .invoke(SessionId::new(), upload_request(dir, "not a file"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Upload(UploadError::NotAFile { .. })));
}

#[tokio::test]
async fn generate_auth_url_returns_consent_url_with_state() {
    let h = harness().await;

    let response = h
        .tube
        .invoke(SessionId::new(), ToolRequest::GenerateAuthUrl)
        .await
        .unwrap();

    match response {
        ToolResponse::AuthUrl { url } => {
            assert!(url.starts_with("https://accounts.example.com/o/oauth2/auth"));
            assert!(url.contains("state="));
            assert!(url.contains("access_type=offline"));
        }
        other => panic!("expected auth url, got {other:?}"),
    }
}

#[tokio::test]
async fn verify_token_reflects_the_token_file() {
    let h = harness().await;
    let session = SessionId::new();

    let response = h.tube.invoke(session, ToolRequest::VerifyToken).await.unwrap();
    match response {
        ToolResponse::Message { message } => assert_eq!(message, "Token not authenticated"),
        other => panic!("unexpected {other:?}"),
    }

    seed_valid_credential(&h);

    let response = h.tube.invoke(session, ToolRequest::VerifyToken).await.unwrap();
    match response {
        ToolResponse::Message { message } => assert_eq!(message, "Token authenticated"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn list_categories_maps_platform_items() {
    let h = harness().await;
    seed_valid_credential(&h);

    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/videoCategories"))
        .and(wiremock::matchers::query_param("regionCode", "GB"))
        .respond_with(
            wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "1", "snippet": {"title": "Film & Animation"}},
                    {"id": "22", "snippet": {"title": "People & Blogs"}},
                ]
            })),
        )
        .mount(&h.google)
        .await;

    let response = h
        .tube
        .invoke(
            SessionId::new(),
            ToolRequest::ListCategories {
                region_code: "GB".into(),
            },
        )
        .await
        .unwrap();

    match response {
        ToolResponse::Categories { items } => {
            assert_eq!(items.len(), 2);
            assert_eq!(items[1].id, "22");
            assert_eq!(items[1].title, "People & Blogs");
        }
        other => panic!("expected categories, got {other:?}"),
    }
}
