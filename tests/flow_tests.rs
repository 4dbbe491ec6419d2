use facematch_avatar::{
    config::ApiConfig,
    flow::{AvatarDisplay, AvatarRequestFlow, HttpAvatarApi, Notice, SUCCESS_MESSAGE, SessionState},
    photo::UploadedImage,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

mod common;
use common::{
    mocks::{FetchReply, GenerateReply, MockAvatarApi},
    test_utils::{full_result, image_config, jpeg_rgb, png_rgba},
};

fn flow_with(api: Arc<MockAvatarApi>) -> AvatarRequestFlow {
    AvatarRequestFlow::new(api, image_config())
}

fn photo() -> UploadedImage {
    UploadedImage::new("me.png", Some("image/png".to_string()), png_rgba(32, 24))
}

fn previous_state() -> SessionState {
    SessionState {
        input_image_url: Some("https://cdn/old-in.jpg".to_string()),
        output_image_url: Some("https://cdn/old-out.png".to_string()),
        description: "Old description".to_string(),
        chinese_description: "旧的描述".to_string(),
    }
}

#[test_log::test(tokio::test)]
async fn success_overwrites_all_four_fields() {
    let api = Arc::new(MockAvatarApi::new().with_generate(GenerateReply::Success(full_result())));
    let flow = flow_with(api.clone());
    let mut session = previous_state();

    let notice = flow.generate(&mut session, photo()).await.unwrap();

    assert_eq!(notice, Notice::Success(SUCCESS_MESSAGE.to_string()));
    let expected = full_result();
    assert_eq!(
        session,
        SessionState {
            input_image_url: expected.input_image_url,
            output_image_url: expected.output_image_url,
            description: expected.description,
            chinese_description: expected.chinese_description,
        }
    );

    let calls = api.generate_calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].filename, "me.png");
    assert_eq!(
        image::guess_format(&calls[0].bytes).unwrap(),
        image::ImageFormat::Jpeg
    );
}

fn http_flow(server: &MockServer) -> AvatarRequestFlow {
    let api = HttpAvatarApi::new(&ApiConfig {
        url: format!("{}/api/face_match_api/", server.uri()),
        generate_timeout_secs: Some(5),
        fetch_timeout_secs: Some(5),
    });
    AvatarRequestFlow::new(Arc::new(api), image_config())
}

#[tokio::test]
async fn missing_description_stores_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/face_match_api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "image_url": "https://cdn/in.jpg",
            "output_image_url": "https://cdn/out.png",
            "chinese_description": "一个人"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let flow = http_flow(&server);
    let mut session = SessionState::default();

    let notice = flow.generate(&mut session, photo()).await.unwrap();

    assert!(!notice.is_error());
    assert_eq!(session.description, "No description available");
    assert_eq!(session.chinese_description, "一个人");
}

#[tokio::test]
async fn null_output_url_is_not_fetched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/face_match_api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "image_url": "https://cdn/in.jpg",
            "output_image_url": null,
            "description": null,
            "chinese_description": "一个人"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let flow = http_flow(&server);
    let mut session = previous_state();

    flow.generate(&mut session, photo()).await.unwrap();
    let view = flow.render(&session).await;

    assert_eq!(session.output_image_url, None);
    assert_eq!(session.description, "");
    assert!(view.avatar.is_none());
    assert!(view.description.is_none());
    assert_eq!(view.chinese_description.as_deref(), Some("一个人"));
}

#[test_log::test(tokio::test)]
async fn server_error_leaves_session_untouched() {
    let api = Arc::new(
        MockAvatarApi::new().with_generate(GenerateReply::Status(500, "server error".to_string())),
    );
    let flow = flow_with(api);
    let mut session = previous_state();

    let notice = flow.generate(&mut session, photo()).await.unwrap();

    assert!(notice.is_error());
    assert!(notice.message().contains("500"));
    assert!(notice.message().contains("server error"));
    assert_eq!(session, previous_state());
}

#[tokio::test]
async fn corrupt_image_never_reaches_the_network() {
    let api = Arc::new(MockAvatarApi::new().with_generate(GenerateReply::Success(full_result())));
    let flow = flow_with(api.clone());
    let mut session = previous_state();
    let upload = UploadedImage::new(
        "broken.jpg",
        Some("image/jpeg".to_string()),
        b"\xFF\xD8\xFF\xE0 truncated garbage".to_vec(),
    );

    let notice = flow.generate(&mut session, upload).await.unwrap();

    assert!(notice.is_error());
    assert!(notice.message().starts_with("Failed to process image: "));
    assert!(notice.message().len() > "Failed to process image: ".len());
    assert_eq!(api.generate_count(), 0);
    assert_eq!(session, previous_state());
}

#[tokio::test]
async fn unsupported_type_never_reaches_the_network() {
    let api = Arc::new(MockAvatarApi::new().with_generate(GenerateReply::Success(full_result())));
    let flow = flow_with(api.clone());
    let mut session = SessionState::default();
    let upload = UploadedImage::new("clip.gif", Some("image/gif".to_string()), vec![1, 2, 3]);

    let notice = flow.generate(&mut session, upload).await.unwrap();

    assert!(notice.message().contains("image/gif"));
    assert_eq!(api.generate_count(), 0);
    assert_eq!(session, SessionState::default());
}

#[tokio::test]
async fn network_failure_is_reported_with_its_message() {
    let api = Arc::new(
        MockAvatarApi::new().with_generate(GenerateReply::Failure("connection refused".to_string())),
    );
    let flow = flow_with(api);
    let mut session = SessionState::default();

    let notice = flow
        .generate(
            &mut session,
            UploadedImage::new("me.jpg", Some("image/jpeg".to_string()), jpeg_rgb(16, 16)),
        )
        .await
        .unwrap();

    assert!(notice.message().starts_with("Failed to process image: "));
    assert!(notice.message().contains("connection refused"));
    assert_eq!(session, SessionState::default());
}

#[tokio::test]
async fn empty_session_renders_nothing_and_fetches_nothing() {
    let api = Arc::new(MockAvatarApi::new());
    let flow = flow_with(api.clone());

    let view = flow.render(&SessionState::default()).await;

    assert!(view.description.is_none());
    assert!(view.chinese_description.is_none());
    assert!(view.avatar.is_none());
    assert!(api.fetched_urls().is_empty());
}

#[tokio::test]
async fn rerender_refetches_without_touching_state() {
    let api = Arc::new(
        MockAvatarApi::new()
            .with_generate(GenerateReply::Success(full_result()))
            .with_fetch(FetchReply::Bytes(png_rgba(8, 8))),
    );
    let flow = flow_with(api.clone());
    let mut session = SessionState::default();
    flow.generate(&mut session, photo()).await.unwrap();
    let stored = session.clone();

    let first = flow.render(&session).await;
    let second = flow.render(&session).await;

    assert_eq!(session, stored);
    assert_eq!(
        api.fetched_urls(),
        vec![stored.output_image_url.clone().unwrap(); 2]
    );
    assert_eq!(first.description.as_deref(), Some(stored.description.as_str()));
    assert_eq!(
        second.chinese_description.as_deref(),
        Some(stored.chinese_description.as_str())
    );
    assert!(matches!(second.avatar, Some(AvatarDisplay::Image(ref img)) if img.width == 8));
}

#[tokio::test]
async fn fetch_status_failure_is_display_only() {
    let api = Arc::new(MockAvatarApi::new().with_fetch(FetchReply::Status(404)));
    let flow = flow_with(api);
    let session = previous_state();

    let view = flow.render(&session).await;

    match view.avatar {
        Some(AvatarDisplay::Error(message)) => {
            assert_eq!(message, "Failed to load generated image: 404")
        }
        other => panic!("expected display error, got {other:?}"),
    }
    assert_eq!(session, previous_state());
}

#[tokio::test]
async fn undecodable_output_is_display_only() {
    let api = Arc::new(MockAvatarApi::new().with_fetch(FetchReply::Bytes(b"not an image".to_vec())));
    let flow = flow_with(api);

    let view = flow.render(&previous_state()).await;

    match view.avatar {
        Some(AvatarDisplay::Error(message)) => {
            assert!(message.starts_with("Error displaying generated image: "))
        }
        other => panic!("expected display error, got {other:?}"),
    }
    assert_eq!(view.description.as_deref(), Some("Old description"));
}

#[tokio::test]
async fn fetch_network_failure_is_display_only() {
    let api = Arc::new(MockAvatarApi::new().with_fetch(FetchReply::Failure("reset by peer".to_string())));
    let flow = flow_with(api);

    let view = flow.render(&previous_state()).await;

    assert!(matches!(
        view.avatar,
        Some(AvatarDisplay::Error(ref message)) if message.contains("reset by peer")
    ));
}
