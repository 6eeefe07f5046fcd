use mofumofu_async::{Client, ErrorKind, MofuConfig, MofuError};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> Client {
    Client::with_config(MofuConfig::new().with_api_base(server.uri()))
        .build()
        .unwrap()
}

async fn follow_error(template: ResponseTemplate) -> MofuError {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v0/follow"))
        .respond_with(template)
        .mount(&server)
        .await;

    let client = test_client(&server);
    client.follows().follow("me").await.unwrap_err()
}

#[tokio::test]
async fn known_code_is_classified_with_extras() {
    let err = follow_error(ResponseTemplate::new(400).set_body_json(json!({
        "code": "follow:cannot_follow_self",
        "status": 400,
        "details": {"handle": "me"}
    })))
    .await;

    let MofuError::Api(api) = err else {
        panic!("expected api error, got {err:?}");
    };
    assert_eq!(api.kind(), ErrorKind::FollowCannotFollowSelf);
    assert_eq!(api.status(), 400);
    let body = api.body().unwrap();
    assert_eq!(body.extra["details"], json!({"handle": "me"}));
}

#[tokio::test]
async fn unknown_code_keeps_code_and_status() {
    let err = follow_error(ResponseTemplate::new(422).set_body_json(json!({
        "code": "post:too_spicy",
        "status": 422
    })))
    .await;

    let MofuError::Api(api) = err else {
        panic!("expected api error");
    };
    assert_eq!(api.kind(), ErrorKind::Unknown);
    assert_eq!(api.code(), "post:too_spicy");
    assert_eq!(api.status(), 422);
}

#[tokio::test]
async fn html_error_page_degrades_to_unknown() {
    let err = follow_error(
        ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"),
    )
    .await;

    let MofuError::Api(api) = err else {
        panic!("expected api error");
    };
    assert_eq!(api.kind(), ErrorKind::Unknown);
    assert_eq!(api.code(), "unknown_error");
    assert_eq!(api.status(), 502);
    assert!(api.body().is_none());
}

#[tokio::test]
async fn envelope_status_wins_over_http_status() {
    let err = follow_error(ResponseTemplate::new(400).set_body_json(json!({
        "code": "general:validation_error",
        "status": 422
    })))
    .await;

    let MofuError::Api(api) = err else {
        panic!("expected api error");
    };
    assert_eq!(api.kind(), ErrorKind::ValidationError);
    assert_eq!(api.status(), 422);
}

#[tokio::test]
async fn connection_refused_is_a_transport_error() {
    let client = Client::with_config(MofuConfig::new().with_api_base("http://127.0.0.1:1"))
        .backoff(
            backon::ExponentialBuilder::default()
                .with_min_delay(std::time::Duration::from_millis(1))
                .with_max_times(1),
        )
        .build()
        .unwrap();
    client.store().set("tokA");

    let err = client.users().my_profile().await.unwrap_err();
    assert!(matches!(err, MofuError::Transport(_)));
    assert_eq!(err.api_kind(), None);
    // Transport failures never touch the session
    assert!(client.store().is_authenticated());
}
