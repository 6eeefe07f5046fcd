use mofumofu_async::{Client, MofuConfig, MultipartBody};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> Client {
    Client::with_config(MofuConfig::new().with_api_base(server.uri()))
        .backoff(
            backon::ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(10))
                .with_max_delay(Duration::from_millis(50))
                .with_max_times(2),
        )
        .build()
        .unwrap()
}

fn user() -> serde_json::Value {
    json!({"name": "Mofu", "handle": "mofu", "email": "mofu@example.com"})
}

#[tokio::test]
async fn bearer_attached_when_signed_in() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0/user/my_profile"))
        .and(header("authorization", "Bearer tokA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    client.store().set("tokA");

    let me = client.users().my_profile().await.unwrap();
    assert_eq!(me.handle, "mofu");
    assert_eq!(me.profile_image, None);
}

#[tokio::test]
async fn no_bearer_when_signed_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let posts: Vec<serde_json::Value> = client.get("v0/posts").await.unwrap();
    assert!(posts.is_empty());

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("authorization").is_none());
    assert_eq!(
        received[0].headers.get("accept").unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn query_parameters_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0/posts"))
        .and(wiremock::matchers::query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let _: Vec<serde_json::Value> = client
        .get_with_query("v0/posts", &json!({"page": 2, "tag": null}))
        .await
        .unwrap();
}

#[tokio::test]
async fn public_channel_sends_no_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v0/auth/sign_in"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "refresh_token=r1; Path=/; HttpOnly")
                .set_body_json(json!({"access_token": "tokA"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v0/user/profile"))
        .and(body_json(json!({"handle": "other"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(user()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v0/user/my_profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    client.auth().sign_in("mofu", "pw").await.unwrap();

    client.users().profile("other").await.unwrap();
    client.users().my_profile().await.unwrap();

    let received = server.received_requests().await.unwrap();
    let public = received
        .iter()
        .find(|r| r.url.path() == "/v0/user/profile")
        .unwrap();
    assert!(public.headers.get("authorization").is_none());
    assert!(public.headers.get("cookie").is_none());

    let private = received
        .iter()
        .find(|r| r.url.path() == "/v0/user/my_profile")
        .unwrap();
    assert_eq!(private.headers.get("authorization").unwrap(), "Bearer tokA");
    assert_eq!(private.headers.get("cookie").unwrap(), "refresh_token=r1");
}

#[tokio::test]
async fn avatar_upload_is_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v0/user/profile/image"))
        .and(header("authorization", "Bearer tokA"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    client.store().set("tokA");
    client
        .users()
        .upload_avatar(vec![0x89_u8, b'P', b'N', b'G'], "me.png", "image/png")
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    let content_type = received[0].headers.get("content-type").unwrap();
    assert!(
        content_type
            .to_str()
            .unwrap()
            .starts_with("multipart/form-data; boundary=")
    );
    let body = String::from_utf8_lossy(&received[0].body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("filename=\"me.png\""));
}

#[tokio::test]
async fn custom_multipart_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v0/post/thumbnail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"url": "https://cdn/x.png"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let form = MultipartBody::new()
        .text("slug", "hello")
        .file("file", "x.png", "image/png", vec![1_u8]);
    let resp: serde_json::Value = client
        .post_multipart("v0/post/thumbnail", form)
        .await
        .unwrap();
    assert_eq!(resp["url"], "https://cdn/x.png");
}

#[tokio::test]
async fn follow_and_unfollow() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v0/follow"))
        .and(body_json(json!({"followee_handle": "other"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v0/unfollow"))
        .and(body_json(json!({"followee_handle": "other"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    client.store().set("tokA");
    client.follows().follow("other").await.unwrap();
    client.follows().unfollow("other").await.unwrap();
}

#[tokio::test]
async fn update_profile_sends_only_set_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v0/user/profile"))
        .and(body_json(json!({"name": "Mofu Mofu"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Mofu Mofu", "handle": "mofu", "email": "mofu@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    client.store().set("tokA");
    let req = mofumofu_async::types::UpdateProfileRequest::default().with_name("Mofu Mofu");
    let me = client.users().update_profile(&req).await.unwrap();
    assert_eq!(me.name, "Mofu Mofu");
}
