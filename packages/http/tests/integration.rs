use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use etcdv2_http::{HttpRequest, ReqwestExecutor, Transport};

fn transport() -> Transport {
    let executor = ReqwestExecutor::with_defaults().unwrap();
    Transport::with_handle(Arc::new(executor), Handle::current())
}

#[tokio::test]
async fn test_put_sends_form_body() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v2/keys/message"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("value=hello&ttl=5"))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"action":"set"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let request = HttpRequest::put(format!("{}/v2/keys/message", server.uri()))
        .with_form("value", "hello")
        .with_form("ttl", "5");

    let response = transport().execute(request).await.unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.status_text, "Created");
    assert_eq!(response.body.as_deref(), Some(r#"{"action":"set"}"#));
}

#[tokio::test]
async fn test_error_status_body_is_still_read() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/keys/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string(r#"{"errorCode":100,"message":"Key not found"}"#),
        )
        .mount(&server)
        .await;

    let response = transport()
        .execute(HttpRequest::get(format!("{}/v2/keys/missing", server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status, 404);
    assert!(response.body.unwrap().contains("Key not found"));
}

#[tokio::test]
async fn test_empty_body_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v2/keys/dir"))
        .and(query_param("dir", "true"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let response = transport()
        .execute(HttpRequest::delete(format!("{}/v2/keys/dir?dir=true", server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status, 202);
    assert!(response.body.is_none());
}

#[tokio::test]
async fn test_request_without_timeout_waits_for_slow_server() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/keys/watched"))
        .and(query_param("wait", "true"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"action":"set"}"#)
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let response = transport()
        .execute(HttpRequest::get(format!(
            "{}/v2/keys/watched?wait=true",
            server.uri()
        )))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_per_request_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/keys/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let request = HttpRequest::get(format!("{}/v2/keys/slow", server.uri()))
        .with_timeout(Some(Duration::from_millis(100)));

    let err = transport().execute(request).await.unwrap_err();

    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Nothing listens on port 1.
    let err = transport()
        .execute(HttpRequest::get("http://127.0.0.1:1/version"))
        .await
        .unwrap_err();

    assert!(matches!(err, etcdv2_http::Error::Http(_)));
}
