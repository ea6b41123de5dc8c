use std::sync::{Arc, Mutex};

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use rpchttp_lite::{DiagnosticSink, HandlerFailure, RpcHttpConfig, plan};
use rpchttp_prototype::EchoService;
use rpchttp_prototype::echo::{self, echo_router_with_config, new_echo_router};
use tower::ServiceExt;

async fn send(app: &axum::Router, method: &str, uri: &str, body: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body.to_owned()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[derive(Default)]
struct RecordingSink(Mutex<Vec<HandlerFailure>>);

impl DiagnosticSink for RecordingSink {
    fn handler_failed(&self, failure: &HandlerFailure) {
        self.0.lock().unwrap().push(failure.clone());
    }
}

fn app() -> axum::Router {
    new_echo_router(EchoService::new(), "").unwrap()
}

#[test]
fn test_planned_routes() {
    let routes: Vec<_> = plan(&echo::descriptor())
        .into_iter()
        .map(|binding| (binding.path, binding.handler_name))
        .collect();

    assert_eq!(
        routes,
        [
            ("echo/say".to_string(), "_EchoServer_Say_Handler".to_string()),
            ("/custom/path".to_string(), "_EchoServer_Shout_Handler".to_string()),
            ("echo/subscribe".to_string(), "_EchoServer_Subscribe_Handler".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_say_round_trip() {
    let (status, body) = send(&app(), "POST", "/echo/say", r#"{"text":"hi"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"text":"hi"}"#);
}

#[tokio::test]
async fn test_missing_fields_decode_to_zero_values() {
    // An empty text is rejected by the service, so the request got past decoding.
    let (status, body) = send(&app(), "POST", "/echo/say", "{}").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "text must not be empty");
}

#[tokio::test]
async fn test_override_replaces_default_route() {
    let app = app();

    let (status, body) = send(&app, "POST", "/custom/path", r#"{"text":"hi"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"text":"HI"}"#);

    let (status, _) = send(&app, "POST", "/echo/shout", r#"{"text":"hi"}"#).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_streaming_is_not_implemented() {
    let app = app();

    for body in [r#"{"text":"hi"}"#, "", "not json"] {
        let (status, text) = send(&app, "POST", "/echo/subscribe", body).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(text, "Streaming functions over http are not supported");
    }
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (status, body) = send(&app(), "POST", "/echo/say", r#"{"text":"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body.is_empty());
}

#[tokio::test]
async fn test_any_http_method_is_accepted() {
    let app = app();
    for method in ["GET", "PUT", "PATCH", "DELETE"] {
        let (status, _) = send(&app, method, "/echo/say", r#"{"text":"hi"}"#).await;
        assert_eq!(status, StatusCode::OK, "{method}");
    }
}

#[tokio::test]
async fn test_prefix() {
    let app = new_echo_router(EchoService::new(), "/api/").unwrap();

    let (status, _) = send(&app, "POST", "/api/echo/say", r#"{"text":"hi"}"#).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", "/api//custom/path", r#"{"text":"hi"}"#).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", "/echo/say", r#"{"text":"hi"}"#).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_body_is_request_timeout() {
    let config = RpcHttpConfig::builder().max_body_bytes(4).build();
    let app = echo_router_with_config(EchoService::new(), config).unwrap();

    let (status, _) = send(&app, "POST", "/echo/say", r#"{"text":"hello"}"#).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
}

#[tokio::test]
async fn test_failures_reach_configured_sink() {
    let sink = Arc::new(RecordingSink::default());
    let config = RpcHttpConfig::builder().sink(sink.clone()).build();
    let app = echo_router_with_config(EchoService::new(), config).unwrap();

    send(&app, "POST", "/echo/say", r#"{"text":"hi"}"#).await;
    send(&app, "POST", "/echo/say", "not json").await;
    send(&app, "POST", "/custom/path", "{}").await;
    send(&app, "POST", "/echo/subscribe", r#"{"text":"hi"}"#).await;

    let failures = sink.0.lock().unwrap();
    let reported: Vec<_> = failures
        .iter()
        .map(|f| (f.status, f.handler.as_str(), f.route.as_str()))
        .collect();
    assert_eq!(
        reported,
        [
            (StatusCode::BAD_REQUEST, "_EchoServer_Say_Handler", "echo/say"),
            (StatusCode::INTERNAL_SERVER_ERROR, "_EchoServer_Shout_Handler", "/custom/path"),
            (StatusCode::NOT_IMPLEMENTED, "_EchoServer_Subscribe_Handler", "echo/subscribe"),
        ]
    );
    assert_eq!(failures[1].message, "text must not be empty");
}

#[tokio::test]
async fn test_broken_body_stream_is_request_timeout() {
    let sink = Arc::new(RecordingSink::default());
    let config = RpcHttpConfig::builder().sink(sink.clone()).build();
    let app = echo_router_with_config(EchoService::new(), config).unwrap();

    let chunks: Vec<Result<&'static str, std::io::Error>> = vec![
        Ok(r#"{"text":"#),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer went away")),
    ];
    let request = Request::builder()
        .method("POST")
        .uri("/echo/say")
        .body(Body::from_stream(futures::stream::iter(chunks)))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    let failures = sink.0.lock().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].status, StatusCode::REQUEST_TIMEOUT);
}

#[test]
fn test_generated_router_matches_demo() {
    let files = rpchttp_build::configure()
        .generate(&[echo::descriptor()])
        .unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "echo.rpchttp.rs");

    let code: String = files[0].contents.split_whitespace().collect();
    for expected in [
        r#"router.unary("echo/say","_EchoServer_Say_Handler""#,
        r#"router.unary("/custom/path","_EchoServer_Shout_Handler""#,
        r#"router.streaming("echo/subscribe","_EchoServer_Subscribe_Handler");"#,
        "<Tasecho_server::Echo>::shout(&service,ctx.into_request(input))",
        "input:EchoRequest",
        "pubfnnew_echo_router<T>(service:T,prefix:&str)",
    ] {
        assert!(code.contains(expected), "missing {expected} in {code}");
    }
}
