use std::sync::Arc;
use std::time::Duration;
use afetch_core::error::TransportError;
use afetch_core::memory::{MemoryDocument, MemoryElement};
use afetch_core::surface::Element;
use afetch_core::transport::{CancellationToken, Transport};
use afetch_core::types::{ActivationRequest, FetchOptions, FormData, RequestBody};
use afetch_core::{ActivationOutcome, Dispatcher};
use afetch_http::HttpTransport;
use axum::body::Bytes;
use axum::http::header::{CONTENT_TYPE, REFERER};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use http::{Method, StatusCode};
use url::Url;

async fn echo(headers: HeaderMap, body: Bytes) -> Response {
    let mut response = body.into_response();
    if let Some(content_type) = headers.get(CONTENT_TYPE) {
        response.headers_mut().insert(CONTENT_TYPE, content_type.clone());
    }
    response
}

async fn referer(headers: HeaderMap) -> String {
    headers
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(30)).await;
    "late"
}

async fn serve() -> Url {
    let _ = env_logger::builder().is_test(true).try_init();
    let router = Router::new()
        .route("/api/echo", post(echo))
        .route("/referer", get(referer))
        .route("/moved", get(|| async { Redirect::temporary("/landing") }))
        .route("/landing", get(|| async { "landed" }))
        .route("/slow", get(slow));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    Url::parse(&format!("http://{address}/")).unwrap()
}

fn request(base: &Url, path: &str) -> ActivationRequest {
    ActivationRequest {
        url: base.join(path).unwrap(),
        method: Method::GET,
        headers: Default::default(),
        body: RequestBody::Empty,
        query: Vec::new(),
        deadline: None,
        options: FetchOptions::default(),
    }
}

fn redirect(base: &Url, mode: &str) -> ActivationRequest {
    let mut request = request(base, "/moved");
    request.options.redirect = Some(mode.to_string());
    request
}

#[tokio::test]
async fn echo_scenario_renders_the_posted_json() {
    let base = serve().await;
    let document = Arc::new(MemoryDocument::new(base.clone()));
    let target = document.append(MemoryElement::new("div").with_attribute("id", "out"));
    let button = document.append(
        MemoryElement::new("button")
            .with_attribute("fetch", "/api/echo")
            .with_attribute("fetch-method", "POST")
            .with_attribute("fetch-body", r#"{"a":1}"#)
            .with_attribute("fetch-target", "#out"),
    );

    let dispatcher = Dispatcher::builder(document.clone(), Arc::new(HttpTransport::new().unwrap()))
        .build()
        .unwrap();
    let report = dispatcher.activate(button).await;

    assert!(report.outcome.is_success(), "{:?}", report.outcome);
    assert_eq!(target.text_content(), "{\n  \"a\": 1\n}");
}

#[tokio::test]
async fn multipart_bodies_carry_a_boundary() {
    let base = serve().await;
    let mut form = FormData::new();
    form.append("email", "a@b.c");

    let mut request = request(&base, "/api/echo");
    request.method = Method::POST;
    request.body = RequestBody::Multipart(form);

    let response = HttpTransport::new()
        .unwrap()
        .send(request, CancellationToken::new())
        .await
        .unwrap();

    assert!(response.content_type().unwrap().starts_with("multipart/form-data; boundary="));
    let text = response.text();
    assert!(text.contains("name=\"email\""));
    assert!(text.contains("a@b.c"));
}

#[tokio::test]
async fn redirect_modes() {
    let base = serve().await;
    let transport = HttpTransport::new().unwrap();

    let followed = transport.send(redirect(&base, "follow"), CancellationToken::new()).await.unwrap();
    assert_eq!(followed.status, StatusCode::OK);
    assert_eq!(followed.text(), "landed");
    assert_eq!(followed.url.path(), "/landing");

    let manual = transport.send(redirect(&base, "manual"), CancellationToken::new()).await.unwrap();
    assert_eq!(manual.status, StatusCode::TEMPORARY_REDIRECT);

    let refused = transport.send(redirect(&base, "error"), CancellationToken::new()).await;
    assert!(matches!(refused, Err(TransportError::Network { .. })));
}

#[tokio::test]
async fn referrer_option_is_sent_as_header() {
    let base = serve().await;
    let mut request = request(&base, "/referer");
    request.options.referrer = Some("/origin-page".to_string());

    let response = HttpTransport::new()
        .unwrap()
        .send(request, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.text(), base.join("/origin-page").unwrap().as_str());
}

#[tokio::test]
async fn cancellation_abandons_the_exchange() {
    let base = serve().await;
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let result = HttpTransport::new().unwrap().send(request(&base, "/slow"), token).await;
    assert_eq!(result.unwrap_err(), TransportError::Cancelled);
}

#[tokio::test]
async fn unreachable_host_is_a_network_failure() {
    let document = Arc::new(MemoryDocument::new(Url::parse("http://127.0.0.1:9/").unwrap()));
    let button = document.append(MemoryElement::new("button").with_attribute("fetch", "/nothing"));
    let dispatcher = Dispatcher::builder(document.clone(), Arc::new(HttpTransport::new().unwrap()))
        .build()
        .unwrap();

    let report = dispatcher.activate(button.clone()).await;
    assert!(matches!(report.outcome, ActivationOutcome::Failed(TransportError::Network { .. })));
    assert!(!button.has_attribute("aria-disabled"));
}
