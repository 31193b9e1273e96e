use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use hyper::{Method, StatusCode};

use api_gatekeeper::filter::SensitiveContentFilter;
use api_gatekeeper::middleware::rate_limit::RateLimitConfig;
use api_gatekeeper::middleware::{Pipeline, Request, RequestContext, Response};
use api_gatekeeper::settings::Settings;
use api_gatekeeper::store::{KeyValueStore, MemoryStore};

fn build_pipeline(settings: Settings) -> Pipeline {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let filter = Arc::new(SensitiveContentFilter::new(store.clone(), None));
    Pipeline::new(&settings, store, filter)
}

fn request(method: Method, uri: &str, headers: &[(&str, &str)], body: &[u8]) -> Request {
    let mut builder = hyper::Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Bytes::copy_from_slice(body)).unwrap()
}

fn ctx_for(req: &Request) -> RequestContext {
    RequestContext::from_request(req, Some("203.0.113.7:50000".parse().unwrap()))
}

async fn run(pipeline: &Pipeline, req: Request) -> Response {
    let ctx = ctx_for(&req);
    pipeline
        .process(req, ctx, |_, _| async {
            hyper::Response::builder()
                .status(StatusCode::OK)
                .header("content-type", "application/json")
                .header("server", "upstream/1.0")
                .body(Bytes::from_static(b"{\"ok\":true}"))
                .unwrap()
        })
        .await
}

#[tokio::test]
async fn test_idempotent_post_is_replayed() {
    let pipeline = build_pipeline(Settings::default());
    let handler_calls = Arc::new(AtomicU32::new(0));

    let make_request = || {
        request(
            Method::POST,
            "/api/articles/",
            &[
                ("content-type", "application/json"),
                ("content-length", "16"),
                ("idempotency-key", "abc123"),
                ("x-user-id", "42"),
            ],
            b"{\"title\":\"hi\"}\r\n",
        )
    };

    let calls = handler_calls.clone();
    let req = make_request();
    let ctx = ctx_for(&req);
    let first = pipeline
        .process(req, ctx, move |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                hyper::Response::builder()
                    .status(StatusCode::CREATED)
                    .header("content-type", "application/json")
                    .body(Bytes::from_static(b"{\"id\":7}"))
                    .unwrap()
            }
        })
        .await;

    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(first.headers()["x-idempotency-replayed"], "false");

    let calls = handler_calls.clone();
    let req = make_request();
    let ctx = ctx_for(&req);
    let second = pipeline
        .process(req, ctx, move |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { hyper::Response::new(Bytes::from_static(b"should not run")) }
        })
        .await;

    // 두 번째 요청은 핸들러 없이 캐시에서 재생됨
    assert_eq!(handler_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.status(), StatusCode::CREATED);
    assert_eq!(second.headers()["x-idempotency-replayed"], "true");
    assert_eq!(second.body(), &Bytes::from_static(b"{\"id\":7}"));
}

#[tokio::test]
async fn test_login_rate_limit_denies_sixth_attempt() {
    let pipeline = build_pipeline(Settings::default());

    for attempt in 1..=5u32 {
        let req = request(
            Method::POST,
            "/api/auth/login/",
            &[("content-type", "application/json")],
            b"{}",
        );
        let res = run(&pipeline, req).await;
        assert_eq!(res.status(), StatusCode::OK, "attempt {}", attempt);
    }

    let req = request(
        Method::POST,
        "/api/auth/login/",
        &[("content-type", "application/json")],
        b"{}",
    );
    let res = run(&pipeline, req).await;

    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.headers()["retry-after"], "60");
    assert_eq!(res.headers()["x-retryable"], "true");

    let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body["code"], "rate_limited");
    // 거부 응답에도 보안 헤더가 실림
    assert_eq!(res.headers()["x-frame-options"], "DENY");
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let settings = Settings {
        rate_limit: RateLimitConfig {
            ip_max_per_window: 1,
            ..Default::default()
        },
        ..Settings::default()
    };
    let pipeline = build_pipeline(settings);

    let ok = run(&pipeline, request(Method::GET, "/api/articles/", &[], b"")).await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert!(ok.headers().contains_key("content-security-policy"));
    assert_eq!(ok.headers()["x-content-type-options"], "nosniff");
    // 업스트림 식별 헤더는 제거됨
    assert!(ok.headers().get("server").is_none());

    let denied = run(&pipeline, request(Method::GET, "/api/articles/", &[], b"")).await;
    assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(denied.headers().contains_key("content-security-policy"));
    assert_eq!(denied.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_preflight_allowed_origin() {
    let settings = Settings {
        cors: api_gatekeeper::middleware::cors::CorsConfig {
            allow_origins: vec!["https://app.example.com".to_string()],
            ..Default::default()
        },
        ..Settings::default()
    };
    let pipeline = build_pipeline(settings);

    let req = request(
        Method::OPTIONS,
        "/api/articles/",
        &[
            ("origin", "https://app.example.com"),
            ("access-control-request-method", "POST"),
        ],
        b"",
    );
    let res = run(&pipeline, req).await;

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        res.headers()["access-control-allow-origin"],
        "https://app.example.com"
    );
    assert_eq!(res.headers()["access-control-allow-credentials"], "true");
    // preflight 조기 응답에도 응답 단계 데코레이션이 적용됨
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.headers()["x-frame-options"], "DENY");
}

#[tokio::test]
async fn test_preflight_disallowed_origin_is_rejected() {
    let settings = Settings {
        cors: api_gatekeeper::middleware::cors::CorsConfig {
            allow_origins: vec!["https://app.example.com".to_string()],
            ..Default::default()
        },
        ..Settings::default()
    };
    let pipeline = build_pipeline(settings);

    let req = request(
        Method::OPTIONS,
        "/api/articles/",
        &[
            ("origin", "https://evil.example.net"),
            ("access-control-request-method", "POST"),
        ],
        b"",
    );
    let res = run(&pipeline, req).await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(res.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_cors_decoration_on_normal_response() {
    let settings = Settings {
        cors: api_gatekeeper::middleware::cors::CorsConfig {
            allow_origins: vec!["https://*.example.com".to_string()],
            ..Default::default()
        },
        ..Settings::default()
    };
    let pipeline = build_pipeline(settings);

    let req = request(
        Method::GET,
        "/api/articles/",
        &[("origin", "https://app.example.com")],
        b"",
    );
    let res = run(&pipeline, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()["access-control-allow-origin"],
        "https://app.example.com"
    );
    assert!(res.headers().contains_key("access-control-expose-headers"));
}

#[tokio::test]
async fn test_search_with_valid_query_passes() {
    let pipeline = build_pipeline(Settings::default());

    let req = request(Method::GET, "/api/search/?q=rust%20tutorial&page=2", &[], b"");
    let ctx = ctx_for(&req);
    let res = pipeline
        .process(req, ctx, |_, ctx| async move {
            let params = ctx.search_params.expect("검증된 파라미터");
            assert_eq!(params.query, "rust tutorial");
            assert_eq!(params.page, 2);
            hyper::Response::new(Bytes::from_static(b"{\"results\":[]}"))
        })
        .await;

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_search_with_sensitive_word_is_rejected() {
    let pipeline = build_pipeline(Settings::default());

    // "赌博" (내장 단어 목록)
    let req = request(Method::GET, "/api/search/?q=%E8%B5%8C%E5%8D%9A", &[], b"");
    let res = run(&pipeline, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body["code"], "validation_rejected");
    // 어떤 단어가 걸렸는지는 노출하지 않음
    assert!(!body["message"].as_str().unwrap().contains("赌博"));
}

#[tokio::test]
async fn test_search_with_sql_injection_is_rejected() {
    let pipeline = build_pipeline(Settings::default());

    // q = "1 or 1=1" (URL 인코딩)
    let req = request(Method::GET, "/api/search/?q=1%20or%201%3D1", &[], b"");
    let res = run(&pipeline, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_with_invalid_pagination_is_rejected() {
    let pipeline = build_pipeline(Settings::default());

    let req = request(Method::GET, "/api/search/?q=rust&page=0", &[], b"");
    let res = run(&pipeline, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body["code"], "validation_rejected");
}

#[tokio::test]
async fn test_non_search_path_skips_query_validation() {
    let pipeline = build_pipeline(Settings::default());

    // 검색 접두사 밖의 경로는 검색어 규칙을 적용받지 않음
    let req = request(Method::GET, "/api/articles/?q=%3Cscript%3E", &[], b"");
    let res = run(&pipeline, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_every_response_carries_request_id() {
    let pipeline = build_pipeline(Settings::default());

    let res = run(&pipeline, request(Method::GET, "/api/articles/", &[], b"")).await;
    let request_id = res.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(request_id).is_ok());
}
