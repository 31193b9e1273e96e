use std::future::Future;
use std::sync::Arc;
use tracing::{error, warn};

use crate::filter::SensitiveContentFilter;
use crate::settings::Settings;
use crate::store::KeyValueStore;
use super::cors::CorsMiddleware;
use super::idempotency::IdempotencyMiddleware;
use super::rate_limit::RateLimitMiddleware;
use super::response::{apply_retry_headers, handle_middleware_error};
use super::search_guard::SearchGuardMiddleware;
use super::security_headers::{apply_security_headers, SecurityHeadersMiddleware};
use super::{MiddlewareChain, Request, RequestAction, RequestContext, Response};

/// 파이프라인 컨트롤러
///
/// 고정된 순서의 체인을 구성하고 전체 요청/응답 주기를 실행합니다.
///
/// 요청 단계: 검색 가드 → 속도 제한 → CORS(preflight 조기 종료) →
/// 멱등성 before → 핸들러. 응답 단계(역순): 멱등성 after →
/// CORS 데코레이션 → 보안 헤더. 요청 단계에서 조기 종료되거나
/// 오류가 나더라도 응답 단계는 항상 실행됩니다.
pub struct Pipeline {
    chain: MiddlewareChain,
}

impl Pipeline {
    pub fn new(
        settings: &Settings,
        store: Arc<dyn KeyValueStore>,
        filter: Arc<SensitiveContentFilter>,
    ) -> Self {
        let mut chain = MiddlewareChain::new();

        // 보안 헤더는 응답 역순 실행에서 마지막에 오도록 맨 앞에 등록
        chain.add(SecurityHeadersMiddleware::new());
        chain.add(SearchGuardMiddleware::new(
            settings.search.path_prefix.clone(),
            filter,
        ));
        chain.add(RateLimitMiddleware::new(
            settings.rate_limit.clone(),
            store.clone(),
        ));
        chain.add(CorsMiddleware::new(settings.cors.clone()));
        chain.add(IdempotencyMiddleware::new(
            settings.idempotency.clone(),
            store,
        ));

        Self { chain }
    }

    /// 하나의 요청/응답 주기를 실행합니다.
    ///
    /// 핸들러는 요청 단계가 조기 종료되지 않았을 때만 호출됩니다.
    pub async fn process<F, Fut>(
        &self,
        req: Request,
        mut ctx: RequestContext,
        handler: F,
    ) -> Response
    where
        F: FnOnce(Request, RequestContext) -> Fut,
        Fut: Future<Output = Response>,
    {
        let request_id = ctx.request_id.clone();

        let response = match self.chain.handle_request(req, &mut ctx).await {
            Ok(RequestAction::Continue(req)) => {
                let ctx_for_handler = ctx.clone();
                handler(req, ctx_for_handler).await
            }
            Ok(RequestAction::ShortCircuit(res)) => res,
            Err(e) => {
                warn!(request_id, error = %e, "요청 단계 종결 오류");
                handle_middleware_error(&e)
            }
        };

        // 조기 응답과 오류 응답에도 응답 단계는 항상 적용
        let mut response = match self.chain.handle_response(response, &ctx).await {
            Ok(res) => res,
            Err(e) => {
                error!(request_id, error = %e, "응답 단계 오류");
                let mut res = handle_middleware_error(&e);
                // 매핑 경로에서도 보안 헤더는 보장
                apply_security_headers(res.headers_mut());
                res
            }
        };

        if let Ok(value) = request_id.parse() {
            response.headers_mut().insert("x-request-id", value);
        }
        apply_retry_headers(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use bytes::Bytes;
    use hyper::{Method, StatusCode};

    fn pipeline() -> Pipeline {
        let settings = Settings::default();
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let filter = Arc::new(SensitiveContentFilter::new(store.clone(), None));
        Pipeline::new(&settings, store, filter)
    }

    fn ok_handler(
        req: Request,
        _ctx: RequestContext,
    ) -> impl Future<Output = Response> {
        let _ = req;
        async {
            hyper::Response::builder()
                .status(StatusCode::OK)
                .body(Bytes::from_static(b"{\"ok\":true}"))
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_normal_request_flows_through() {
        let p = pipeline();
        let req = hyper::Request::builder()
            .method(Method::GET)
            .uri("/api/articles/")
            .body(Bytes::new())
            .unwrap();
        let ctx = RequestContext::from_request(&req, None);

        let res = p.process(req, ctx, ok_handler).await;
        assert_eq!(res.status(), StatusCode::OK);
        // 모든 응답에 보안 헤더와 요청 ID가 실림
        assert_eq!(res.headers()["x-frame-options"], "DENY");
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_denied_response_still_gets_decorations() {
        let settings = Settings {
            rate_limit: crate::middleware::rate_limit::RateLimitConfig {
                ip_max_per_window: 0,
                ..Default::default()
            },
            ..Settings::default()
        };
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let filter = Arc::new(SensitiveContentFilter::new(store.clone(), None));
        let p = Pipeline::new(&settings, store, filter);

        let req = hyper::Request::builder()
            .method(Method::GET)
            .uri("/api/articles/")
            .header("origin", "https://app.example.com")
            .body(Bytes::new())
            .unwrap();
        let ctx = RequestContext::from_request(&req, None);

        let res = p
            .process(req, ctx, |_, _| async {
                hyper::Response::new(Bytes::from_static(b"handler should not run"))
            })
            .await;
        // 핸들러가 실행됐다면 상태가 200이므로 여기서 함께 검증됨
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(res.headers()["retry-after"], "60");
        assert_eq!(res.headers()["x-frame-options"], "DENY");
    }
}
