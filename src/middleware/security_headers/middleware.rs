use crate::middleware::{
    Middleware, MiddlewareError, Request, RequestAction, RequestContext, Response,
};
use async_trait::async_trait;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};

/// Content-Security-Policy 지시어 (순서 고정)
const CSP_DIRECTIVES: &[&str] = &[
    "default-src 'self'",
    "script-src 'self'",
    "style-src 'self' 'unsafe-inline'",
    "img-src 'self' data:",
    "font-src 'self'",
    "connect-src 'self'",
    "frame-ancestors 'none'",
    "base-uri 'self'",
    "form-action 'self'",
];

/// Permissions-Policy로 비활성화하는 브라우저 기능
const PERMISSIONS_POLICY: &str =
    "geolocation=(), microphone=(), camera=(), payment=(), usb=()";

/// 제거할 서버 식별 헤더
const STRIP_HEADERS: &[&str] = &["server", "x-powered-by"];

/// 고정 보안 헤더 묶음을 적용하고 서버 식별 헤더를 제거합니다.
///
/// 설정 표면이 없으므로 출력은 모든 응답에 대해 결정적입니다.
pub fn apply_security_headers(headers: &mut HeaderMap) {
    let fixed: &[(&str, String)] = &[
        ("x-content-type-options", "nosniff".to_string()),
        ("x-frame-options", "DENY".to_string()),
        ("x-xss-protection", "1; mode=block".to_string()),
        ("referrer-policy", "strict-origin-when-cross-origin".to_string()),
        ("cross-origin-opener-policy", "same-origin".to_string()),
        ("cross-origin-embedder-policy", "require-corp".to_string()),
        ("cross-origin-resource-policy", "same-origin".to_string()),
        ("content-security-policy", CSP_DIRECTIVES.join("; ")),
        ("permissions-policy", PERMISSIONS_POLICY.to_string()),
    ];

    for (name, value) in fixed {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }

    for name in STRIP_HEADERS {
        headers.remove(*name);
    }
}

/// 보안 헤더 미들웨어
///
/// 요청 단계에서는 아무 일도 하지 않으며, 응답 단계에서
/// 상태 코드와 무관하게 항상 헤더를 주입합니다.
#[derive(Debug, Default)]
pub struct SecurityHeadersMiddleware;

impl SecurityHeadersMiddleware {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Middleware for SecurityHeadersMiddleware {
    fn name(&self) -> &str {
        "security-headers"
    }

    async fn handle_request(
        &self,
        req: Request,
        _ctx: &mut RequestContext,
    ) -> Result<RequestAction, MiddlewareError> {
        Ok(RequestAction::Continue(req))
    }

    async fn handle_response(
        &self,
        mut res: Response,
        _ctx: &RequestContext,
    ) -> Result<Response, MiddlewareError> {
        apply_security_headers(res.headers_mut());
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_bundle_applied_to_every_status() {
        let mw = SecurityHeadersMiddleware::new();
        for status in [200u16, 403, 404, 500] {
            let res = hyper::Response::builder()
                .status(status)
                .body(Bytes::new())
                .unwrap();
            let res = mw
                .handle_response(res, &RequestContext::default())
                .await
                .unwrap();

            let headers = res.headers();
            assert_eq!(headers["x-content-type-options"], "nosniff");
            assert_eq!(headers["x-frame-options"], "DENY");
            assert_eq!(headers["x-xss-protection"], "1; mode=block");
            assert_eq!(headers["referrer-policy"], "strict-origin-when-cross-origin");
            assert_eq!(headers["cross-origin-opener-policy"], "same-origin");
            assert_eq!(headers["cross-origin-embedder-policy"], "require-corp");
            assert_eq!(headers["cross-origin-resource-policy"], "same-origin");
            assert!(headers.contains_key("content-security-policy"));
            assert!(headers.contains_key("permissions-policy"));
        }
    }

    #[tokio::test]
    async fn test_server_identification_stripped() {
        let mw = SecurityHeadersMiddleware::new();
        let res = hyper::Response::builder()
            .header("server", "hyper")
            .header("x-powered-by", "rust")
            .body(Bytes::new())
            .unwrap();

        let res = mw
            .handle_response(res, &RequestContext::default())
            .await
            .unwrap();
        assert!(res.headers().get("server").is_none());
        assert!(res.headers().get("x-powered-by").is_none());
    }

    #[test]
    fn test_csp_directive_order_is_stable() {
        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers);
        let csp = headers["content-security-policy"].to_str().unwrap();
        assert!(csp.starts_with("default-src 'self'"));
        assert!(csp.ends_with("form-action 'self'"));
    }
}
