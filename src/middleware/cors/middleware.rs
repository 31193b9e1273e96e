use crate::middleware::{
    Middleware, MiddlewareError, Request, RequestAction, RequestContext, Response,
};
use super::config::CorsConfig;
use async_trait::async_trait;
use bytes::Bytes;
use hyper::{header, HeaderMap, Method, StatusCode};
use regex_lite::Regex;
use tracing::{debug, warn};

/// CORS 미들웨어
///
/// 와일드카드 Origin 패턴은 생성 시점에 한 번만 컴파일됩니다.
pub struct CorsMiddleware {
    config: CorsConfig,
    exact_origins: Vec<String>,
    wildcard_origins: Vec<Regex>,
}

impl CorsMiddleware {
    pub fn new(config: CorsConfig) -> Self {
        let mut exact_origins = Vec::new();
        let mut wildcard_origins = Vec::new();

        for entry in &config.allow_origins {
            if entry.contains('*') {
                match compile_wildcard(entry) {
                    Ok(re) => wildcard_origins.push(re),
                    Err(e) => warn!(pattern = entry, error = %e, "Origin 패턴 컴파일 실패, 무시"),
                }
            } else {
                exact_origins.push(entry.clone());
            }
        }

        Self {
            config,
            exact_origins,
            wildcard_origins,
        }
    }

    /// Origin 검증: 정확한 매칭 우선, 이후 와일드카드 패턴
    fn validate_origin(&self, origin: &str) -> bool {
        self.exact_origins.iter().any(|allowed| allowed == origin)
            || self.wildcard_origins.iter().any(|re| re.is_match(origin))
    }

    /// 허용된 Origin에 대한 공통 CORS 헤더 설정
    ///
    /// 자격 증명이 포함된 요청을 위해 와일드카드 리터럴이 아닌
    /// 요청 Origin을 그대로 되돌려줍니다.
    fn set_allow_headers(&self, headers: &mut HeaderMap, origin: &str) {
        if let Ok(value) = origin.parse() {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                header::HeaderValue::from_static("true"),
            );
        }
    }

    /// Preflight 요청 처리
    fn handle_preflight(&self, origin: &str) -> Response {
        if !self.validate_origin(origin) {
            debug!(origin, "허용되지 않은 Origin의 preflight 거부");
            return hyper::Response::builder()
                .status(StatusCode::FORBIDDEN)
                .body(Bytes::new())
                .unwrap_or_else(|_| hyper::Response::new(Bytes::new()));
        }

        let mut response = hyper::Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(Bytes::new())
            .unwrap_or_else(|_| hyper::Response::new(Bytes::new()));
        let headers = response.headers_mut();

        self.set_allow_headers(headers, origin);
        if let Ok(value) = self.config.allow_methods.join(", ").parse() {
            headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, value);
        }
        if let Ok(value) = self.config.allow_headers.join(", ").parse() {
            headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, value);
        }
        if let Ok(value) = self.config.max_age.to_string().parse() {
            headers.insert(header::ACCESS_CONTROL_MAX_AGE, value);
        }

        response
    }
}

#[async_trait]
impl Middleware for CorsMiddleware {
    fn name(&self) -> &str {
        "cors"
    }

    async fn handle_request(
        &self,
        req: Request,
        ctx: &mut RequestContext,
    ) -> Result<RequestAction, MiddlewareError> {
        // Origin을 가진 OPTIONS 요청은 preflight로 조기 처리
        if req.method() == Method::OPTIONS {
            if let Some(origin) = &ctx.origin {
                debug!(origin, "CORS preflight 처리");
                return Ok(RequestAction::ShortCircuit(self.handle_preflight(origin)));
            }
        }
        Ok(RequestAction::Continue(req))
    }

    async fn handle_response(
        &self,
        mut res: Response,
        ctx: &RequestContext,
    ) -> Result<Response, MiddlewareError> {
        if let Some(origin) = &ctx.origin {
            if self.validate_origin(origin) {
                self.set_allow_headers(res.headers_mut(), origin);
            }
        }

        // Expose-Headers는 Origin 매칭과 무관하게 항상 설정
        if !self.config.expose_headers.is_empty() {
            if let Ok(value) = self.config.expose_headers.join(", ").parse() {
                res.headers_mut()
                    .insert(header::ACCESS_CONTROL_EXPOSE_HEADERS, value);
            }
        }
        Ok(res)
    }
}

/// `*`를 임의 문자열로 해석하는 Origin 패턴을 컴파일합니다.
fn compile_wildcard(pattern: &str) -> Result<Regex, regex_lite::Error> {
    let mut escaped = String::with_capacity(pattern.len() + 8);
    escaped.push('^');
    for c in pattern.chars() {
        match c {
            '*' => escaped.push_str(".*"),
            c if r"\.^$+?()[]{}|-".contains(c) => {
                escaped.push('\\');
                escaped.push(c);
            }
            c => escaped.push(c),
        }
    }
    escaped.push('$');
    Regex::new(&escaped)
}
