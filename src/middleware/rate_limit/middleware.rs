use std::sync::Arc;
use crate::middleware::{
    Middleware, MiddlewareError, Request, RequestAction, RequestContext, Response,
};
use crate::store::{keys, KeyValueStore};
use super::config::RateLimitConfig;
use async_trait::async_trait;
use hyper::Method;
use tracing::{debug, warn};

/// Rate Limit 미들웨어
///
/// 요청마다 적용 가능한 카운터(IP, 사용자, 엔드포인트)를 모두
/// 증가시킨 뒤, 하나라도 한도를 넘으면 거부합니다. 다른 카운터가
/// 거부하더라도 도달한 모든 카운터는 1씩 소비됩니다.
pub struct RateLimitMiddleware {
    config: RateLimitConfig,
    store: Arc<dyn KeyValueStore>,
}

impl RateLimitMiddleware {
    pub fn new(config: RateLimitConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self { config, store }
    }

    /// 이 요청에 적용할 (키, 한도, 범위 이름) 목록을 만듭니다.
    fn checks(&self, req: &Request, ctx: &RequestContext) -> Vec<(String, u64, &'static str)> {
        let mut checks = vec![(
            format!("{}:{}", keys::RATE_LIMIT_IP, ctx.client_ip),
            self.config.ip_max_per_window,
            "ip",
        )];

        if let Some(user_id) = &ctx.user_id {
            checks.push((
                format!("{}:{}", keys::RATE_LIMIT_USER, user_id),
                self.config.user_max_per_window,
                "user",
            ));
        }

        let path = req.uri().path();
        if req.method() == Method::POST && path.ends_with("/login/") {
            checks.push((
                format!("{}:{}", keys::RATE_LIMIT_LOGIN, ctx.client_ip),
                self.config.login_max_per_window,
                "login",
            ));
        } else if path.starts_with(&self.config.api_prefix) {
            checks.push((
                format!("{}:{}:{}", keys::RATE_LIMIT_API, ctx.client_ip, path),
                self.config.api_max_per_window,
                "api",
            ));
        }

        checks
    }
}

#[async_trait]
impl Middleware for RateLimitMiddleware {
    fn name(&self) -> &str {
        "rate-limit"
    }

    async fn handle_request(
        &self,
        req: Request,
        ctx: &mut RequestContext,
    ) -> Result<RequestAction, MiddlewareError> {
        let window = self.config.window();
        let mut denied: Option<&'static str> = None;

        // 거부가 확정되어도 나머지 카운터를 계속 증가시킴
        for (key, max, scope) in self.checks(&req, ctx) {
            match self.store.incr(&key, window).await {
                Ok(count) if count > max => {
                    debug!(key, count, max, "속도 제한 초과");
                    denied.get_or_insert(scope);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(key, error = %e, fail_open = self.config.fail_open, "카운터 증가 실패");
                    if !self.config.fail_open {
                        denied.get_or_insert(scope);
                    }
                }
            }
        }

        match denied {
            Some(scope) => Err(MiddlewareError::RateLimited {
                scope: scope.to_string(),
            }),
            None => Ok(RequestAction::Continue(req)),
        }
    }

    async fn handle_response(
        &self,
        res: Response,
        _ctx: &RequestContext,
    ) -> Result<Response, MiddlewareError> {
        Ok(res)
    }
}
