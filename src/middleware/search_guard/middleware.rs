use std::sync::Arc;
use async_trait::async_trait;
use tracing::debug;

use crate::filter::SensitiveContentFilter;
use crate::middleware::{
    Middleware, MiddlewareError, Request, RequestAction, RequestContext, Response,
};
use crate::validation::ValidatedSearchParams;

/// 검색 가드 미들웨어
///
/// 설정된 검색 경로에만 적용됩니다. 파라미터 검증은 전체가
/// 통과해야 하며, 검증된 파라미터는 컨텍스트에 실려 핸들러로
/// 전달됩니다.
pub struct SearchGuardMiddleware {
    search_prefix: String,
    filter: Arc<SensitiveContentFilter>,
}

impl SearchGuardMiddleware {
    pub fn new(search_prefix: impl Into<String>, filter: Arc<SensitiveContentFilter>) -> Self {
        Self {
            search_prefix: search_prefix.into(),
            filter,
        }
    }

    fn query_pairs(req: &Request) -> Vec<(String, String)> {
        let query = req.uri().query().unwrap_or("");
        url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }
}

#[async_trait]
impl Middleware for SearchGuardMiddleware {
    fn name(&self) -> &str {
        "search-guard"
    }

    async fn handle_request(
        &self,
        req: Request,
        ctx: &mut RequestContext,
    ) -> Result<RequestAction, MiddlewareError> {
        if !req.uri().path().starts_with(&self.search_prefix) {
            return Ok(RequestAction::Continue(req));
        }

        let pairs = Self::query_pairs(&req);

        // 민감 단어 검사는 이스케이프 전의 원본 검색어로 수행
        let raw_query = pairs
            .iter()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.as_str())
            .unwrap_or("");
        let (allowed, reason) = self.filter.is_search_allowed(raw_query).await;
        if !allowed {
            debug!("민감 단어가 포함된 검색 거부");
            return Err(MiddlewareError::ValidationRejected {
                field: "q",
                reason: reason.unwrap_or_else(|| "query not allowed".to_string()),
            });
        }

        let params = ValidatedSearchParams::from_query(&pairs)?;
        ctx.search_params = Some(params);
        Ok(RequestAction::Continue(req))
    }

    async fn handle_response(
        &self,
        res: Response,
        _ctx: &RequestContext,
    ) -> Result<Response, MiddlewareError> {
        Ok(res)
    }
}
