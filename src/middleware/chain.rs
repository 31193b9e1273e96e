use super::{Middleware, MiddlewareError, Request, RequestAction, RequestContext, Response};
use tracing::debug;

/// 순서가 고정된 미들웨어 체인
///
/// 요청 단계는 등록 순서대로, 응답 단계는 역순으로 실행됩니다.
#[derive(Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    pub fn add<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }

    pub fn add_boxed(&mut self, middleware: Box<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// 요청 단계 실행
    ///
    /// 어떤 미들웨어가 조기 응답을 반환하면 나머지 요청 단계는
    /// 건너뜁니다.
    pub async fn handle_request(
        &self,
        mut request: Request,
        ctx: &mut RequestContext,
    ) -> Result<RequestAction, MiddlewareError> {
        for middleware in &self.middlewares {
            match middleware.handle_request(request, ctx).await? {
                RequestAction::Continue(req) => request = req,
                RequestAction::ShortCircuit(res) => {
                    debug!(
                        middleware = middleware.name(),
                        status = %res.status(),
                        "요청 단계 조기 종료"
                    );
                    return Ok(RequestAction::ShortCircuit(res));
                }
            }
        }
        Ok(RequestAction::Continue(request))
    }

    /// 응답 단계 실행 (역순)
    pub async fn handle_response(
        &self,
        mut response: Response,
        ctx: &RequestContext,
    ) -> Result<Response, MiddlewareError> {
        for middleware in self.middlewares.iter().rev() {
            response = middleware.handle_response(response, ctx).await?;
        }
        Ok(response)
    }
}
