use super::{MiddlewareError, Request, RequestContext, Response};
use async_trait::async_trait;

/// 요청 단계 처리 결과
///
/// 미들웨어는 요청을 다음 단계로 넘기거나, 조기 응답으로
/// 체인을 종료할 수 있습니다 (preflight 응답, 캐시 재생 등).
pub enum RequestAction {
    Continue(Request),
    ShortCircuit(Response),
}

/// 미들웨어 트레이트
///
/// HTTP 요청과 응답을 가로채는 인터페이스를 정의합니다.
/// 요청 간 상태 전달은 `RequestContext`를 통해서만 이루어집니다.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// 미들웨어의 고유 이름을 반환합니다.
    fn name(&self) -> &str;

    /// HTTP 요청을 처리합니다.
    async fn handle_request(
        &self,
        req: Request,
        ctx: &mut RequestContext,
    ) -> Result<RequestAction, MiddlewareError>;

    /// HTTP 응답을 처리합니다. 조기 종료된 응답에도 호출됩니다.
    async fn handle_response(
        &self,
        res: Response,
        ctx: &RequestContext,
    ) -> Result<Response, MiddlewareError>;
}
