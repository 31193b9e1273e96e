use hyper::StatusCode;
use bytes::Bytes;
use serde_json::json;

use super::{MiddlewareError, Response};

/// 상태 코드별 Retry-After 값 (초)
fn retry_after_secs(status: StatusCode) -> Option<u64> {
    match status.as_u16() {
        429 => Some(60),
        500 => Some(10),
        502 => Some(30),
        503 => Some(60),
        504 => Some(30),
        _ => None,
    }
}

/// 재시도 가능한 상태 코드에 Retry-After / X-Retryable 헤더를 주입합니다.
///
/// 이미 Retry-After가 설정된 응답(예: 업스트림이 지정한 429)은
/// 덮어쓰지 않습니다.
pub fn apply_retry_headers(mut res: Response) -> Response {
    let Some(secs) = retry_after_secs(res.status()) else {
        return res;
    };

    let headers = res.headers_mut();
    if !headers.contains_key("retry-after") {
        headers.insert("retry-after", secs.to_string().parse().expect("숫자 값"));
    }
    headers.insert("x-retryable", "true".parse().expect("정적 값"));
    res
}

/// 미들웨어 오류를 HTTP 응답으로 변환합니다.
///
/// 본문은 안정적인 기계 판독 코드와 사람이 읽을 수 있는 메시지를
/// 담은 JSON입니다. 내부 오류의 세부 내용은 노출되지 않습니다.
pub fn handle_middleware_error(err: &MiddlewareError) -> Response {
    let (status, code, message) = match err {
        MiddlewareError::ValidationRejected { field, reason } => (
            StatusCode::BAD_REQUEST,
            "validation_rejected",
            format!("invalid parameter '{}': {}", field, reason),
        ),
        MiddlewareError::RateLimited { scope } => (
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            format!("rate limit exceeded for {}", scope),
        ),
        MiddlewareError::CircuitOpen { code } => (
            StatusCode::SERVICE_UNAVAILABLE,
            "circuit_open",
            format!("upstream dependency unavailable: {}", code),
        ),
        // 저장소/내부 오류는 일반 메시지로만
        MiddlewareError::Store(_) | MiddlewareError::Processing(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "internal server error".to_string(),
        ),
    };

    let body = json!({ "code": code, "message": message }).to_string();
    let res = hyper::Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Bytes::from(body))
        .unwrap_or_else(|_| hyper::Response::new(Bytes::from_static(b"internal server error")));

    apply_retry_headers(res)
}
