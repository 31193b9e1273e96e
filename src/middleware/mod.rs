//! 요청 처리 미들웨어 파이프라인
//!
//! 모든 인바운드 요청/응답 주기를 감싸는 인터셉터 체인입니다.
//! 각 미들웨어는 체인을 조기 종료(응답 반환)하거나 요청/응답을
//! 수정하며, 요청 단계에서 조기 종료되더라도 응답 단계의
//! 데코레이터(CORS, 보안 헤더)는 항상 실행됩니다.

pub mod chain;
pub mod cors;
pub mod error;
pub mod idempotency;
pub mod pipeline;
pub mod rate_limit;
pub mod response;
pub mod search_guard;
pub mod security_headers;
pub mod traits;

pub use chain::MiddlewareChain;
pub use error::MiddlewareError;
pub use pipeline::Pipeline;
pub use traits::{Middleware, RequestAction};

use std::net::SocketAddr;
use bytes::Bytes;

use crate::validation::ValidatedSearchParams;
use idempotency::IdempotencyState;

/// 본문이 버퍼링된 요청 (서버 경계에서 수집됨)
pub type Request = hyper::Request<Bytes>;
/// 본문이 버퍼링된 응답 (서버 경계에서 `Full<Bytes>`로 변환됨)
pub type Response = hyper::Response<Bytes>;

/// 인증된 사용자 ID를 전달하는 헤더 (상위 인증 프록시가 주입)
pub const USER_ID_HEADER: &str = "x-user-id";

/// 요청별 컨텍스트
///
/// before/after 단계 간 상태는 요청 객체를 변형하는 대신
/// 이 컨텍스트를 통해 명시적으로 전달됩니다.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_id: String,
    pub client_ip: String,
    pub user_id: Option<String>,
    pub origin: Option<String>,
    /// 멱등성 캐시가 `before`에서 무장(arm)했는지 여부
    pub idempotency: Option<IdempotencyState>,
    /// 검색 가드가 검증을 마친 파라미터
    pub search_params: Option<ValidatedSearchParams>,
}

impl RequestContext {
    pub fn from_request(req: &Request, remote_addr: Option<SocketAddr>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            client_ip: client_ip(req, remote_addr),
            user_id: header_value(req, USER_ID_HEADER),
            origin: header_value(req, "origin"),
            idempotency: None,
            search_params: None,
        }
    }
}

/// 클라이언트 IP 추출
///
/// X-Forwarded-For의 첫 항목을 우선하고, 없으면 전송 계층 주소를
/// 사용합니다.
fn client_ip(req: &Request, remote_addr: Option<SocketAddr>) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(ip) = forwarded.split(',').next() {
            let ip = ip.trim();
            if !ip.is_empty() {
                return ip.to_string();
            }
        }
    }

    remote_addr
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn header_value(req: &Request, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
}
