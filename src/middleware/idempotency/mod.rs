//! 멱등성 재생 캐시 미들웨어
//!
//! Idempotency-Key를 가진 쓰기 요청의 성공 응답을 저장소에 캐시하고,
//! TTL 안의 동일 요청에는 핸들러 호출 없이 캐시된 응답을 재생합니다.
//! 캐싱은 항상 best-effort이며, 어떤 실패도 실제 요청을 막지 않습니다.

mod config;
mod middleware;

pub use config::IdempotencyConfig;
pub use middleware::{IdempotencyMiddleware, IdempotencyState};
