//! Rate Limiting 미들웨어
//!
//! 고정 윈도우 카운터로 요청 속도를 제한합니다.

mod config;
mod middleware;

pub use config::RateLimitConfig;
pub use middleware::RateLimitMiddleware;
