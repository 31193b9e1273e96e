//! CORS 협상 미들웨어
//!
//! preflight(OPTIONS) 요청을 조기 응답으로 처리하고,
//! 일반 응답에 CORS 헤더를 주입합니다.

mod config;
mod middleware;

pub use config::CorsConfig;
pub use middleware::CorsMiddleware;
