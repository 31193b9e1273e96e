//! 보안 헤더 미들웨어
//!
//! 모든 응답에 고정된 보안 헤더 묶음을 무조건 주입합니다.

mod middleware;

pub use middleware::{apply_security_headers, SecurityHeadersMiddleware};
