//! 검색 요청 가드 미들웨어
//!
//! 검색 엔드포인트의 쿼리 파라미터 검증과 민감 단어 검사를
//! 요청 단계에서 수행합니다.

mod middleware;

pub use middleware::SearchGuardMiddleware;
