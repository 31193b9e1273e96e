//! API Gatekeeper는 HTTP 요청 처리 미들웨어 파이프라인입니다.
//!
//! # 주요 기능
//!
//! - 멱등성 캐시 (Idempotency-Key 기반 응답 재생)
//! - 고정 윈도우 속도 제한 (IP / 사용자 / 로그인 / API 범위)
//! - 민감어 필터링 및 검색어 검증
//! - CORS 사전 검증 및 응답 데코레이션
//! - 보안 헤더 주입
//!
//! # 예제
//!
//! 검색 파라미터 검증:
//!
//! ```
//! use api_gatekeeper::validation::ValidatedSearchParams;
//!
//! let pairs = vec![
//!     ("q".to_string(), "rust tutorial".to_string()),
//!     ("page".to_string(), "2".to_string()),
//! ];
//! let params = ValidatedSearchParams::from_query(&pairs).unwrap();
//! assert_eq!(params.query, "rust tutorial");
//! assert_eq!(params.page, 2);
//! assert_eq!(params.limit, 10);
//! ```
//!
//! # 파이프라인 구성
//!
//! ```
//! use std::sync::Arc;
//! use api_gatekeeper::filter::SensitiveContentFilter;
//! use api_gatekeeper::middleware::Pipeline;
//! use api_gatekeeper::settings::Settings;
//! use api_gatekeeper::store::{KeyValueStore, MemoryStore};
//!
//! let settings = Settings::default();
//! let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
//! let filter = Arc::new(SensitiveContentFilter::new(store.clone(), None));
//! let pipeline = Pipeline::new(&settings, store, filter);
//! ```

pub mod logging;
pub mod store;
pub mod filter;
pub mod validation;
pub mod middleware;
pub mod settings;
