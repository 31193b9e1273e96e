//! 공유 키/값 저장소
//!
//! 파이프라인의 모든 요청 간 상태(멱등성 캐시, 속도 제한 카운터,
//! 민감 단어 집합)는 TTL을 지원하는 키/값 저장소를 통해 관리됩니다.

mod memory;

pub use memory::MemoryStore;

use std::time::Duration;
use async_trait::async_trait;
use bytes::Bytes;

/// 저장소 키 네임스페이스 (콜론 구분)
///
/// ```text
/// idempotency:{method}:{path}:{user}:{token}:{hash}  → 캐시된 응답
/// rate_limit_ip:{ip}                                 → IP별 카운터
/// rate_limit_user:{id}                               → 사용자별 카운터
/// rate_limit_login:{ip}                              → 로그인 엔드포인트 카운터
/// rate_limit_api:{ip}:{path}                         → API 엔드포인트 카운터
/// sensitive_words_set                                → 민감 단어 집합 (JSON)
/// ```
pub mod keys {
    pub const IDEMPOTENCY: &str = "idempotency";
    pub const RATE_LIMIT_IP: &str = "rate_limit_ip";
    pub const RATE_LIMIT_USER: &str = "rate_limit_user";
    pub const RATE_LIMIT_LOGIN: &str = "rate_limit_login";
    pub const RATE_LIMIT_API: &str = "rate_limit_api";
    pub const SENSITIVE_WORDS: &str = "sensitive_words_set";
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("저장소 사용 불가: {0}")]
    Unavailable(String),

    #[error("값 직렬화 실패: {0}")]
    Serialization(String),

    #[error("키 {key}에 카운터가 아닌 값이 존재함")]
    NotACounter { key: String },
}

/// TTL 지원 키/값 저장소 trait
///
/// 구현체는 동시 호출에 대해 get/set/incr의 원자성을 보장해야 합니다.
/// incr의 TTL은 카운터가 새로 생성될 때만 적용됩니다 (고정 윈도우).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError>;

    /// 카운터를 1 증가시키고 증가 후의 값을 반환합니다.
    /// 키가 없으면 1로 생성하며 이때만 TTL이 설정됩니다.
    async fn incr(&self, key: &str, ttl: Duration) -> Result<u64, StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
