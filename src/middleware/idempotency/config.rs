use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 멱등성 캐시 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyConfig {
    /// 캐시가 적용되는 경로 접두사
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// 캐시 항목 TTL (초)
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// 해싱/캐싱 대상 본문 크기 상한 (바이트)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_api_prefix() -> String {
    "/api/".to_string()
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_max_body_bytes() -> usize {
    256 * 1024
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            api_prefix: default_api_prefix(),
            ttl_secs: default_ttl_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl IdempotencyConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IdempotencyConfig::default();
        assert_eq!(config.api_prefix, "/api/");
        assert_eq!(config.ttl(), Duration::from_secs(3600));
        assert_eq!(config.max_body_bytes, 256 * 1024);
    }
}
