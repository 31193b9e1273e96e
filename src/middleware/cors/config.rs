use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 허용할 Origin 목록 (정확한 문자열 또는 `*` 와일드카드 포함 패턴)
    #[serde(default)]
    pub allow_origins: Vec<String>,

    /// 허용할 HTTP 메서드 목록
    #[serde(default = "default_methods")]
    pub allow_methods: Vec<String>,

    /// 허용할 헤더 목록
    #[serde(default = "default_headers")]
    pub allow_headers: Vec<String>,

    /// 노출할 헤더 목록
    #[serde(default = "default_expose_headers")]
    pub expose_headers: Vec<String>,

    /// preflight 요청 캐시 시간 (초)
    #[serde(default = "default_max_age")]
    pub max_age: u32,
}

fn default_methods() -> Vec<String> {
    ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_headers() -> Vec<String> {
    ["Content-Type", "Authorization", "Idempotency-Key"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_expose_headers() -> Vec<String> {
    ["X-Idempotency-Replayed", "X-Request-Id"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_age() -> u32 {
    86400
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: Vec::new(),
            allow_methods: default_methods(),
            allow_headers: default_headers(),
            expose_headers: default_expose_headers(),
            max_age: default_max_age(),
        }
    }
}
