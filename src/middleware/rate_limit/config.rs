use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rate Limit 설정
///
/// 모든 한도는 고정 윈도우(기본 1시간)당 허용 요청 수입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// IP당 최대 요청 수
    #[serde(default = "default_ip_max")]
    pub ip_max_per_window: u64,

    /// 인증된 사용자당 최대 요청 수
    #[serde(default = "default_user_max")]
    pub user_max_per_window: u64,

    /// 로그인 엔드포인트의 IP당 최대 요청 수
    #[serde(default = "default_login_max")]
    pub login_max_per_window: u64,

    /// API 엔드포인트의 IP+경로당 최대 요청 수
    ///
    /// 신뢰된 내부 트래픽을 가정한 느슨한 기본값이며,
    /// 배포 환경에 맞게 조정해야 하는 값입니다.
    #[serde(default = "default_api_max")]
    pub api_max_per_window: u64,

    /// 윈도우 길이 (초)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// API 경로 접두사
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// 저장소 장애 시 통과 여부 (false면 거부)
    #[serde(default = "default_fail_open")]
    pub fail_open: bool,
}

fn default_ip_max() -> u64 {
    1000
}

fn default_user_max() -> u64 {
    500
}

fn default_login_max() -> u64 {
    5
}

fn default_api_max() -> u64 {
    100_000
}

fn default_window_secs() -> u64 {
    3600
}

fn default_api_prefix() -> String {
    "/api/".to_string()
}

fn default_fail_open() -> bool {
    true
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            ip_max_per_window: default_ip_max(),
            user_max_per_window: default_user_max(),
            login_max_per_window: default_login_max(),
            api_max_per_window: default_api_max(),
            window_secs: default_window_secs(),
            api_prefix: default_api_prefix(),
            fail_open: default_fail_open(),
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}
