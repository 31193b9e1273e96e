use std::{env, fs, path::Path};
use serde::Deserialize;

use crate::middleware::cors::CorsConfig;
use crate::middleware::idempotency::IdempotencyConfig;
use crate::middleware::rate_limit::RateLimitConfig;

mod server;
pub mod logging;
mod error;
mod filter;

pub use server::ServerSettings;
pub use logging::LogSettings;
pub use error::SettingsError;
pub use filter::FilterSettings;

pub type Result<T> = std::result::Result<T, SettingsError>;
pub use server::parse_env_var;

/// 검색 가드 설정
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    /// 검색 엔드포인트 경로 접두사
    #[serde(default = "default_search_prefix")]
    pub path_prefix: String,
}

fn default_search_prefix() -> String {
    "/api/search/".to_string()
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            path_prefix: default_search_prefix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    // 서버 설정
    #[serde(default)]
    pub server: ServerSettings,

    // 로깅 설정
    #[serde(default)]
    pub logging: LogSettings,

    /// CORS 설정
    #[serde(default)]
    pub cors: CorsConfig,

    /// 속도 제한 설정
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// 멱등성 캐시 설정
    #[serde(default)]
    pub idempotency: IdempotencyConfig,

    /// 민감어 필터 설정
    #[serde(default)]
    pub filter: FilterSettings,

    /// 검색 가드 설정
    #[serde(default)]
    pub search: SearchSettings,
}

impl Settings {
    pub fn load() -> Result<Self> {
        if let Ok(config_path) = env::var("GATEKEEPER_CONFIG_FILE") {
            Self::from_toml_file(&config_path)
        } else {
            Self::from_env()
        }
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).map_err(|e| SettingsError::FileError {
            path: path.as_ref().to_string_lossy().to_string(),
            error: e,
        })?;

        let settings: Self = toml::from_str(&content)
            .map_err(|e| SettingsError::ParseError { source: e })?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_env() -> Result<Self> {
        let mut rate_limit = RateLimitConfig::default();
        // API 한도는 배포 환경별 조정 대상이므로 환경 변수로도 노출
        let default_api_max = rate_limit.api_max_per_window;
        rate_limit.api_max_per_window =
            parse_env_var("GATEKEEPER_API_RATE_LIMIT", || default_api_max)?;

        let settings = Self {
            server: ServerSettings::from_env()?,
            logging: LogSettings::from_env()?,
            cors: CorsConfig::default(),
            rate_limit,
            idempotency: IdempotencyConfig::default(),
            filter: FilterSettings::from_env()?,
            search: SearchSettings::default(),
        };

        // 설정 생성 시점에 바로 검증
        settings.validate()?;
        Ok(settings)
    }

    /// 설정 유효성 검증
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.filter.validate()?;

        if self.rate_limit.window_secs == 0 {
            return Err(SettingsError::InvalidConfig(
                "rate_limit.window_secs must be greater than 0".to_string(),
            ));
        }

        if self.idempotency.ttl_secs == 0 {
            return Err(SettingsError::InvalidConfig(
                "idempotency.ttl_secs must be greater than 0".to_string(),
            ));
        }

        for prefix in [
            &self.rate_limit.api_prefix,
            &self.idempotency.api_prefix,
            &self.search.path_prefix,
        ] {
            if !prefix.starts_with('/') {
                return Err(SettingsError::InvalidConfig(format!(
                    "path prefix must start with '/': {}",
                    prefix
                )));
            }
        }

        Ok(())
    }
}
