use serde::Deserialize;
use std::env;
use super::SettingsError;

/// 민감어 필터 설정
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FilterSettings {
    /// 단어 목록 파일 경로 (없으면 내장 목록 사용)
    #[serde(default)]
    pub word_file: Option<String>,

    /// 단어 파일 변경 감시 여부
    #[serde(default)]
    pub watch: bool,
}

impl FilterSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let settings = Self {
            word_file: env::var("GATEKEEPER_WORD_FILE").ok(),
            watch: super::parse_env_var("GATEKEEPER_WORD_FILE_WATCH", || false)?,
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        // 감시는 파일 기반 목록에서만 의미가 있음
        if self.watch && self.word_file.is_none() {
            return Err(SettingsError::EnvVarMissing {
                var_name: "GATEKEEPER_WORD_FILE".to_string(),
            });
        }
        Ok(())
    }
}
