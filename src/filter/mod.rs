//! 민감 단어 필터
//!
//! 검색어 등 사용자 입력에서 민감 단어를 탐지/마스킹합니다.
//! 단어 집합은 저장소 캐시 → 단어 파일 → 내장 기본값 순으로 로드되며,
//! 어떤 단계에서 실패하더라도 빈 집합이 아닌 내장 집합으로 귀결됩니다.

mod sensitive;
mod watcher;
mod words;

pub use sensitive::SensitiveContentFilter;
pub use watcher::WordFileWatcher;
pub use words::DEFAULT_WORDS;

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("단어 파일 감시 실패: {0}")]
    Watch(String),
}
