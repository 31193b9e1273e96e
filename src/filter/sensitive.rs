use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use regex_lite::Regex;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::store::{keys, KeyValueStore};
use super::words::DEFAULT_WORDS;

/// 단어 집합 캐시 TTL (1시간)
const CACHE_TTL: Duration = Duration::from_secs(3600);

/// 변형 회피에 쓰이는 구분 문자를 허용하는 문자 클래스
const SEPARATOR_CLASS: &str = r"[\s.\-_*]*";

/// 컴파일된 단어 집합
///
/// 단어별 변형 매처는 로드 시점에 한 번만 컴파일됩니다.
struct CompiledSet {
    words: Vec<String>,
    matchers: Vec<(String, Regex)>,
}

impl CompiledSet {
    fn compile(words: Vec<String>) -> Self {
        let matchers = words
            .iter()
            .filter_map(|word| match variant_pattern(word) {
                Ok(re) => Some((word.clone(), re)),
                Err(e) => {
                    warn!(word, error = %e, "변형 매처 컴파일 실패, 부분 문자열 매칭만 적용");
                    None
                }
            })
            .collect();
        Self { words, matchers }
    }
}

/// 단어의 각 문자 사이에 구분 문자를 허용하는 패턴을 만듭니다.
/// 예: "邪教" → `(?i)邪[\s.\-_*]*教`
fn variant_pattern(word: &str) -> Result<Regex, regex_lite::Error> {
    let mut pattern = String::from("(?i)");
    for (i, c) in word.chars().enumerate() {
        if i > 0 {
            pattern.push_str(SEPARATOR_CLASS);
        }
        if r"\.^$*+?()[]{}|-".contains(c) {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    Regex::new(&pattern)
}

/// 민감 단어 필터
///
/// 매칭은 대소문자를 구분하지 않는 부분 문자열 검사와
/// 단어별 변형 매처의 합집합입니다.
pub struct SensitiveContentFilter {
    store: Arc<dyn KeyValueStore>,
    word_file: Option<PathBuf>,
    compiled: RwLock<Option<Arc<CompiledSet>>>,
}

impl SensitiveContentFilter {
    pub fn new(store: Arc<dyn KeyValueStore>, word_file: Option<PathBuf>) -> Self {
        Self {
            store,
            word_file,
            compiled: RwLock::new(None),
        }
    }

    /// 단어 집합을 미리 로드합니다. 로드된 단어 수를 반환합니다.
    pub async fn init(&self) -> usize {
        let set = self.word_set().await;
        info!(count = set.words.len(), "민감 단어 집합 로드 완료");
        set.words.len()
    }

    /// 캐시를 비워 다음 접근 시 집합을 다시 로드하게 합니다.
    pub async fn invalidate(&self) {
        if let Err(e) = self.store.delete(keys::SENSITIVE_WORDS).await {
            warn!(error = %e, "저장소 캐시 삭제 실패");
        }
        *self.compiled.write().await = None;
        debug!("민감 단어 캐시 무효화");
    }

    /// 텍스트에 민감 단어가 포함되어 있는지 검사합니다.
    pub async fn contains(&self, text: &str) -> bool {
        let set = self.word_set().await;
        let lowered = text.to_lowercase();
        set.words.iter().any(|w| lowered.contains(w.as_str()))
            || set.matchers.iter().any(|(_, re)| re.is_match(text))
    }

    /// 텍스트에서 발견된 모든 민감 단어를 반환합니다.
    pub async fn find_all(&self, text: &str) -> HashSet<String> {
        let set = self.word_set().await;
        let lowered = text.to_lowercase();
        let mut found = HashSet::new();
        for word in &set.words {
            if lowered.contains(word.as_str()) {
                found.insert(word.clone());
            }
        }
        for (word, re) in &set.matchers {
            if re.is_match(text) {
                found.insert(word.clone());
            }
        }
        found
    }

    /// 발견된 각 단어를 동일 길이의 대체 문자로 치환합니다.
    ///
    /// 단어별로 독립적인 패스를 수행하므로 겹치는 구간은
    /// 중복 치환될 수 있습니다 (방어 목적상 과잉 마스킹은 허용).
    pub async fn redact(&self, text: &str, replacement: char) -> String {
        let set = self.word_set().await;

        // 1차: 대소문자 무시 부분 문자열 치환
        let mut chars: Vec<char> = text.chars().collect();
        let mut lower: Vec<char> = chars
            .iter()
            .map(|c| c.to_lowercase().next().unwrap_or(*c))
            .collect();
        for word in &set.words {
            let w: Vec<char> = word.chars().collect();
            if w.is_empty() || w.len() > chars.len() {
                continue;
            }
            let mut i = 0;
            while i + w.len() <= chars.len() {
                if lower[i..i + w.len()] == w[..] {
                    for j in i..i + w.len() {
                        chars[j] = replacement;
                        lower[j] = replacement;
                    }
                    i += w.len();
                } else {
                    i += 1;
                }
            }
        }

        // 2차: 변형 매처가 잡은 구간 치환
        let mut out: String = chars.into_iter().collect();
        for (_, re) in &set.matchers {
            let mut redacted = String::with_capacity(out.len());
            let mut last = 0;
            for m in re.find_iter(&out) {
                redacted.push_str(&out[last..m.start()]);
                let span_len = out[m.start()..m.end()].chars().count();
                redacted.extend(std::iter::repeat(replacement).take(span_len));
                last = m.end();
            }
            if last == 0 {
                continue;
            }
            redacted.push_str(&out[last..]);
            out = redacted;
        }
        out
    }

    /// 검색 엔드포인트가 호출해야 하는 단일 진입점
    ///
    /// 거부 사유는 필터 내용을 노출하지 않도록 항상 일반적인 문구입니다.
    pub async fn is_search_allowed(&self, query: &str) -> (bool, Option<String>) {
        if self.contains(query).await {
            (
                false,
                Some("search query contains disallowed content".to_string()),
            )
        } else {
            (true, None)
        }
    }

    async fn word_set(&self) -> Arc<CompiledSet> {
        // 1. 저장소 캐시
        match self.store.get(keys::SENSITIVE_WORDS).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<String>>(&bytes) {
                Ok(words) => {
                    if let Some(cached) = self.compiled.read().await.as_ref() {
                        if cached.words == words {
                            return cached.clone();
                        }
                    }
                    let compiled = Arc::new(CompiledSet::compile(words));
                    *self.compiled.write().await = Some(compiled.clone());
                    return compiled;
                }
                Err(e) => warn!(error = %e, "캐시된 단어 집합 역직렬화 실패, 다시 로드"),
            },
            Ok(None) => {}
            Err(e) => warn!(error = %e, "단어 집합 캐시 조회 실패, 다시 로드"),
        }

        // 2. 단어 파일 → 3. 내장 기본값
        let words = self.load_words().await;

        // 캐시 기록은 best-effort
        match serde_json::to_vec(&words) {
            Ok(json) => {
                if let Err(e) = self
                    .store
                    .set(keys::SENSITIVE_WORDS, json.into(), CACHE_TTL)
                    .await
                {
                    warn!(error = %e, "단어 집합 캐시 기록 실패");
                }
            }
            Err(e) => warn!(error = %e, "단어 집합 직렬화 실패"),
        }

        let compiled = Arc::new(CompiledSet::compile(words));
        *self.compiled.write().await = Some(compiled.clone());
        compiled
    }

    async fn load_words(&self) -> Vec<String> {
        if let Some(path) = &self.word_file {
            match tokio::fs::read_to_string(path).await {
                Ok(content) => {
                    let words: Vec<String> = content
                        .lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty() && !line.starts_with('#'))
                        .map(|line| line.to_lowercase())
                        .collect();
                    if !words.is_empty() {
                        debug!(path = %path.display(), count = words.len(), "단어 파일 로드");
                        return words;
                    }
                    warn!(path = %path.display(), "단어 파일이 비어 있음, 내장 집합 사용");
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "단어 파일 읽기 실패, 내장 집합 사용")
                }
            }
        }
        DEFAULT_WORDS.iter().map(|w| w.to_lowercase()).collect()
    }
}
