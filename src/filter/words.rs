/// 내장 기본 단어 집합
///
/// 단어 파일과 저장소 캐시가 모두 실패했을 때 사용되는 최소 집합입니다.
/// 빈 집합으로 열리는 것보다 항상 더 엄격한 쪽으로 기울어야 하므로,
/// 모든 로드 실패는 이 집합으로 귀결됩니다.
pub const DEFAULT_WORDS: &[&str] = &[
    // 정치 선동
    "颠覆国家",
    "反动宣传",
    // 폭력
    "暴力袭击",
    "恐怖袭击",
    "制造炸弹",
    // 사기/도박
    "诈骗",
    "赌博",
    "博彩",
    "办假证",
    // 음란물
    "色情",
    "淫秽",
    // 미신/사교
    "邪教",
    "封建迷信",
    // 우회 도구
    "翻墙软件",
    "梯子代理",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_words_are_nonempty_and_unique() {
        assert!(!DEFAULT_WORDS.is_empty());
        let mut sorted: Vec<_> = DEFAULT_WORDS.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), DEFAULT_WORDS.len());
    }
}
