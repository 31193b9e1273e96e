use std::sync::OnceLock;
use regex_lite::Regex;

use super::{ValidationError, MAX_QUERY_LEN};

/// SQL 주입 의심 패턴
fn sql_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)\b(select|insert|update|delete|drop|create|alter|union|exec)\b",
            r"(?i)\b(or|and)\b\s+\d+\s*=\s*\d+",
            r#"[;'"\\]"#,
            r"--|/\*|\*/|#",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("내장 패턴은 항상 유효함"))
        .collect()
    })
}

/// XSS 의심 패턴
fn xss_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)<\s*script",
            r"(?i)\bon[a-z]+\s*=",
            r"(?i)javascript\s*:",
            r"(?i)<\s*(iframe|object|embed)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("내장 패턴은 항상 유효함"))
        .collect()
    })
}

fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// 검색어 검증
///
/// 빈 문자열, 길이 초과, SQL/XSS 패턴을 거부합니다.
/// 통과한 검색어는 HTML 이스케이프 후 연속 공백이 하나로 정규화됩니다.
pub fn validate_query(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("q", "query must not be empty"));
    }
    if trimmed.chars().count() > MAX_QUERY_LEN {
        return Err(ValidationError::new(
            "q",
            format!("exceeds {} characters", MAX_QUERY_LEN),
        ));
    }
    if sql_patterns().iter().any(|p| p.is_match(trimmed)) {
        return Err(ValidationError::new("q", "contains disallowed characters or patterns"));
    }
    if xss_patterns().iter().any(|p| p.is_match(trimmed)) {
        return Err(ValidationError::new("q", "contains disallowed characters or patterns"));
    }

    let escaped = html_escape(trimmed);
    Ok(escaped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty() {
        assert!(validate_query("").is_err());
        assert!(validate_query("   ").is_err());
    }

    #[test]
    fn test_rejects_over_length() {
        assert!(validate_query(&"가".repeat(201)).is_err());
        assert!(validate_query(&"a".repeat(200)).is_ok());
    }

    #[test]
    fn test_rejects_sql_injection() {
        assert!(validate_query("'; DROP TABLE users; --").is_err());
        assert!(validate_query("1 OR 1=1").is_err());
        assert!(validate_query("UNION SELECT password FROM auth").is_err());
        assert!(validate_query("name; delete from t").is_err());
    }

    #[test]
    fn test_rejects_xss() {
        assert!(validate_query("<script>alert(1)</script>").is_err());
        assert!(validate_query("<ScRiPt src=x>").is_err());
        assert!(validate_query("a onerror=alert(1)").is_err());
        assert!(validate_query("javascript:void(0)").is_err());
        assert!(validate_query("<iframe src=x>").is_err());
    }

    #[test]
    fn test_accepts_and_escapes() {
        assert_eq!(validate_query("人工智能").unwrap(), "人工智能");
        assert_eq!(validate_query("rust   async  runtime").unwrap(), "rust async runtime");
        assert_eq!(validate_query("a < b").unwrap(), "a &lt; b");
    }

    #[test]
    fn test_keyword_inside_word_is_allowed() {
        // \b 경계 덕분에 단어 내부의 키워드는 통과
        assert!(validate_query("selection process").is_ok());
        assert!(validate_query("altered state").is_ok());
    }
}
