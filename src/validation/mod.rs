//! 검색 요청 파라미터 검증
//!
//! 검색 엔드포인트로 들어오는 쿼리 파라미터를 검증합니다.
//! 이 모듈은 HTTP 타입을 전혀 다루지 않으며, 검증된 값 또는
//! 타입화된 거부만 반환합니다. 거부를 응답으로 변환하는 것은
//! 호출자(미들웨어)의 몫입니다.

mod patterns;

pub use patterns::validate_query;

use serde::{Deserialize, Serialize};

/// 최대 검색어 길이
pub const MAX_QUERY_LEN: usize = 200;
/// 최대 채널명 길이
pub const MAX_CHANNEL_LEN: usize = 50;

pub const MAX_PAGE: u32 = 1000;
pub const MAX_LIMIT: u32 = 50;
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// 검증 거부
///
/// field는 거부된 파라미터 이름, reason은 사람이 읽을 수 있는 사유입니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// 정렬 기준
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Relevance,
    Time,
    Hot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub key: SortKey,
    pub descending: bool,
}

pub fn validate_sort(value: &str) -> Result<Option<Sort>, ValidationError> {
    if value.is_empty() {
        return Ok(None);
    }
    let (descending, name) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let key = match name {
        "relevance" => SortKey::Relevance,
        "time" => SortKey::Time,
        "hot" => SortKey::Hot,
        _ => {
            return Err(ValidationError::new(
                "sort",
                format!("unsupported sort key: {}", value),
            ))
        }
    };
    Ok(Some(Sort { key, descending }))
}

/// 허용되는 기간 토큰
const SINCE_TOKENS: &[&str] = &[
    "1h", "3h", "6h", "12h", "24h", "1d", "3d", "7d", "14d", "30d", "90d",
];

pub fn validate_since(value: &str) -> Result<Option<String>, ValidationError> {
    if value.is_empty() {
        return Ok(None);
    }
    if SINCE_TOKENS.contains(&value) {
        Ok(Some(value.to_string()))
    } else {
        Err(ValidationError::new(
            "since",
            format!("unsupported time window: {}", value),
        ))
    }
}

/// 페이지네이션 검증
///
/// 값이 없으면 기본값(1, 10)을 적용하지만, 숫자가 아닌 입력은
/// 기본값으로 보정하지 않고 거부합니다.
pub fn validate_pagination(
    page: Option<&str>,
    limit: Option<&str>,
) -> Result<(u32, u32), ValidationError> {
    let page = match page {
        None | Some("") => DEFAULT_PAGE,
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| ValidationError::new("page", format!("not a number: {}", raw)))?,
    };
    let limit = match limit {
        None | Some("") => DEFAULT_LIMIT,
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| ValidationError::new("limit", format!("not a number: {}", raw)))?,
    };

    if !(1..=MAX_PAGE).contains(&page) {
        return Err(ValidationError::new(
            "page",
            format!("out of range 1..={}: {}", MAX_PAGE, page),
        ));
    }
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ValidationError::new(
            "limit",
            format!("out of range 1..={}: {}", MAX_LIMIT, limit),
        ));
    }
    Ok((page, limit))
}

/// 채널명 검증: 영숫자/언더스코어/하이픈/CJK 통합 한자만 허용
pub fn validate_channel(value: &str) -> Result<Option<String>, ValidationError> {
    if value.is_empty() {
        return Ok(None);
    }
    if value.chars().count() > MAX_CHANNEL_LEN {
        return Err(ValidationError::new(
            "channel",
            format!("exceeds {} characters", MAX_CHANNEL_LEN),
        ));
    }
    let allowed = |c: char| {
        c.is_ascii_alphanumeric()
            || c == '_'
            || c == '-'
            || ('\u{4e00}'..='\u{9fa5}').contains(&c)
    };
    if !value.chars().all(allowed) {
        return Err(ValidationError::new("channel", "contains disallowed characters"));
    }
    Ok(Some(value.to_string()))
}

/// 검증 완료된 검색 파라미터
///
/// 전체가 검증을 통과해야만 생성됩니다. 부분 적용은 없습니다.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSearchParams {
    /// HTML 이스케이프 및 공백 정규화가 적용된 검색어
    pub query: String,
    pub page: u32,
    pub limit: u32,
    pub sort: Option<Sort>,
    pub since: Option<String>,
    pub channel: Option<String>,
}

impl ValidatedSearchParams {
    /// 쿼리 문자열 쌍으로부터 전체 파라미터를 검증합니다.
    pub fn from_query(pairs: &[(String, String)]) -> Result<Self, ValidationError> {
        let find = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };

        let query = validate_query(find("q").unwrap_or(""))?;
        let (page, limit) = validate_pagination(find("page"), find("limit"))?;
        let sort = validate_sort(find("sort").unwrap_or(""))?;
        let since = validate_since(find("since").unwrap_or(""))?;
        let channel = validate_channel(find("channel").unwrap_or(""))?;

        Ok(Self {
            query,
            page,
            limit,
            sort,
            since,
            channel,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        assert_eq!(validate_pagination(None, None).unwrap(), (1, 10));
        assert_eq!(validate_pagination(Some(""), Some("")).unwrap(), (1, 10));
    }

    #[test]
    fn test_pagination_bounds() {
        assert_eq!(validate_pagination(Some("1"), Some("50")).unwrap(), (1, 50));
        assert_eq!(
            validate_pagination(Some("1000"), Some("1")).unwrap(),
            (1000, 1)
        );
        assert!(validate_pagination(Some("0"), None).is_err());
        assert!(validate_pagination(Some("1001"), None).is_err());
        assert!(validate_pagination(None, Some("51")).is_err());
        assert!(validate_pagination(None, Some("0")).is_err());
    }

    #[test]
    fn test_pagination_rejects_non_numeric() {
        // 숫자가 아닌 입력은 기본값으로 보정하지 않음
        assert!(validate_pagination(Some("abc"), None).is_err());
        assert!(validate_pagination(None, Some("-1")).is_err());
        assert!(validate_pagination(Some("1.5"), None).is_err());
    }

    #[test]
    fn test_sort_values() {
        assert_eq!(validate_sort("").unwrap(), None);
        assert_eq!(
            validate_sort("hot").unwrap(),
            Some(Sort {
                key: SortKey::Hot,
                descending: false
            })
        );
        assert_eq!(
            validate_sort("-time").unwrap(),
            Some(Sort {
                key: SortKey::Time,
                descending: true
            })
        );
        assert!(validate_sort("random").is_err());
        assert!(validate_sort("-popular").is_err());
    }

    #[test]
    fn test_since_tokens() {
        assert_eq!(validate_since("").unwrap(), None);
        assert_eq!(validate_since("24h").unwrap(), Some("24h".to_string()));
        assert_eq!(validate_since("7d").unwrap(), Some("7d".to_string()));
        assert!(validate_since("2h").is_err());
        assert!(validate_since("1y").is_err());
    }

    #[test]
    fn test_channel() {
        assert_eq!(validate_channel("").unwrap(), None);
        assert_eq!(
            validate_channel("tech-news_01").unwrap(),
            Some("tech-news_01".to_string())
        );
        assert_eq!(
            validate_channel("科技频道").unwrap(),
            Some("科技频道".to_string())
        );
        assert!(validate_channel("bad channel").is_err());
        assert!(validate_channel("bad/channel").is_err());
        assert!(validate_channel(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_from_query_all_or_nothing() {
        let pairs = vec![
            ("q".to_string(), "人工智能".to_string()),
            ("page".to_string(), "2".to_string()),
            ("limit".to_string(), "20".to_string()),
            ("sort".to_string(), "-hot".to_string()),
        ];
        let params = ValidatedSearchParams::from_query(&pairs).unwrap();
        assert_eq!(params.query, "人工智能");
        assert_eq!(params.page, 2);
        assert_eq!(params.limit, 20);

        // 하나라도 실패하면 전체 거부
        let pairs = vec![
            ("q".to_string(), "人工智能".to_string()),
            ("page".to_string(), "0".to_string()),
        ];
        assert!(ValidatedSearchParams::from_query(&pairs).is_err());
    }
}
