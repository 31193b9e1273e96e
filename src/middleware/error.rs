use crate::store::StoreError;
use crate::validation::ValidationError;

/// 파이프라인 오류 분류
///
/// 검증 거부와 속도 제한은 요청을 종결시키는 오류이고,
/// 저장소 오류는 각 컴포넌트가 내부에서 복구한 뒤 로그만 남깁니다.
/// 클라이언트에는 내부 오류 내용이 절대 노출되지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum MiddlewareError {
    #[error("요청 검증 거부 ({field}): {reason}")]
    ValidationRejected {
        field: &'static str,
        reason: String,
    },

    #[error("속도 제한 초과: {scope}")]
    RateLimited { scope: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("상위 의존성 비정상: {code}")]
    CircuitOpen { code: String },

    #[error("처리 오류: {0}")]
    Processing(String),
}

impl From<ValidationError> for MiddlewareError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationRejected {
            field: err.field,
            reason: err.reason,
        }
    }
}
