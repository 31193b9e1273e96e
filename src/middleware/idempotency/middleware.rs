use std::collections::HashMap;
use std::sync::Arc;
use bytes::Bytes;
use async_trait::async_trait;
use hyper::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::middleware::{
    Middleware, MiddlewareError, Request, RequestAction, RequestContext, Response,
};
use crate::store::{keys, KeyValueStore};
use super::config::IdempotencyConfig;

/// 재생 여부 표시 헤더
pub const REPLAYED_HEADER: &str = "x-idempotency-replayed";
/// 원래 응답이 캡처된 시각
pub const TIMESTAMP_HEADER: &str = "x-idempotency-timestamp";
/// 클라이언트가 제공하는 멱등성 토큰 헤더
pub const TOKEN_HEADER: &str = "idempotency-key";

/// 캐시/재생 시 제외되는 헤더
const EXCLUDED_HEADERS: &[&str] = &["content-length", "content-type", "set-cookie"];

/// before 단계가 after 단계로 전달하는 무장(arm) 상태
#[derive(Debug, Clone)]
pub struct IdempotencyState {
    pub key: String,
}

/// 저장소에 기록되는 캐시 항목
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    status: u16,
    body: Vec<u8>,
    headers: HashMap<String, String>,
    captured_at: String,
}

/// 멱등성 재생 캐시 미들웨어
///
/// 미스 상태의 동시 중복 요청에 대한 단일 실행(single-flight) 보장은
/// 없습니다. 두 요청 모두 핸들러에 도달할 수 있으며, 마지막 기록이
/// 남습니다.
pub struct IdempotencyMiddleware {
    config: IdempotencyConfig,
    store: Arc<dyn KeyValueStore>,
}

impl IdempotencyMiddleware {
    pub fn new(config: IdempotencyConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self { config, store }
    }

    /// 캐시 적용 대상 여부: 쓰기 메서드 + API 경로 + JSON 본문
    fn applies(&self, req: &Request) -> bool {
        matches!(*req.method(), Method::POST | Method::PUT | Method::PATCH)
            && req.uri().path().starts_with(&self.config.api_prefix)
            && req
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.contains("application/json"))
                .unwrap_or(false)
    }

    /// 결정적 캐시 키 유도
    ///
    /// 본문 해시는 Content-Length가 명시되어 있고 상한 이하일 때만
    /// 계산합니다 (대용량/길이 미상 본문의 해싱 비용 회피).
    fn derive_key(&self, req: &Request, ctx: &RequestContext, token: &str) -> String {
        let user = ctx.user_id.as_deref().unwrap_or("anonymous");
        let path = req.uri().path().replace(':', "_");

        let body_hash = req
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|len| *len <= self.config.max_body_bytes)
            .map(|_| {
                let digest = format!("{:x}", md5::compute(req.body().as_ref()));
                digest[..8].to_string()
            })
            .unwrap_or_default();

        [
            keys::IDEMPOTENCY,
            req.method().as_str(),
            &path,
            user,
            token,
            &body_hash,
        ]
        .join(":")
    }

    /// 캐시 항목으로부터 재생 응답을 복원합니다.
    fn replay_response(entry: CacheEntry) -> Option<Response> {
        let status = StatusCode::from_u16(entry.status).ok()?;
        let mut res = hyper::Response::builder()
            .status(status)
            .body(Bytes::from(entry.body))
            .ok()?;

        let headers = res.headers_mut();
        for (name, value) in &entry.headers {
            if EXCLUDED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                continue;
            }
            if let (Ok(name), Ok(value)) = (
                hyper::header::HeaderName::from_bytes(name.as_bytes()),
                hyper::header::HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }

        headers.insert(REPLAYED_HEADER, hyper::header::HeaderValue::from_static("true"));
        if let Ok(ts) = hyper::header::HeaderValue::from_str(&entry.captured_at) {
            headers.insert(TIMESTAMP_HEADER, ts);
        }
        Some(res)
    }

    /// 응답을 캐시 항목으로 직렬화해 기록합니다. 실패는 로그만 남깁니다.
    async fn persist(&self, key: &str, res: &Response) {
        let declared_json = res
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);
        // 선언된 타입이 없어도 본문이 JSON으로 해석되면 수용
        if !declared_json && serde_json::from_slice::<serde_json::Value>(res.body()).is_err() {
            debug!(key, "JSON이 아닌 응답은 캐시하지 않음");
            return;
        }

        let headers: HashMap<String, String> = res
            .headers()
            .iter()
            .filter(|(name, _)| !EXCLUDED_HEADERS.contains(&name.as_str()))
            .filter(|(name, _)| name.as_str() != REPLAYED_HEADER)
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let captured_at = match OffsetDateTime::now_utc().format(&Rfc3339) {
            Ok(ts) => ts,
            Err(e) => {
                warn!(error = %e, "캡처 시각 포맷 실패, 캐시 기록 생략");
                return;
            }
        };

        let entry = CacheEntry {
            status: res.status().as_u16(),
            body: res.body().to_vec(),
            headers,
            captured_at,
        };

        match serde_json::to_vec(&entry) {
            Ok(encoded) => {
                if let Err(e) = self
                    .store
                    .set(key, encoded.into(), self.config.ttl())
                    .await
                {
                    warn!(key, error = %e, "멱등성 캐시 기록 실패");
                } else {
                    debug!(key, "멱등성 캐시 기록");
                }
            }
            Err(e) => warn!(key, error = %e, "캐시 항목 직렬화 실패"),
        }
    }
}

#[async_trait]
impl Middleware for IdempotencyMiddleware {
    fn name(&self) -> &str {
        "idempotency"
    }

    async fn handle_request(
        &self,
        req: Request,
        ctx: &mut RequestContext,
    ) -> Result<RequestAction, MiddlewareError> {
        if !self.applies(&req) {
            return Ok(RequestAction::Continue(req));
        }
        let Some(token) = req
            .headers()
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(String::from)
        else {
            return Ok(RequestAction::Continue(req));
        };

        let key = self.derive_key(&req, ctx, &token);

        match self.store.get(&key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<CacheEntry>(&bytes) {
                Ok(entry) => {
                    if let Some(res) = Self::replay_response(entry) {
                        debug!(key, "캐시 적중, 응답 재생");
                        return Ok(RequestAction::ShortCircuit(res));
                    }
                    warn!(key, "캐시 항목 복원 실패, 미스로 처리");
                    ctx.idempotency = Some(IdempotencyState { key });
                }
                Err(e) => {
                    warn!(key, error = %e, "캐시 항목 역직렬화 실패, 미스로 처리");
                    ctx.idempotency = Some(IdempotencyState { key });
                }
            },
            Ok(None) => {
                debug!(key, "캐시 미스, after 단계 무장");
                ctx.idempotency = Some(IdempotencyState { key });
            }
            // 저장소 장애: 캐싱을 건너뛰고 요청은 그대로 진행
            Err(e) => warn!(key, error = %e, "캐시 조회 실패, 캐싱 생략"),
        }

        Ok(RequestAction::Continue(req))
    }

    async fn handle_response(
        &self,
        mut res: Response,
        ctx: &RequestContext,
    ) -> Result<Response, MiddlewareError> {
        let Some(state) = &ctx.idempotency else {
            return Ok(res);
        };

        // 무장된 요청의 신선한 응답임을 표시
        res.headers_mut().insert(
            REPLAYED_HEADER,
            hyper::header::HeaderValue::from_static("false"),
        );

        if !res.status().is_success() {
            debug!(key = state.key, status = %res.status(), "성공 응답이 아니므로 캐시하지 않음");
            return Ok(res);
        }
        if res.body().len() > self.config.max_body_bytes {
            debug!(key = state.key, size = res.body().len(), "본문 크기 초과, 캐시하지 않음");
            return Ok(res);
        }

        self.persist(&state.key, &res).await;
        Ok(res)
    }
}
