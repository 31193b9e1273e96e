use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::StatusCode;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use api_gatekeeper::filter::{SensitiveContentFilter, WordFileWatcher};
use api_gatekeeper::logging::{init_logging, log_request, RequestLog};
use api_gatekeeper::middleware::{Pipeline, RequestContext};
use api_gatekeeper::settings::Settings;
use api_gatekeeper::store::{KeyValueStore, MemoryStore};

/// 파이프라인 통과 후 실행되는 데모 핸들러
///
/// 실제 배포에서는 이 자리에 업스트림 프록시나 애플리케이션
/// 라우터가 들어갑니다.
async fn demo_handler(
    req: api_gatekeeper::middleware::Request,
    ctx: RequestContext,
) -> api_gatekeeper::middleware::Response {
    let body = if let Some(params) = &ctx.search_params {
        serde_json::json!({
            "query": params.query,
            "page": params.page,
            "limit": params.limit,
            "results": [],
        })
    } else {
        serde_json::json!({
            "method": req.method().as_str(),
            "path": req.uri().path(),
            "ok": true,
        })
    };

    hyper::Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(Bytes::from(body.to_string()))
        .unwrap_or_else(|_| hyper::Response::new(Bytes::new()))
}

async fn serve_request(
    pipeline: Arc<Pipeline>,
    max_body_bytes: usize,
    remote_addr: SocketAddr,
    req: hyper::Request<Incoming>,
) -> Result<hyper::Response<Full<Bytes>>, std::convert::Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();

    // 본문을 경계에서 먼저 수집 (멱등성 캐시가 해시/저장에 사용)
    let body = match Limited::new(body, max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(error = %e, "요청 본문 수집 실패");
            let res = hyper::Response::builder()
                .status(StatusCode::PAYLOAD_TOO_LARGE)
                .header("content-type", "application/json")
                .body(Full::new(Bytes::from_static(
                    b"{\"code\":\"payload_too_large\",\"message\":\"request body too large\"}",
                )))
                .unwrap_or_else(|_| hyper::Response::new(Full::new(Bytes::new())));
            return Ok(res);
        }
    };

    let req = hyper::Request::from_parts(parts, body);
    let ctx = RequestContext::from_request(&req, Some(remote_addr));

    let mut log = RequestLog::new(ctx.request_id.clone());
    log.with_request(&req);
    log.client_ip = ctx.client_ip.clone();
    log.user_id = ctx.user_id.clone();

    let response = pipeline.process(req, ctx, demo_handler).await;

    log.with_response(response.status());
    log.duration_ms = started.elapsed().as_millis() as u64;
    log_request(&log);

    Ok(response.map(Full::new))
}

#[tokio::main]
async fn main() {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("설정 로드 실패: {}", e);
            std::process::exit(1);
        }
    };

    let _log_guard = init_logging(&settings.logging);
    info!("API Gatekeeper 시작");

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let word_file = settings.filter.word_file.clone().map(PathBuf::from);
    let filter = Arc::new(SensitiveContentFilter::new(store.clone(), word_file.clone()));
    let loaded = filter.init().await;
    info!(words = loaded, "민감어 필터 초기화 완료");

    // 단어 파일 변경 감시 (설정 시)
    if settings.filter.watch {
        if let Some(path) = word_file {
            let mut watcher = WordFileWatcher::new(path);
            match watcher.start() {
                Ok(()) => {
                    let filter = filter.clone();
                    tokio::spawn(async move {
                        watcher.run(filter).await;
                    });
                }
                Err(e) => {
                    warn!(error = %e, "단어 파일 감시 시작 실패, 감시 없이 계속");
                }
            }
        }
    }

    let pipeline = Arc::new(Pipeline::new(&settings, store, filter));
    let max_body_bytes = settings.server.max_body_bytes;

    let addr = format!("{}:{}", settings.server.bind_address, settings.server.http_port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => {
            info!(%addr, "리스닝 시작");
            listener
        }
        Err(e) => {
            error!(%addr, error = %e, "바인드 실패");
            std::process::exit(1);
        }
    };

    loop {
        match listener.accept().await {
            Ok((stream, remote_addr)) => {
                debug!(%remote_addr, "연결 수락");

                let pipeline = pipeline.clone();

                tokio::task::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req| {
                        serve_request(pipeline.clone(), max_body_bytes, remote_addr, req)
                    });
                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        debug!(error = %err, "연결 종료");
                    }
                });
            }
            Err(e) => {
                warn!(error = %e, "연결 수락 실패");
            }
        }
    }
}
