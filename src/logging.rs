use tracing::{info, warn, error, Level, span};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::settings::logging::{LogFormat, LogOutput};
use crate::settings::LogSettings;

/// 로깅 초기화
///
/// 파일 출력을 사용하는 경우 반환된 가드를 프로세스 종료까지
/// 유지해야 버퍼링된 로그가 유실되지 않습니다.
pub fn init_logging(settings: &LogSettings) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env()
        .add_directive(settings.level.into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    match &settings.output {
        LogOutput::Stdout => {
            match settings.format {
                LogFormat::Json => builder.json().init(),
                LogFormat::Text => builder.init(),
            }
            None
        }
        LogOutput::File(path) => {
            let (dir, file) = split_log_path(path);
            let appender = tracing_appender::rolling::daily(dir, file);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let builder = builder.with_writer(writer).with_ansi(false);
            match settings.format {
                LogFormat::Json => builder.json().init(),
                LogFormat::Text => builder.init(),
            }
            Some(guard)
        }
    }
}

fn split_log_path(path: &str) -> (String, String) {
    let p = std::path::Path::new(path);
    let dir = p
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .map(|d| d.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string());
    let file = p
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| "gatekeeper.log".to_string());
    (dir, file)
}

#[derive(Debug)]
pub struct RequestLog {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub client_ip: String,
    pub user_id: Option<String>,
    pub status_code: u16,
    pub duration_ms: u64,
    pub short_circuited_by: Option<String>,
    pub error: Option<String>,
}

impl RequestLog {
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            method: String::new(),
            path: String::new(),
            client_ip: String::new(),
            user_id: None,
            status_code: 0,
            duration_ms: 0,
            short_circuited_by: None,
            error: None,
        }
    }

    pub fn with_request<B>(&mut self, req: &hyper::Request<B>) {
        self.method = req.method().to_string();
        self.path = req.uri().path().to_string();
    }

    pub fn with_response(&mut self, status: hyper::StatusCode) {
        self.status_code = status.as_u16();
    }

    pub fn with_error(&mut self, error: impl std::fmt::Display) {
        self.error = Some(error.to_string());
    }
}

pub fn log_request(log: &RequestLog) {
    let level = if log.error.is_some() {
        Level::ERROR
    } else if log.status_code >= 400 {
        Level::WARN
    } else {
        Level::INFO
    };

    macro_rules! request_span {
        ($lvl:expr) => {
            span!(
                $lvl,
                "request",
                request_id = %log.request_id,
                method = %log.method,
                path = %log.path,
                client_ip = %log.client_ip,
                user_id = ?log.user_id,
                status = %log.status_code,
                duration_ms = %log.duration_ms
            )
        };
    }
    let span = match level {
        Level::ERROR => request_span!(Level::ERROR),
        Level::WARN => request_span!(Level::WARN),
        _ => request_span!(Level::INFO),
    };
    let _enter = span.enter();

    match level {
        Level::ERROR => error!(
            error = ?log.error,
            "Request failed"
        ),
        Level::WARN => warn!(
            short_circuited_by = ?log.short_circuited_by,
            "Request completed with warning"
        ),
        _ => info!("Request completed successfully"),
    }
}
