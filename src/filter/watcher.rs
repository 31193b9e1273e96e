use std::path::PathBuf;
use std::sync::Arc;
use notify::{Event, RecommendedWatcher, RecursiveMode, Result as NotifyResult, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::{FilterError, SensitiveContentFilter};

/// 단어 파일 감시자
///
/// 단어 파일이 수정되면 필터 캐시를 무효화하여 다음 접근 시
/// 새 집합이 로드되게 합니다.
pub struct WordFileWatcher {
    path: PathBuf,
    event_tx: mpsc::Sender<()>,
    event_rx: mpsc::Receiver<()>,
    watcher: Option<RecommendedWatcher>,
}

impl WordFileWatcher {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        let (event_tx, event_rx) = mpsc::channel(16);
        Self {
            path: path.into(),
            event_tx,
            event_rx,
            watcher: None,
        }
    }

    #[cfg(test)]
    pub fn get_sender(&self) -> mpsc::Sender<()> {
        self.event_tx.clone()
    }

    /// 파일 감시를 시작합니다.
    pub fn start(&mut self) -> Result<(), FilterError> {
        let event_tx = self.event_tx.clone();

        let mut watcher: RecommendedWatcher =
            notify::recommended_watcher(move |res: NotifyResult<Event>| match res {
                Ok(event) => {
                    use notify::EventKind::*;
                    match event.kind {
                        Modify(_) | Create(_) => {
                            debug!("단어 파일 변경 감지");
                            let _ = event_tx.blocking_send(());
                        }
                        _ => {}
                    }
                }
                Err(e) => error!(error = %e, "단어 파일 감시 오류"),
            })
            .map_err(|e| FilterError::Watch(e.to_string()))?;

        watcher
            .watch(&self.path, RecursiveMode::NonRecursive)
            .map_err(|e| FilterError::Watch(e.to_string()))?;

        info!(path = %self.path.display(), "단어 파일 감시 시작");
        self.watcher = Some(watcher);
        Ok(())
    }

    /// 변경 이벤트를 소비하며 필터를 무효화하는 루프를 실행합니다.
    ///
    /// 루프는 모든 송신자가 닫힐 때(감시자 중지)까지 돕니다.
    pub async fn run(self, filter: Arc<SensitiveContentFilter>) {
        let WordFileWatcher {
            mut event_rx,
            event_tx,
            watcher,
            path: _,
        } = self;
        // notify 콜백이 송신자를 들고 있으므로 감시자가 살아있는 동안 루프 유지
        let _watcher = watcher;
        drop(event_tx);

        while event_rx.recv().await.is_some() {
            info!("단어 파일 변경, 필터 캐시 무효화");
            filter.invalidate().await;
            let count = filter.init().await;
            debug!(count, "단어 집합 다시 로드됨");
        }
    }
}
