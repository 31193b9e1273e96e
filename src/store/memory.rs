use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use super::{KeyValueStore, StoreError};

/// 저장된 값: 바이트 열 또는 카운터
#[derive(Debug, Clone)]
enum Stored {
    Bytes(Bytes),
    Counter(u64),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Stored,
    expires_at: Instant,
}

impl Entry {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// 메모리 기반 TTL 저장소
///
/// 만료는 접근 시점에 지연 처리됩니다. tokio 시계를 사용하므로
/// 테스트에서 `start_paused` + `tokio::time::advance`로 윈도우 만료를
/// 시뮬레이션할 수 있습니다.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 만료된 항목 수를 포함하지 않는 현재 항목 수 (테스트/진단용)
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|e| !e.expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.expired(now) => {
                    return Ok(match &entry.value {
                        Stored::Bytes(b) => Some(b.clone()),
                        Stored::Counter(n) => Some(Bytes::from(n.to_string())),
                    });
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // 만료된 항목 제거
        let mut entries = self.entries.write().await;
        if entries.get(key).map(|e| e.expired(now)).unwrap_or(false) {
            debug!(key, "만료된 항목 제거");
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: Stored::Bytes(value),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn incr(&self, key: &str, ttl: Duration) -> Result<u64, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        match entries.get_mut(key) {
            Some(entry) if !entry.expired(now) => match &mut entry.value {
                Stored::Counter(n) => {
                    *n += 1;
                    Ok(*n)
                }
                Stored::Bytes(_) => Err(StoreError::NotACounter {
                    key: key.to_string(),
                }),
            },
            // 없거나 만료됨: 새 윈도우 시작
            _ => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: Stored::Counter(1),
                        expires_at: now + ttl,
                    },
                );
                Ok(1)
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}
