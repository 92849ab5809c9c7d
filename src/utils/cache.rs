use std::path::{Path, PathBuf};
use std::sync::Arc;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;

/// 本地键值缓存
///
/// 所有键值保存为一个 JSON 对象；设置了路径时每次写入都会整体落盘，
/// 读取只走内存。仅作为远端数据不可用时的陈旧读回退。
#[derive(Debug, Clone)]
pub struct LocalCache {
    data: Arc<DashMap<String, Value>>,
    path: Option<PathBuf>,
}

impl LocalCache {
    /// 纯内存缓存
    pub fn in_memory() -> Self {
        Self {
            data: Arc::new(DashMap::new()),
            path: None,
        }
    }

    /// 打开文件缓存，文件不存在或损坏时从空缓存开始
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = DashMap::new();

        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<serde_json::Map<String, Value>>(&bytes) {
                Ok(map) => {
                    for (key, value) in map {
                        data.insert(key, value);
                    }
                    debug!("Loaded {} cache entries from {}", data.len(), path.display());
                }
                Err(e) => {
                    warn!("Ignoring unreadable cache file {}: {}", path.display(), e);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache file at {}, starting empty", path.display());
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            data: Arc::new(data),
            path: Some(path),
        })
    }

    /// 获取缓存项；反序列化失败视为未命中
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.data.get(key)?.value().clone();
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Discarding malformed cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// 设置缓存项并落盘
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.data.insert(key.to_string(), serde_json::to_value(value)?);
        self.flush().await
    }

    pub async fn delete(&self, key: &str) -> Result<bool> {
        let removed = self.data.remove(key).is_some();
        if removed {
            self.flush().await?;
        }
        Ok(removed)
    }

    pub async fn clear(&self) -> Result<()> {
        self.data.clear();
        self.flush().await
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn exists(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    async fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let snapshot: serde_json::Map<String, Value> = self
            .data
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let bytes = serde_json::to_vec(&Value::Object(snapshot))?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    /// 钱包缓存键
    pub fn wallet_key(user_id: &str) -> String {
        format!("wallet:{}", user_id)
    }
}

impl Default for LocalCache {
    fn default() -> Self {
        Self::in_memory()
    }
}
