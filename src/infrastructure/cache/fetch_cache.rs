// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::PipelineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// 缓存条目
///
/// 写入后不再修改；同键并发写入为last-write-wins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub status_code: u16,
    pub content_type: String,
    pub fetched_at: DateTime<Utc>,

    /// 响应体，磁盘上以base64存储
    #[serde(with = "body_base64")]
    pub body: Vec<u8>,
}

/// 抓取缓存
///
/// 按键内容寻址的磁盘存储：每个键一个JSON文件，
/// 通过同目录临时文件+rename实现原子替换，不同键之间互不阻塞
pub struct FetchCache {
    root: PathBuf,

    /// 条目最大年龄；None表示条目永不过期
    max_age: Option<Duration>,
}

impl FetchCache {
    /// 创建抓取缓存，缓存根目录不存在时自动创建
    ///
    /// # 参数
    ///
    /// * `root` - 缓存根目录
    /// * `max_age` - 条目最大年龄，超过视为未命中
    pub async fn new(
        root: impl Into<PathBuf>,
        max_age: Option<Duration>,
    ) -> Result<Self, PipelineError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| PipelineError::CacheIo {
                path: root.display().to_string(),
                source: e,
            })?;
        Ok(Self { root, max_age })
    }

    /// 计算缓存键
    ///
    /// (规范化URL, 渲染模式)的纯函数：相同输入永远得到相同键
    pub fn cache_key(normalized_url: &str, render_js: bool) -> String {
        let mut hasher = Sha256::new();
        hasher.update(normalized_url.as_bytes());
        hasher.update(b"\n");
        hasher.update(if render_js {
            &b"render"[..]
        } else {
            &b"static"[..]
        });
        hex::encode(hasher.finalize())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    /// 读取缓存条目
    ///
    /// 不存在、过期或损坏的条目按未命中处理；
    /// 其它I/O错误是致命的
    pub async fn get(&self, key: &str) -> Result<Option<CacheEntry>, PipelineError> {
        let path = self.entry_path(key);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PipelineError::CacheIo {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("丢弃损坏的缓存条目 {}: {}", path.display(), e);
                return Ok(None);
            }
        };

        if let Some(max_age) = self.max_age {
            let age = Utc::now().signed_duration_since(entry.fetched_at);
            if age.num_seconds() < 0 || age.num_seconds() as u64 >= max_age.as_secs() {
                debug!("缓存条目已过期 {}", path.display());
                return Ok(None);
            }
        }

        Ok(Some(entry))
    }

    /// 写入缓存条目（原子替换）
    pub async fn put(&self, key: &str, entry: &CacheEntry) -> Result<(), PipelineError> {
        let path = self.entry_path(key);
        let tmp = self.root.join(format!("{}.{}.tmp", key, Uuid::new_v4()));

        let bytes = serde_json::to_vec(entry).map_err(|e| PipelineError::CacheIo {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;

        if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
            return Err(PipelineError::CacheIo {
                path: tmp.display().to_string(),
                source: e,
            });
        }

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(PipelineError::CacheIo {
                path: path.display().to_string(),
                source: e,
            });
        }

        Ok(())
    }

    /// 缓存根目录
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// body字段的base64磁盘编码
mod body_base64 {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
