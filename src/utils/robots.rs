// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use lru::LruCache;
use robotstxt::DefaultMatcher;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use url::Url;

/// 缓存的robots.txt内容
#[derive(Clone)]
struct CachedRobots {
    /// 内容
    content: String,

    /// 过期时间
    expires_at: Instant,
}

/// Robots.txt检查器
///
/// 每个host的robots.txt在一次运行内只抓取一次，结果进入内存LRU缓存。
/// 抓取失败时默认放行
pub struct RobotsChecker {
    client: reqwest::Client,
    memory_cache: Mutex<LruCache<String, CachedRobots>>,
    cache_ttl: Duration,
}

impl Default for RobotsChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl RobotsChecker {
    /// 创建新的Robots检查器实例
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            memory_cache: Mutex::new(LruCache::new(NonZeroUsize::new(512).unwrap())),
            cache_ttl: Duration::from_secs(3600),
        }
    }

    /// 检查URL是否被允许访问
    pub async fn is_allowed(&self, url_str: &str, user_agent: &str) -> bool {
        let content = match self.get_robots_content(url_str).await {
            Some(content) => content,
            // 无法定位host等情况下放行，由后续抓取自行失败
            None => return true,
        };
        allowed_by(&content, user_agent, url_str)
    }

    /// 获取robots.txt内容（带缓存）
    async fn get_robots_content(&self, url_str: &str) -> Option<String> {
        let url = Url::parse(url_str).ok()?;
        let host = url.host_str()?;
        let scheme = url.scheme();
        let robots_url = match url.port() {
            Some(port) => format!("{}://{}:{}/robots.txt", scheme, host, port),
            None => format!("{}://{}/robots.txt", scheme, host),
        };

        // 1. 查内存缓存
        {
            let mut cache = self.memory_cache.lock().unwrap();
            if let Some(cached) = cache.get(&robots_url) {
                if cached.expires_at > Instant::now() {
                    return Some(cached.content.clone());
                }
                cache.pop(&robots_url);
            }
        }

        // 2. 抓取robots.txt
        let response = self
            .client
            .get(&robots_url)
            .header("User-Agent", crate::engines::traits::USER_AGENT)
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        let content = match response {
            Ok(resp) if resp.status().is_success() => resp.text().await.unwrap_or_default(),
            // 404或其它状态视为没有robots.txt，全部放行
            Ok(_) => String::new(),
            Err(e) => {
                tracing::warn!("抓取robots.txt失败 {}: {}", robots_url, e);
                String::new()
            }
        };

        // 3. 更新内存缓存
        {
            let mut cache = self.memory_cache.lock().unwrap();
            cache.put(
                robots_url,
                CachedRobots {
                    content: content.clone(),
                    expires_at: Instant::now() + self.cache_ttl,
                },
            );
        }

        Some(content)
    }
}

/// 根据robots.txt内容判断URL是否允许抓取
pub fn allowed_by(robots_content: &str, user_agent: &str, url: &str) -> bool {
    let mut matcher = DefaultMatcher::default();
    matcher.one_agent_allowed_by_robots(robots_content, user_agent, url)
}
