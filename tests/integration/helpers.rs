// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use curatrs::config::settings::Settings;
use curatrs::engines::reqwest_engine::ReqwestEngine;
use curatrs::engines::router::EngineRouter;
use curatrs::engines::traits::FetchEngine;
use curatrs::infrastructure::cache::fetch_cache::FetchCache;
use curatrs::utils::retry_policy::RetryPolicy;
use curatrs::utils::robots::RobotsChecker;
use curatrs::workers::crawler::{CrawlOptions, Crawler};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// 生成正文恰好为`chars`个字符的HTML文章页
///
/// 正文词序列由标题派生，不同标题的页面正文没有共同词，
/// 避免在去重阶段被误判为近似重复
pub fn article_html(title: &str, chars: usize) -> String {
    let seed: usize = title.bytes().map(|b| b as usize).sum();
    let mut body = String::new();
    let mut i = 0usize;
    while body.len() < chars {
        if !body.is_empty() {
            body.push(' ');
        }
        body.push_str(&format!("w{}x{}", seed, i));
        i += 1;
    }
    body.truncate(chars);
    if body.ends_with(' ') {
        body.pop();
        body.push('y');
    }

    format!(
        "<!DOCTYPE html><html><head><title>{}</title></head><body><article><p>{}</p></article></body></html>",
        title, body
    )
}

/// 测试用配置：静态抓取、不查robots、缓存指向临时目录
pub fn test_settings(cache_dir: &Path) -> Settings {
    Settings {
        crawl_concurrency: 4,
        crawl_timeout_ms: 5_000,
        crawl_render_js: false,
        crawl_cache_dir: cache_dir.display().to_string(),
        crawl_obey_robots: false,
        crawl_max_retries: 1,
        cache_max_age_secs: None,
        final_n: 10,
        min_content_chars: 0,
        profile_text: "rust pipelines".to_string(),
    }
}

/// 直接组装一个静态引擎抓取器，便于绕过配置层测试
pub async fn build_crawler(
    cache_dir: &Path,
    concurrency: usize,
    max_retries: u32,
    obey_robots: bool,
    deadline: Option<Duration>,
) -> Crawler {
    let engines: Vec<Arc<dyn FetchEngine>> = vec![Arc::new(ReqwestEngine)];
    let router = Arc::new(EngineRouter::new(engines));
    let cache = Arc::new(FetchCache::new(cache_dir, None).await.unwrap());
    let robots = Arc::new(RobotsChecker::new());

    let retry_policy = RetryPolicy {
        max_retries,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(10),
        enable_jitter: false,
        ..RetryPolicy::fast()
    };

    let options = CrawlOptions {
        concurrency,
        timeout: Duration::from_secs(5),
        render_js: false,
        force_refresh: false,
        obey_robots,
        deadline,
    };

    Crawler::new(router, cache, robots, retry_policy, options)
}
