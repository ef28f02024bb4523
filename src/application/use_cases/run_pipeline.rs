// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::domain::models::candidate::CandidateUrl;
use crate::domain::models::profile::Profile;
use crate::domain::models::ranked_item::{RunResult, RunStats};
use crate::domain::services::curation_service::CurationService;
use crate::domain::services::dedup_service::DedupService;
use crate::domain::services::extraction_service::ExtractionService;
use crate::engines::browser_engine::BrowserEngine;
use crate::engines::reqwest_engine::ReqwestEngine;
use crate::engines::router::EngineRouter;
use crate::engines::traits::FetchEngine;
use crate::infrastructure::cache::fetch_cache::FetchCache;
use crate::utils::errors::PipelineError;
use crate::utils::retry_policy::RetryPolicy;
use crate::utils::robots::RobotsChecker;
use crate::utils::url_utils;
use crate::workers::crawler::{CrawlOptions, Crawler};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// 管道运行用例
///
/// 串联 抓取 → 提取 → 过滤/去重 → 精选，贯穿各阶段统计。
/// 对调用者而言一次运行是原子的：要么产出完整的RunResult
/// （可能为空），要么以致命错误失败；单URL失败绝不中止运行
pub struct RunPipelineUseCase {
    settings: Settings,
    crawler: Crawler,
    dedup: DedupService,
}

impl RunPipelineUseCase {
    /// 组装管道
    ///
    /// # 参数
    ///
    /// * `settings` - 不可变配置，构造后贯穿整个运行
    /// * `force_refresh` - 跳过缓存强制重新抓取
    /// * `deadline` - 抓取阶段的全局截止时间
    pub async fn new(
        settings: Settings,
        force_refresh: bool,
        deadline: Option<Duration>,
    ) -> Result<Self, PipelineError> {
        let cache = Arc::new(
            FetchCache::new(
                settings.crawl_cache_dir.clone(),
                settings.cache_max_age_secs.map(Duration::from_secs),
            )
            .await?,
        );

        let engines: Vec<Arc<dyn FetchEngine>> =
            vec![Arc::new(ReqwestEngine), Arc::new(BrowserEngine)];
        let router = Arc::new(EngineRouter::new(engines));
        let robots = Arc::new(RobotsChecker::new());

        let retry_policy = RetryPolicy {
            max_retries: settings.crawl_max_retries,
            ..RetryPolicy::fast()
        };

        let options = CrawlOptions {
            concurrency: settings.crawl_concurrency,
            timeout: Duration::from_millis(settings.crawl_timeout_ms),
            render_js: settings.crawl_render_js,
            force_refresh,
            obey_robots: settings.crawl_obey_robots,
            deadline,
        };

        let crawler = Crawler::new(router, cache, robots, retry_policy, options);

        Ok(Self {
            settings,
            crawler,
            dedup: DedupService::with_default_config(),
        })
    }

    /// 执行一次完整的管道运行
    pub async fn execute(
        &self,
        candidates: Vec<CandidateUrl>,
    ) -> Result<RunResult, PipelineError> {
        let started_at = Utc::now();
        let mut stats = RunStats {
            discovered: candidates.len(),
            ..RunStats::default()
        };

        // 输入列表按规范URL预去重，保持发现顺序
        let (unique, input_duplicates) = dedup_candidates(candidates);
        stats.deduped += input_duplicates;
        info!(
            "候选 {} 条，输入重复 {} 条，待抓取 {} 条",
            stats.discovered,
            input_duplicates,
            unique.len()
        );

        // 抓取（结果已按提交顺序还原）
        let fetch_results = self.crawler.crawl(unique).await?;
        for result in &fetch_results {
            if result.success {
                stats.fetched += 1;
                if result.from_cache {
                    stats.cache_hits += 1;
                }
            } else {
                stats.failed += 1;
            }
        }

        // 提取（纯函数，单线程即可）
        let mut extracted = Vec::new();
        for result in fetch_results.iter().filter(|r| r.success) {
            match ExtractionService::extract(result) {
                Ok(item) => extracted.push(item),
                Err(e) => debug!(url = %result.url, "提取失败: {}", e),
            }
        }
        stats.extracted = extracted.len();

        // 过滤与去重
        let outcome = self.dedup.filter(extracted, self.settings.min_content_chars);
        stats.filtered = outcome.dropped_short;
        stats.deduped += outcome.dropped_duplicate;

        // 精选
        let profile = Profile::new(self.settings.profile_text.clone());
        let items = CurationService::curate(
            outcome.survivors,
            &profile,
            self.settings.final_n,
            started_at,
        );
        stats.selected = items.len();

        info!(
            "管道完成: discovered={} fetched={} cache_hits={} failed={} extracted={} filtered={} deduped={} selected={}",
            stats.discovered,
            stats.fetched,
            stats.cache_hits,
            stats.failed,
            stats.extracted,
            stats.filtered,
            stats.deduped,
            stats.selected,
        );

        Ok(RunResult {
            items,
            stats,
            started_at,
        })
    }
}

/// 输入候选按规范URL去重，保留先出现的记录
fn dedup_candidates(candidates: Vec<CandidateUrl>) -> (Vec<CandidateUrl>, usize) {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    let mut duplicates = 0;

    for candidate in candidates {
        let key = url_utils::normalize_url(&candidate.url)
            .unwrap_or_else(|_| candidate.url.clone());
        if seen.insert(key) {
            unique.push(candidate);
        } else {
            duplicates += 1;
        }
    }

    (unique, duplicates)
}
