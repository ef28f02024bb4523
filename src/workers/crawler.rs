// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::candidate::CandidateUrl;
use crate::domain::models::fetch_result::FetchResult;
use crate::engines::router::EngineRouter;
use crate::engines::traits::{EngineError, FetchRequest, USER_AGENT};
use crate::infrastructure::cache::fetch_cache::{CacheEntry, FetchCache};
use crate::utils::errors::{FetchErrorKind, PipelineError};
use crate::utils::retry_policy::RetryPolicy;
use crate::utils::robots::RobotsChecker;
use crate::utils::url_utils;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// 抓取选项
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// 工作池大小
    pub concurrency: usize,
    /// 单次抓取超时
    pub timeout: Duration,
    /// 是否启用JavaScript渲染
    pub render_js: bool,
    /// 跳过缓存强制重新抓取
    pub force_refresh: bool,
    /// 是否遵守robots.txt
    pub obey_robots: bool,
    /// 整个抓取操作的全局截止时间
    pub deadline: Option<Duration>,
}

/// 抓取器
///
/// 固定大小的工作池从一个有界FIFO队列取任务，队列满时提交阻塞。
/// 保证：每个输入URL恰好产生一个终态FetchResult，
/// 输出按提交顺序还原，与并发度无关
pub struct Crawler {
    router: Arc<EngineRouter>,
    cache: Arc<FetchCache>,
    robots: Arc<RobotsChecker>,
    retry_policy: RetryPolicy,
    options: CrawlOptions,
}

impl Crawler {
    /// 创建抓取器
    pub fn new(
        router: Arc<EngineRouter>,
        cache: Arc<FetchCache>,
        robots: Arc<RobotsChecker>,
        retry_policy: RetryPolicy,
        options: CrawlOptions,
    ) -> Self {
        Self {
            router,
            cache,
            robots,
            retry_policy,
            options,
        }
    }

    /// 抓取候选URL列表
    ///
    /// 每URL失败（网络、超时、4xx、robots禁止）记录在FetchResult上，
    /// 不会中止整个抓取；缓存I/O错误是致命的
    pub async fn crawl(
        &self,
        candidates: Vec<CandidateUrl>,
    ) -> Result<Vec<FetchResult>, PipelineError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let total = candidates.len();
        let concurrency = self.options.concurrency.max(1).min(total);
        let deadline_at = self.options.deadline.map(|d| Instant::now() + d);

        info!(
            "开始抓取 {} 个URL，并发度 {}，渲染JS: {}",
            total, concurrency, self.options.render_js
        );

        // 有界任务队列：FIFO提交顺序，队列满时提交端阻塞（背压）
        let (task_tx, task_rx) = mpsc::channel::<(usize, CandidateUrl)>(concurrency);
        let task_rx = Arc::new(tokio::sync::Mutex::new(task_rx));
        let (result_tx, mut result_rx) =
            mpsc::unbounded_channel::<(usize, Result<FetchResult, PipelineError>)>();

        let mut handles = Vec::with_capacity(concurrency);
        for _ in 0..concurrency {
            let worker = CrawlWorker {
                id: Uuid::new_v4(),
                router: self.router.clone(),
                cache: self.cache.clone(),
                robots: self.robots.clone(),
                retry_policy: self.retry_policy.clone(),
                options: self.options.clone(),
                deadline_at,
            };
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();

            handles.push(tokio::spawn(async move {
                loop {
                    let next = { task_rx.lock().await.recv().await };
                    let Some((index, candidate)) = next else {
                        break;
                    };
                    let result = worker.fetch_one(candidate).await;
                    if result_tx.send((index, result)).is_err() {
                        break;
                    }
                }
            }));
        }
        drop(result_tx);

        let originals = candidates.clone();
        for (index, candidate) in candidates.into_iter().enumerate() {
            if task_tx.send((index, candidate)).await.is_err() {
                break;
            }
        }
        drop(task_tx);

        let mut slots: Vec<Option<FetchResult>> = (0..total).map(|_| None).collect();
        let mut fatal: Option<PipelineError> = None;
        while let Some((index, result)) = result_rx.recv().await {
            match result {
                Ok(fetch_result) => slots[index] = Some(fetch_result),
                Err(e) => {
                    // 第一个致命错误生效，其余结果继续排空
                    if fatal.is_none() {
                        fatal = Some(e);
                    }
                }
            }
        }

        for handle in handles {
            let _ = handle.await;
        }

        if let Some(e) = fatal {
            return Err(e);
        }

        // 还原提交顺序；异常缺失的槽位补为网络失败，保证每URL一个终态
        let results = slots
            .into_iter()
            .zip(originals)
            .map(|(slot, candidate)| {
                slot.unwrap_or_else(|| {
                    let url = candidate.url.clone();
                    FetchResult::failure(candidate, url, None, FetchErrorKind::Network)
                })
            })
            .collect();

        Ok(results)
    }
}

/// 工作池中的单个抓取工作器
struct CrawlWorker {
    id: Uuid,
    router: Arc<EngineRouter>,
    cache: Arc<FetchCache>,
    robots: Arc<RobotsChecker>,
    retry_policy: RetryPolicy,
    options: CrawlOptions,
    deadline_at: Option<Instant>,
}

impl CrawlWorker {
    /// 当前单次抓取可用的时间预算；全局截止时间已过则返回None
    fn remaining_budget(&self) -> Option<Duration> {
        match self.deadline_at {
            None => Some(self.options.timeout),
            Some(at) => {
                let now = Instant::now();
                if now >= at {
                    None
                } else {
                    Some((at - now).min(self.options.timeout))
                }
            }
        }
    }

    #[instrument(skip(self, candidate), fields(worker = %self.id, url = %candidate.url))]
    async fn fetch_one(&self, candidate: CandidateUrl) -> Result<FetchResult, PipelineError> {
        // 1. URL规范化；格式非法立即终态失败，不消耗重试
        let normalized = match url_utils::normalize_url(&candidate.url) {
            Ok(url) => url,
            Err(e) => {
                debug!("URL规范化失败: {}", e);
                let url = candidate.url.clone();
                return Ok(FetchResult::failure(
                    candidate,
                    url,
                    None,
                    FetchErrorKind::Client,
                ));
            }
        };

        // 2. 查缓存
        let cache_key = FetchCache::cache_key(&normalized, self.options.render_js);
        if !self.options.force_refresh {
            if let Some(entry) = self.cache.get(&cache_key).await? {
                debug!("缓存命中");
                return Ok(FetchResult::from_cache_entry(candidate, normalized, entry));
            }
        }

        // 3. 全局截止时间
        if self.remaining_budget().is_none() {
            return Ok(FetchResult::failure(
                candidate,
                normalized,
                None,
                FetchErrorKind::Timeout,
            ));
        }

        // 4. robots.txt检查
        if self.options.obey_robots && !self.robots.is_allowed(&normalized, USER_AGENT).await {
            debug!("robots.txt禁止抓取");
            return Ok(FetchResult::failure(
                candidate,
                normalized,
                None,
                FetchErrorKind::RobotsDenied,
            ));
        }

        // 5. 带重试的网络抓取
        let mut attempt: u32 = 0;
        loop {
            let Some(budget) = self.remaining_budget() else {
                return Ok(FetchResult::failure(
                    candidate,
                    normalized,
                    None,
                    FetchErrorKind::Timeout,
                ));
            };

            let request = FetchRequest {
                url: normalized.clone(),
                timeout: budget,
                render_js: self.options.render_js,
            };

            let outcome = match tokio::time::timeout(budget, self.router.route(&request)).await {
                Ok(result) => result,
                Err(_) => Err(EngineError::Timeout),
            };

            let (kind, status_code) = match outcome {
                Ok(response) if (200..300).contains(&response.status_code) => {
                    let entry = CacheEntry {
                        status_code: response.status_code,
                        content_type: response.content_type.clone(),
                        fetched_at: Utc::now(),
                        body: response.body.clone(),
                    };
                    self.cache.put(&cache_key, &entry).await?;
                    debug!(status = response.status_code, "抓取成功");
                    return Ok(FetchResult::from_response(candidate, normalized, response));
                }
                Ok(response) if response.status_code >= 500 => {
                    // 5xx瞬时，进入重试
                    (FetchErrorKind::Network, Some(response.status_code))
                }
                Ok(response) => {
                    // 4xx等客户端错误：终态，不重试
                    debug!(status = response.status_code, "客户端错误，不重试");
                    return Ok(FetchResult::failure(
                        candidate,
                        normalized,
                        Some(response.status_code),
                        FetchErrorKind::Client,
                    ));
                }
                Err(e) => {
                    let kind = match &e {
                        EngineError::Timeout => FetchErrorKind::Timeout,
                        EngineError::RequestFailed(re) if re.is_timeout() => FetchErrorKind::Timeout,
                        _ => FetchErrorKind::Network,
                    };
                    if !e.is_retryable() {
                        debug!("不可重试的引擎错误: {}", e);
                        let kind = match &e {
                            EngineError::RequestFailed(re)
                                if re.status().is_some_and(|s| s.is_client_error()) =>
                            {
                                FetchErrorKind::Client
                            }
                            _ => kind,
                        };
                        let status_code = match &e {
                            EngineError::RequestFailed(re) => re.status().map(|s| s.as_u16()),
                            _ => None,
                        };
                        return Ok(FetchResult::failure(candidate, normalized, status_code, kind));
                    }
                    (kind, None)
                }
            };

            attempt += 1;
            if !self.retry_policy.should_retry(attempt) {
                warn!(attempts = attempt, "重试耗尽，终态失败: {}", kind);
                return Ok(FetchResult::failure(candidate, normalized, status_code, kind));
            }

            let backoff = self.retry_policy.calculate_backoff(attempt);
            debug!(attempt, backoff_ms = backoff.as_millis() as u64, "瞬时失败，退避后重试");
            tokio::time::sleep(backoff).await;
        }
    }
}
