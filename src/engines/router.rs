// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{EngineError, FetchEngine, FetchRequest, FetchResponse};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// 引擎性能统计
#[derive(Debug, Clone)]
pub struct EngineStats {
    /// 成功率 (0.0 - 1.0)
    pub success_rate: f64,
    /// 平均响应时间
    pub avg_response_time: Duration,
    /// 使用次数
    pub usage_count: u64,
}

impl Default for EngineStats {
    fn default() -> Self {
        Self {
            success_rate: 1.0,
            avg_response_time: Duration::from_millis(500),
            usage_count: 0,
        }
    }
}

/// 引擎路由器
///
/// 按请求特征（是否需要JS渲染）选择合适的抓取引擎；
/// 渲染能力是按请求选择的策略，而不是散落在抓取路径上的分支
pub struct EngineRouter {
    /// 引擎列表
    engines: Vec<Arc<dyn FetchEngine>>,
    /// 引擎性能统计
    engine_stats: Arc<parking_lot::RwLock<HashMap<String, EngineStats>>>,
}

impl EngineRouter {
    /// 创建新的引擎路由器
    ///
    /// # 参数
    ///
    /// * `engines` - 引擎列表
    pub fn new(engines: Vec<Arc<dyn FetchEngine>>) -> Self {
        let mut engine_stats = HashMap::new();
        for engine in &engines {
            engine_stats.insert(engine.name().to_string(), EngineStats::default());
        }

        Self {
            engines,
            engine_stats: Arc::new(parking_lot::RwLock::new(engine_stats)),
        }
    }

    /// 选择支持该请求的引擎，按支持分数与近期成功率排序
    fn select_engines(&self, request: &FetchRequest) -> Vec<(f64, Arc<dyn FetchEngine>)> {
        let stats = self.engine_stats.read();
        let mut candidates = Vec::new();

        for engine in &self.engines {
            let support_score = engine.support_score(request) as f64;
            if support_score == 0.0 {
                continue;
            }

            let default_stats = EngineStats::default();
            let engine_stat = stats.get(engine.name()).unwrap_or(&default_stats);

            // 支持分数为主，成功率作平滑权重
            let final_score = support_score * (0.3 + engine_stat.success_rate * 0.7);
            candidates.push((final_score, engine.clone()));
        }

        candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        candidates
    }

    /// 更新引擎统计信息
    fn update_engine_stats(&self, engine_name: &str, success: bool, response_time: Duration) {
        let mut stats = self.engine_stats.write();
        if let Some(stat) = stats.get_mut(engine_name) {
            let alpha = 0.1; // 平滑因子
            let current_success = if success { 1.0 } else { 0.0 };
            stat.success_rate = stat.success_rate * (1.0 - alpha) + current_success * alpha;

            let current_avg_ns = stat.avg_response_time.as_nanos() as f64;
            let response_ns = response_time.as_nanos() as f64;
            let new_avg_ns = current_avg_ns * (1.0 - alpha) + response_ns * alpha;
            stat.avg_response_time = Duration::from_nanos(new_avg_ns as u64);

            stat.usage_count += 1;
        }
    }

    /// 路由请求到合适的引擎
    ///
    /// 依次尝试候选引擎；可重试的引擎错误（超时、5xx、浏览器故障）
    /// 会落到下一个引擎，不可重试错误立即返回
    ///
    /// # 参数
    ///
    /// * `request` - 抓取请求
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchResponse)` - 抓取响应
    /// * `Err(EngineError)` - 所有候选引擎均失败时的最后一个错误
    pub async fn route(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        let candidates = self.select_engines(request);

        if candidates.is_empty() {
            warn!("No suitable engines available for request to {}", request.url);
            return Err(EngineError::NoEngineAvailable);
        }

        let mut last_error = None;

        for (score, engine) in candidates {
            let engine_name = engine.name();
            debug!(
                "Trying engine {} with score {:.2} for request to {}",
                engine_name, score, request.url
            );

            let engine_start = Instant::now();
            match engine.fetch(request).await {
                Ok(response) => {
                    self.update_engine_stats(engine_name, true, engine_start.elapsed());
                    return Ok(response);
                }
                Err(e) => {
                    self.update_engine_stats(engine_name, false, engine_start.elapsed());

                    if e.is_retryable() {
                        warn!(
                            "Engine {} failed with retryable error: {}, trying next engine",
                            engine_name, e
                        );
                        last_error = Some(e);
                        continue;
                    }

                    warn!(
                        "Engine {} failed with non-retryable error: {}",
                        engine_name, e
                    );
                    return Err(e);
                }
            }
        }

        warn!("All engines failed for request to {}", request.url);
        Err(last_error.unwrap_or(EngineError::NoEngineAvailable))
    }

    /// 获取引擎统计信息
    pub fn get_engine_stats(&self) -> HashMap<String, EngineStats> {
        self.engine_stats.read().clone()
    }
}
