// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::extracted_item::ExtractedItem;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// 精选后的条目
///
/// rank在幸存条目上构成全序（得分降序，URL升序打破平局）
#[derive(Debug, Clone, Serialize)]
pub struct RankedItem {
    pub item: ExtractedItem,

    pub score: f64,

    /// 1起始的最终名次
    pub rank: usize,

    /// 可读的得分解释，如 `keywords:2.41`、`very-recent`
    pub reasons: Vec<String>,

    /// 正文开头的摘录，换行展平
    pub snippet: String,
}

/// 每阶段的运行计数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// 输入候选总数
    pub discovered: usize,
    /// 抓取成功数（含缓存命中）
    pub fetched: usize,
    /// 缓存命中数
    pub cache_hits: usize,
    /// 抓取终态失败数
    pub failed: usize,
    /// 提取成功数
    pub extracted: usize,
    /// 因正文过短被过滤数
    pub filtered: usize,
    /// 因重复被丢弃数（含输入列表中的重复URL）
    pub deduped: usize,
    /// 最终入选数
    pub selected: usize,
}

/// 一次管道运行的完整产出
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub items: Vec<RankedItem>,
    pub stats: RunStats,

    /// 运行参考时间，新鲜度评分以此为基准
    pub started_at: DateTime<Utc>,
}
