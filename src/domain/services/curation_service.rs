// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::extracted_item::ExtractedItem;
use crate::domain::models::profile::Profile;
use crate::domain::models::ranked_item::RankedItem;
use crate::domain::services::relevance_scorer::RelevanceScorer;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// 摘录最大字符数
const SNIPPET_MAX_CHARS: usize = 700;

/// 精选服务
///
/// 对幸存条目按画像评分，得分降序排序（URL升序打破平局，
/// 保证全序），截取前final_n个并标注名次
pub struct CurationService;

impl CurationService {
    /// 精选条目
    ///
    /// # 参数
    ///
    /// * `items` - 过滤/去重后的条目
    /// * `profile` - 兴趣画像
    /// * `final_n` - 输出上限；幸存数不足时全部返回，不补齐也不报错
    /// * `reference_time` - 运行参考时间
    pub fn curate(
        items: Vec<ExtractedItem>,
        profile: &Profile,
        final_n: usize,
        reference_time: DateTime<Utc>,
    ) -> Vec<RankedItem> {
        let scorer = RelevanceScorer::new(&profile.free_text, reference_time);

        let mut scored: Vec<(ExtractedItem, f64, Vec<String>)> = items
            .into_iter()
            .map(|item| {
                let (score, reasons) = scorer.score(&item);
                (item, score, reasons)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.url.cmp(&b.0.url))
        });
        scored.truncate(final_n);

        scored
            .into_iter()
            .enumerate()
            .map(|(index, (item, score, reasons))| RankedItem {
                snippet: make_snippet(&item.body_text, SNIPPET_MAX_CHARS),
                rank: index + 1,
                item,
                score,
                reasons,
            })
            .collect()
    }
}

/// 生成正文摘录：换行展平为空格，超长截断并加省略号
fn make_snippet(body_text: &str, max_chars: usize) -> String {
    let flattened = body_text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if flattened.chars().count() <= max_chars {
        return flattened;
    }

    let truncated: String = flattened.chars().take(max_chars).collect();
    format!("{}…", truncated.trim_end())
}
