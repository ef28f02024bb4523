// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::extracted_item::ExtractedItem;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::debug;

/// 去重配置
#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// 标题相似度阈值 (0.0-1.0)，Jaro-Winkler
    pub title_similarity_threshold: f64,
    /// 正文指纹相似度阈值 (0.0-1.0)，SimHash汉明相似度
    pub body_similarity_threshold: f64,
    /// 指纹位数
    pub fingerprint_size: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            title_similarity_threshold: 0.85,
            body_similarity_threshold: 0.92,
            fingerprint_size: 64,
        }
    }
}

/// 过滤与去重的结果
#[derive(Debug)]
pub struct FilterOutcome {
    /// 幸存条目，保持输入顺序
    pub survivors: Vec<ExtractedItem>,
    /// 因正文过短被丢弃数
    pub dropped_short: usize,
    /// 因重复被丢弃数
    pub dropped_duplicate: usize,
}

/// 过滤/去重服务
///
/// 先按最小正文长度过滤，再折叠重复：
/// 规范URL相同，或标题/正文近似（阈值见DedupConfig）。
/// 始终保留先被发现的条目
pub struct DedupService {
    config: DedupConfig,
}

impl DedupService {
    /// 创建去重服务
    pub fn new(config: DedupConfig) -> Self {
        Self { config }
    }

    /// 使用默认配置创建去重服务
    pub fn with_default_config() -> Self {
        Self::new(DedupConfig::default())
    }

    /// 过滤并去重
    ///
    /// # 参数
    ///
    /// * `items` - 按发现顺序排列的条目
    /// * `min_chars` - 正文最小字符数
    pub fn filter(&self, items: Vec<ExtractedItem>, min_chars: usize) -> FilterOutcome {
        let mut survivors: Vec<(ExtractedItem, String, u64)> = Vec::new();
        let mut dropped_short = 0;
        let mut dropped_duplicate = 0;

        for item in items {
            if item.char_count < min_chars {
                debug!(url = %item.url, chars = item.char_count, "正文过短，丢弃");
                dropped_short += 1;
                continue;
            }

            let norm_title = normalize_title(&item.title);
            let fingerprint = self.simhash(&item.body_text);

            let is_duplicate = survivors.iter().any(|(existing, existing_title, existing_fp)| {
                self.is_duplicate(&item, &norm_title, fingerprint, existing, existing_title, *existing_fp)
            });

            if is_duplicate {
                debug!(url = %item.url, "重复条目，丢弃");
                dropped_duplicate += 1;
                continue;
            }

            survivors.push((item, norm_title, fingerprint));
        }

        FilterOutcome {
            survivors: survivors.into_iter().map(|(item, _, _)| item).collect(),
            dropped_short,
            dropped_duplicate,
        }
    }

    fn is_duplicate(
        &self,
        item: &ExtractedItem,
        norm_title: &str,
        fingerprint: u64,
        existing: &ExtractedItem,
        existing_title: &str,
        existing_fp: u64,
    ) -> bool {
        // URL已是规范形式，直接比较
        if item.url == existing.url {
            return true;
        }

        // 标题相似度检查
        if !norm_title.is_empty() && !existing_title.is_empty() {
            let similarity = strsim::jaro_winkler(norm_title, existing_title);
            if similarity > self.config.title_similarity_threshold {
                return true;
            }
        }

        // 正文指纹检查（汉明距离）
        let fp_similarity = fingerprint_similarity(fingerprint, existing_fp);
        fp_similarity > self.config.body_similarity_threshold
    }

    /// 简化的SimHash实现
    fn simhash(&self, content: &str) -> u64 {
        let size = self.config.fingerprint_size.min(64);
        let mut hash_bits = vec![0i32; size];

        for word in content.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let word_hash = hasher.finish();

            for (i, bit) in hash_bits.iter_mut().enumerate() {
                if (word_hash >> (i % 64)) & 1 == 1 {
                    *bit += 1;
                } else {
                    *bit -= 1;
                }
            }
        }

        let mut fingerprint = 0u64;
        for (i, bit) in hash_bits.iter().enumerate() {
            if *bit > 0 {
                fingerprint |= 1 << i;
            }
        }
        fingerprint
    }
}

/// 处理标题，折叠空白并统一小写
fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 计算指纹相似度（基于汉明距离）
fn fingerprint_similarity(fp1: u64, fp2: u64) -> f64 {
    let hamming_distance = (fp1 ^ fp2).count_ones() as f64;
    1.0 - (hamming_distance / 64.0)
}
