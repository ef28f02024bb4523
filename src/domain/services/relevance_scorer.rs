// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::extracted_item::ExtractedItem;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::collections::HashMap;

/// 相关性评分器
///
/// 将画像自由文本分解为加权词项，对条目的标题/正文/URL计分。
/// 给定相同的(条目, 画像, 参考时间)输入，得分完全可复现：
/// 评分路径上不读取时钟
pub struct RelevanceScorer {
    profile_terms: Vec<String>,
    /// 去重并排序的词项，保证求和顺序稳定
    unique_terms: Vec<String>,
    term_weights: HashMap<String, f64>,
    boundary_regexes: HashMap<String, Regex>,
    reference_time: DateTime<Utc>,
}

impl RelevanceScorer {
    /// 创建评分器
    ///
    /// # 参数
    ///
    /// * `profile_text` - 画像自由文本
    /// * `reference_time` - 运行参考时间，新鲜度以此为基准
    pub fn new(profile_text: &str, reference_time: DateTime<Utc>) -> Self {
        let profile_lower = profile_text.to_lowercase();
        let terms: Vec<String> = profile_lower
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
            .filter(|t| t.chars().count() > 2) // Filter out very short terms
            .collect();

        // Calculate TF-IDF-like weights for profile terms
        let mut term_weights = HashMap::new();
        let total_terms = terms.len() as f64;

        for term in &terms {
            let count = terms.iter().filter(|t| t == &term).count() as f64;
            let tf = count / total_terms;
            // Simple IDF approximation (logarithmic scale)
            let idf = (1.0 + total_terms / count).ln();
            term_weights.insert(term.clone(), tf * idf);
        }

        let mut unique_terms: Vec<String> = term_weights.keys().cloned().collect();
        unique_terms.sort();

        let boundary_regexes = unique_terms
            .iter()
            .map(|term| {
                let pattern = format!(r"\b{}\b", regex::escape(term));
                (term.clone(), Regex::new(&pattern).unwrap())
            })
            .collect();

        Self {
            profile_terms: terms,
            unique_terms,
            term_weights,
            boundary_regexes,
            reference_time,
        }
    }

    /// 计算条目的相关性得分及解释
    pub fn score(&self, item: &ExtractedItem) -> (f64, Vec<String>) {
        let mut reasons = Vec::new();
        let title_lower = item.title.to_lowercase();
        let body_lower = item.body_text.to_lowercase();
        let url_lower = item.url.to_lowercase();

        let mut term_score = 0.0;

        for term in self.unique_terms() {
            let weight = self.term_weights.get(term).copied().unwrap_or(1.0);

            // Title relevance (highest weight)
            if title_lower.contains(term) {
                term_score += 2.0 * weight;
            }
            if title_lower.starts_with(term) {
                term_score += 1.5 * weight;
            }
            if self.has_word_boundary_match(&title_lower, term) {
                term_score += 1.2 * weight;
            }

            // Body relevance, occurrence count log-damped
            let occurrences = body_lower.matches(term).count();
            if occurrences > 0 {
                term_score += 0.8 * weight * (1.0 + occurrences as f64).ln();
            }

            // URL relevance (lower weight)
            if url_lower.contains(term) {
                term_score += 0.4 * weight;
            }
        }

        if term_score > 0.0 {
            reasons.push(format!("keywords:{:.2}", term_score));
        }

        let mut score = term_score;

        // Domain authority bonus (simplified)
        if is_authoritative_domain(&item.domain) {
            score += 0.5;
            reasons.push(format!("authority-domain:{}", item.domain));
        }

        // Length penalty for very short titles (potential spam)
        if item.title.chars().count() < 10 {
            score *= 0.8;
            reasons.push("short-title".to_string());
        }

        // Freshness relative to the run's reference time
        let freshness = self.freshness_score(item.published_at);
        score += 0.5 * freshness;
        if freshness > 0.7 {
            reasons.push("very-recent".to_string());
        }

        (score, reasons)
    }

    fn unique_terms(&self) -> impl Iterator<Item = &String> {
        self.unique_terms.iter()
    }

    /// Check if term appears at word boundaries
    fn has_word_boundary_match(&self, text: &str, term: &str) -> bool {
        self.boundary_regexes
            .get(term)
            .map(|re| re.is_match(text))
            .unwrap_or(false)
    }

    /// 新鲜度分桶衰减；缺失发布时间给中性低分
    fn freshness_score(&self, published_at: Option<DateTime<Utc>>) -> f64 {
        let Some(published) = published_at else {
            return 0.2;
        };
        let age = self.reference_time - published;

        match age {
            age if age < Duration::zero() => 1.0,
            age if age < Duration::days(1) => 1.0,
            age if age < Duration::days(7) => 0.8,
            age if age < Duration::days(30) => 0.6,
            age if age < Duration::days(180) => 0.4,
            age if age < Duration::days(365) => 0.2,
            _ => 0.1, // Very old content
        }
    }

    /// 画像词项数量（调试用）
    pub fn term_count(&self) -> usize {
        self.profile_terms.len()
    }
}

/// Check if domain is a well-known reference source (simplified heuristic)
fn is_authoritative_domain(domain: &str) -> bool {
    const AUTHORITATIVE_DOMAINS: &[&str] = &[
        "wikipedia.org",
        "github.com",
        "stackoverflow.com",
        "arxiv.org",
        "mozilla.org",
    ];

    AUTHORITATIVE_DOMAINS
        .iter()
        .any(|d| domain == *d || domain.ends_with(&format!(".{}", d)))
}
