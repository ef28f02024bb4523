// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::candidate::CandidateUrl;
use crate::domain::models::ranked_item::{RunResult, RunStats};
use crate::utils::errors::PipelineError;
use serde_json::json;
use std::path::Path;
use tracing::warn;

/// 读取候选URL列表（JSONL，每行一个JSON对象）
///
/// 空行与无法解析的行跳过并告警；文件不可读是致命错误
pub async fn read_candidates(path: &Path) -> Result<Vec<CandidateUrl>, PipelineError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PipelineError::Input {
            path: path.display().to_string(),
            source: e,
        })?;

    let mut candidates = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<CandidateUrl>(line) {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => warn!("跳过第{}行无法解析的候选记录: {}", lineno + 1, e),
        }
    }

    Ok(candidates)
}

async fn ensure_parent_dir(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

async fn write_file(path: &Path, content: &str) -> Result<(), PipelineError> {
    let io_err = |e| PipelineError::Output {
        path: path.display().to_string(),
        source: e,
    };
    ensure_parent_dir(path).await.map_err(io_err)?;
    tokio::fs::write(path, content).await.map_err(io_err)
}

/// 写出精选结果（JSONL，每行一个条目，按rank升序）
pub async fn write_results(path: &Path, result: &RunResult) -> Result<(), PipelineError> {
    let mut lines = String::new();
    for ranked in &result.items {
        let record = json!({
            "url": ranked.item.url,
            "title": ranked.item.title,
            "score": (ranked.score * 10_000.0).round() / 10_000.0,
            "rank": ranked.rank,
            "domain": ranked.item.domain,
            "publishedAt": ranked.item.published_at,
            "sourceType": ranked.item.source_type,
            "charCount": ranked.item.char_count,
            "reasons": ranked.reasons,
            "snippet": ranked.snippet,
        });
        lines.push_str(&record.to_string());
        lines.push('\n');
    }
    write_file(path, &lines).await
}

/// 写出运行统计（JSON）
pub async fn write_stats(path: &Path, stats: &RunStats) -> Result<(), PipelineError> {
    let content = serde_json::to_string_pretty(stats).unwrap_or_default();
    write_file(path, &content).await
}

/// 写出Markdown摘要，便于人工浏览
pub async fn write_markdown(path: &Path, result: &RunResult) -> Result<(), PipelineError> {
    let mut lines = vec!["# Curated Results".to_string(), String::new()];
    for ranked in &result.items {
        let title = if ranked.item.title.is_empty() {
            "(no title)"
        } else {
            &ranked.item.title
        };
        lines.push(format!("## {}. {}", ranked.rank, title));
        lines.push(format!("- URL: {}", ranked.item.url));
        lines.push(format!(
            "- Domain: `{}`  | Score: **{:.3}**  | Published: {}",
            ranked.item.domain,
            ranked.score,
            ranked
                .item
                .published_at
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| "-".to_string())
        ));
        if !ranked.reasons.is_empty() {
            lines.push(format!("- Reasons: {}", ranked.reasons.join(", ")));
        }
        lines.push(String::new());
        lines.push(ranked.snippet.clone());
        lines.push("\n---\n".to_string());
    }
    write_file(path, &lines.join("\n")).await
}
