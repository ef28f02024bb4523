// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::extracted_item::ExtractedItem;
use crate::domain::models::fetch_result::FetchResult;
use crate::utils::errors::ExtractionError;
use crate::utils::{text_encoding, url_utils};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

type DateParser = fn(&str) -> Option<DateTime<Utc>>;

static DATE_REGEXES: Lazy<Vec<(Regex, DateParser)>> = Lazy::new(|| {
    vec![
        // ISO 8601 format: 2024-01-15T10:30:00Z
        (
            Regex::new(r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{3})?(Z|[+-]\d{2}:\d{2})").unwrap(),
            |s| {
                DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            },
        ),
        // Date format: 2024-01-15
        (Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap(), |s| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        }),
        // Common formats: Jan 15, 2024, January 15, 2024
        (
            Regex::new(r"(Jan|January|Feb|February|Mar|March|Apr|April|May|Jun|June|Jul|July|Aug|August|Sep|September|Oct|October|Nov|November|Dec|December)\s+(\d{1,2}),?\s+(\d{4})").unwrap(),
            |s| {
                chrono::NaiveDate::parse_from_str(s, "%b %d, %Y")
                    .ok()
                    .or_else(|| chrono::NaiveDate::parse_from_str(s, "%B %d, %Y").ok())
                    .or_else(|| chrono::NaiveDate::parse_from_str(s, "%b %d %Y").ok())
                    .or_else(|| chrono::NaiveDate::parse_from_str(s, "%B %d %Y").ok())
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc())
            },
        ),
    ]
});

/// HTML清理器
///
/// 在解析前用正则移除脚本、样式、注释和导航类样板区块
struct HtmlCleaner {
    comment_regex: Regex,
    block_regexes: Vec<Regex>,
}

/// 移除整块内容的样板标签
const BOILERPLATE_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "form", "iframe", "svg",
    "template", "button",
];

static CLEANER: Lazy<HtmlCleaner> = Lazy::new(HtmlCleaner::new);

impl HtmlCleaner {
    fn new() -> Self {
        let block_regexes = BOILERPLATE_TAGS
            .iter()
            .map(|tag| {
                // regex crate不支持反向引用，每个标签一个正则
                Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).unwrap()
            })
            .collect();

        Self {
            comment_regex: Regex::new(r"(?s)<!--.*?-->").unwrap(),
            block_regexes,
        }
    }

    fn strip_boilerplate(&self, html: &str) -> String {
        let mut cleaned = self.comment_regex.replace_all(html, " ").into_owned();
        for regex in &self.block_regexes {
            cleaned = regex.replace_all(&cleaned, " ").into_owned();
        }
        cleaned
    }
}

static OG_TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());

static DATE_META_SELECTORS: Lazy<Vec<(Selector, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Selector::parse(r#"meta[property="article:published_time"]"#).unwrap(),
            "content",
        ),
        (Selector::parse(r#"meta[name="date"]"#).unwrap(), "content"),
        (Selector::parse(r#"meta[name="pubdate"]"#).unwrap(), "content"),
        (
            Selector::parse(r#"meta[itemprop="datePublished"]"#).unwrap(),
            "content",
        ),
        (Selector::parse("time[datetime]").unwrap(), "datetime"),
    ]
});

static BODY_CONTAINER_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["article", "main", "body"]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});

/// 提取服务
///
/// 将成功的FetchResult转换为规范化的ExtractedItem。
/// 对相同的输入字节输出完全确定
pub struct ExtractionService;

impl ExtractionService {
    /// 提取条目
    ///
    /// # 参数
    ///
    /// * `result` - 成功且内容类型为HTML族的抓取结果
    ///
    /// # 返回值
    ///
    /// * `Ok(ExtractedItem)` - 规范化条目
    /// * `Err(ExtractionError)` - 不可提取时的原因
    pub fn extract(result: &FetchResult) -> Result<ExtractedItem, ExtractionError> {
        if !result.success {
            return Err(ExtractionError::FetchNotSuccessful);
        }
        if !is_html_content(&result.content_type, &result.body) {
            return Err(ExtractionError::UnsupportedContentType(
                result.content_type.clone(),
            ));
        }

        let raw = text_encoding::decode_body(&result.body, &result.content_type);

        // 标题与发布时间在清理前的完整文档上提取，meta标签不属于样板
        let full_document = Html::parse_document(&raw);
        let title = extract_title(&full_document)
            .or_else(|| {
                result
                    .candidate
                    .discovered_title()
                    .map(|t| html_escape::decode_html_entities(t).to_string())
            })
            .unwrap_or_default();
        let published_at = extract_published_at(&full_document, &raw);

        let cleaned = CLEANER.strip_boilerplate(&raw);
        let document = Html::parse_document(&cleaned);
        let body_text = normalize_whitespace(&extract_body_text(&document));
        if body_text.is_empty() {
            return Err(ExtractionError::EmptyContent);
        }

        Ok(ExtractedItem {
            url: result.url.clone(),
            char_count: body_text.chars().count(),
            published_at,
            domain: url_utils::domain_of(&result.url),
            source_type: result.candidate.source_type,
            title,
            body_text,
        })
    }
}

/// 内容类型是否属于可提取的HTML族
fn is_html_content(content_type: &str, body: &[u8]) -> bool {
    let ct = content_type.to_lowercase();
    if ct.contains("html") || ct.contains("xhtml") {
        return true;
    }
    // 泛化类型按正文前缀嗅探
    if ct.is_empty() || ct.starts_with("application/octet-stream") || ct.starts_with("text/plain") {
        let head = String::from_utf8_lossy(&body[..body.len().min(512)]).to_lowercase();
        return head.contains("<!doctype html") || head.contains("<html");
    }
    false
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_title(document: &Html) -> Option<String> {
    if let Some(meta) = document.select(&OG_TITLE_SELECTOR).next() {
        if let Some(content) = meta.value().attr("content") {
            let title = collapse_whitespace(content);
            if !title.is_empty() {
                return Some(title);
            }
        }
    }

    for selector in [&*TITLE_SELECTOR, &*H1_SELECTOR] {
        if let Some(element) = document.select(selector).next() {
            let title = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
            if !title.is_empty() {
                return Some(title);
            }
        }
    }

    None
}

fn extract_body_text(document: &Html) -> String {
    for selector in BODY_CONTAINER_SELECTORS.iter() {
        let mut parts = Vec::new();
        for element in document.select(selector) {
            parts.extend(element.text().map(|t| t.to_string()));
        }
        let joined = parts.join("\n");
        if !joined.trim().is_empty() {
            return joined;
        }
    }
    String::new()
}

/// 空白规范化：去控制字符、折叠行内空白、丢弃空行
fn normalize_whitespace(text: &str) -> String {
    let printable: String = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();

    let mut lines = Vec::new();
    for line in printable.lines() {
        let collapsed = collapse_whitespace(line);
        if !collapsed.is_empty() {
            lines.push(collapsed);
        }
    }
    lines.join("\n")
}

fn parse_date_candidate(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    None
}

fn extract_published_at(document: &Html, raw_html: &str) -> Option<DateTime<Utc>> {
    for (selector, attr) in DATE_META_SELECTORS.iter() {
        if let Some(element) = document.select(selector).next() {
            if let Some(value) = element.value().attr(attr) {
                if let Some(date) = parse_date_candidate(value) {
                    return Some(date);
                }
            }
        }
    }

    // 回退：扫描文档头部区域的绝对日期。相对日期（"2 days ago"）
    // 会破坏提取的确定性，不解析
    let head: String = raw_html.chars().take(4096).collect();
    for (regex, parser) in DATE_REGEXES.iter() {
        if let Some(found) = regex.find(&head) {
            if let Some(date) = parser(found.as_str()) {
                return Some(date);
            }
        }
    }
    None
}

#[cfg(test)]
#[path = "extraction_service_test.rs"]
mod tests;
