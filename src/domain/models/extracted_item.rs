// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::candidate::SourceType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 提取后的规范化内容条目
///
/// 由成功的FetchResult确定性派生：相同输入字节产生相同条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedItem {
    /// 规范化URL
    pub url: String,

    pub title: String,

    /// 去除样板后按空白规范化的正文
    pub body_text: String,

    /// 规范化正文的字符数
    pub char_count: usize,

    /// 尽力提取的发布时间
    pub published_at: Option<DateTime<Utc>>,

    /// 来源域名（无www.前缀）
    pub domain: String,

    pub source_type: SourceType,
}
