// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 候选URL的发现来源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Search,
    Rss,
    Video,
}

/// 候选URL
///
/// 由上游发现阶段产生（搜索API、RSS、视频平台API），
/// 管道只读消费，不修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateUrl {
    pub url: String,

    #[serde(default, rename = "sourceType")]
    pub source_type: SourceType,

    /// 发现阶段附带的元数据，键值均为字符串
    #[serde(default, rename = "discoveredMeta")]
    pub discovered_meta: HashMap<String, String>,
}

impl CandidateUrl {
    /// 创建仅含URL的候选记录
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source_type: SourceType::default(),
            discovered_meta: HashMap::new(),
        }
    }

    /// 发现阶段提供的标题（若有），用作提取失败时的标题回退
    pub fn discovered_title(&self) -> Option<&str> {
        self.discovered_meta
            .get("title")
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
    }
}
