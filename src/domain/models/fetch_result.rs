// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::candidate::CandidateUrl;
use crate::engines::traits::FetchResponse;
use crate::infrastructure::cache::fetch_cache::CacheEntry;
use crate::utils::errors::FetchErrorKind;

/// 单个候选URL的终态抓取结果
///
/// 每个输入URL在一次运行中恰好产生一个FetchResult，
/// 成功或带ErrorKind的失败，绝不静默丢弃
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub candidate: CandidateUrl,

    /// 规范化后的URL；规范化失败时为原始输入
    pub url: String,

    pub success: bool,
    pub status_code: Option<u16>,
    pub body: Vec<u8>,
    pub content_type: String,
    pub from_cache: bool,
    pub error: Option<FetchErrorKind>,
}

impl FetchResult {
    /// 由一次网络抓取成功构造
    pub fn from_response(candidate: CandidateUrl, url: String, response: FetchResponse) -> Self {
        Self {
            candidate,
            url,
            success: true,
            status_code: Some(response.status_code),
            body: response.body,
            content_type: response.content_type,
            from_cache: false,
            error: None,
        }
    }

    /// 由缓存命中构造
    pub fn from_cache_entry(candidate: CandidateUrl, url: String, entry: CacheEntry) -> Self {
        Self {
            candidate,
            url,
            success: true,
            status_code: Some(entry.status_code),
            body: entry.body,
            content_type: entry.content_type,
            from_cache: true,
            error: None,
        }
    }

    /// 构造终态失败结果
    pub fn failure(
        candidate: CandidateUrl,
        url: String,
        status_code: Option<u16>,
        kind: FetchErrorKind,
    ) -> Self {
        Self {
            candidate,
            url,
            success: false,
            status_code,
            body: Vec::new(),
            content_type: String::new(),
            from_cache: false,
            error: Some(kind),
        }
    }
}
