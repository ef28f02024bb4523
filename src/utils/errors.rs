// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 管道致命错误类型
///
/// 此类错误会中止整个运行；单个URL级别的失败不在此列，
/// 它们被记录在FetchResult/统计数据中并继续执行
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),

    #[error("缓存I/O错误 ({path}): {source}")]
    CacheIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("输入错误 ({path}): {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("输出错误 ({path}): {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 单URL抓取错误分类
///
/// 终态分类，记录在FetchResult上
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// 网络错误（连接失败、DNS、5xx），重试耗尽后终态
    Network,
    /// 超时（单次请求超时或全局截止时间已过）
    Timeout,
    /// 客户端错误（4xx、URL格式非法），不消耗重试
    Client,
    /// robots.txt 禁止抓取
    RobotsDenied,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchErrorKind::Network => write!(f, "network"),
            FetchErrorKind::Timeout => write!(f, "timeout"),
            FetchErrorKind::Client => write!(f, "client"),
            FetchErrorKind::RobotsDenied => write!(f, "robots_denied"),
        }
    }
}

/// 提取阶段错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("不支持的内容类型: {0}")]
    UnsupportedContentType(String),

    #[error("提取后的正文为空")]
    EmptyContent,

    #[error("抓取未成功，无法提取")]
    FetchNotSuccessful,
}
