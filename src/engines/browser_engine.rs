// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{EngineError, FetchEngine, FetchRequest, FetchResponse};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

// Global browser instance to avoid re-launching Chrome on every request.
// This significantly improves performance for browser-based fetching.
static BROWSER_INSTANCE: OnceCell<Browser> = OnceCell::const_new();

// Asynchronously gets or initializes the shared browser instance.
// This function ensures that the browser is launched only once.
async fn get_browser() -> Result<&'static Browser, EngineError> {
    BROWSER_INSTANCE
        .get_or_try_init(|| async {
            let mut builder = BrowserConfig::builder()
                .no_sandbox()
                .request_timeout(Duration::from_secs(30));

            builder = builder.arg("--disable-gpu").arg("--disable-dev-shm-usage");

            let (browser, mut handler) = Browser::launch(
                builder
                    .build()
                    .map_err(|e| EngineError::Browser(e.to_string()))?,
            )
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;

            // Spawn a handler to process browser events
            tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            Ok(browser)
        })
        .await
}

/// 浏览器渲染引擎
///
/// 基于chromiumoxide实现的JavaScript渲染抓取引擎
pub struct BrowserEngine;

#[async_trait]
impl FetchEngine for BrowserEngine {
    /// 执行浏览器渲染抓取
    ///
    /// # 参数
    ///
    /// * `request` - 抓取请求
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchResponse)` - 渲染后的DOM快照
    /// * `Err(EngineError)` - 抓取过程中出现的错误
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        // Only run if rendering was specifically requested
        if !request.render_js {
            return Err(EngineError::Other(
                "browser engine only handles render_js requests".to_string(),
            ));
        }

        let start = Instant::now();

        // Wrap the entire operation in a timeout
        tokio::time::timeout(request.timeout, async {
            let browser = get_browser().await?;

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| EngineError::Browser(e.to_string()))?;

            // goto waits for the load event by default
            page.goto(request.url.as_str())
                .await
                .map_err(|e| EngineError::Browser(e.to_string()))?;

            let content = page
                .content()
                .await
                .map_err(|e| EngineError::Browser(e.to_string()))?;

            // Chromiumoxide的goto不直接暴露主文档状态码，渲染成功即视为200
            Ok(FetchResponse {
                status_code: 200,
                body: content.into_bytes(),
                content_type: "text/html; charset=utf-8".to_string(),
                response_time_ms: start.elapsed().as_millis() as u64,
            })
        })
        .await
        .map_err(|_| EngineError::Timeout)?
    }

    /// 计算对请求的支持分数
    ///
    /// 仅支持需要JS渲染的请求
    fn support_score(&self, request: &FetchRequest) -> u8 {
        if request.render_js {
            100
        } else {
            0
        }
    }

    /// 获取引擎名称
    fn name(&self) -> &'static str {
        "browser"
    }
}
