// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::engines::traits::{EngineError, FetchEngine, FetchRequest, FetchResponse, USER_AGENT};
use async_trait::async_trait;
use std::time::Instant;

/// 静态抓取引擎
///
/// 基于reqwest实现的基本HTTP抓取引擎，不执行JavaScript
pub struct ReqwestEngine;

#[async_trait]
impl FetchEngine for ReqwestEngine {
    /// 执行HTTP抓取
    ///
    /// # 参数
    ///
    /// * `request` - 抓取请求
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchResponse)` - 抓取响应
    /// * `Err(EngineError)` - 抓取过程中出现的错误
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        // Each request gets a fresh client for cookie isolation
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request.timeout)
            .cookie_store(true)
            .build()?;

        let start = Instant::now();
        let response = client.get(&request.url).send().await?;

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        // Ensure content_type is not empty
        let content_type = if content_type.trim().is_empty() {
            "text/html".to_string()
        } else {
            content_type
        };

        let body = response.bytes().await?.to_vec();

        Ok(FetchResponse {
            status_code,
            body,
            content_type,
            response_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// 计算对请求的支持分数
    ///
    /// 不需要JS渲染的请求返回100分；需要JS时作为低优先级回退
    fn support_score(&self, request: &FetchRequest) -> u8 {
        if request.render_js {
            return 10; // Low priority fallback when rendering is unavailable
        }
        100
    }

    /// 获取引擎名称
    fn name(&self) -> &'static str {
        "reqwest"
    }
}
