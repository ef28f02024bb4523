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

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// 管道配置设置
///
/// 从环境变量加载一次，之后作为不可变值显式传入各组件构造函数，
/// 没有环境全局状态
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 抓取工作池大小 (CRAWL_CONCURRENCY)
    pub crawl_concurrency: usize,
    /// 单次抓取超时，毫秒 (CRAWL_TIMEOUT_MS)
    pub crawl_timeout_ms: u64,
    /// 是否启用JavaScript渲染 (CRAWL_RENDER_JS)
    pub crawl_render_js: bool,
    /// 抓取缓存根目录 (CRAWL_CACHE_DIR)
    pub crawl_cache_dir: String,
    /// 是否遵守robots.txt (CRAWL_OBEY_ROBOTS)
    pub crawl_obey_robots: bool,
    /// 瞬时失败最大重试次数 (CRAWL_MAX_RETRIES)
    pub crawl_max_retries: u32,
    /// 缓存条目最大年龄，秒；缺省表示永不过期 (CACHE_MAX_AGE_SECS)
    pub cache_max_age_secs: Option<u64>,
    /// 最终输出条目上限 (FINAL_N)
    pub final_n: usize,
    /// 正文最小字符数过滤阈值 (MIN_CONTENT_CHARS)
    pub min_content_chars: usize,
    /// 兴趣画像自由文本 (PROFILE_TEXT)
    pub profile_text: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，所有键都有默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("crawl_concurrency", 12)?
            .set_default("crawl_timeout_ms", 30_000)?
            .set_default("crawl_render_js", true)?
            .set_default("crawl_cache_dir", ".crawl_cache")?
            .set_default("crawl_obey_robots", true)?
            .set_default("crawl_max_retries", 2)?
            .set_default("final_n", 40)?
            .set_default("min_content_chars", 800)?
            .set_default("profile_text", "")?
            .add_source(Environment::default());

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
