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

use clap::Parser;
use curatrs::application::use_cases::run_pipeline::RunPipelineUseCase;
use curatrs::config::settings::Settings;
use curatrs::infrastructure::storage;
use curatrs::utils::telemetry;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// 命令行参数
///
/// 一次调用消费候选URL列表，产出精选结果与运行统计。
/// 完成的运行（即使选中0条）退出码为0，仅致命设置错误非0退出
#[derive(Parser, Debug)]
#[command(name = "curatrs", version, about = "抓取-提取-精选内容管道")]
struct Cli {
    /// 候选URL列表路径 (JSONL，每行 {url, sourceType, discoveredMeta})
    #[arg(long)]
    input: PathBuf,

    /// 精选结果输出路径 (JSONL)
    #[arg(long)]
    output: PathBuf,

    /// 运行统计输出路径 (JSON)，缺省为输出路径加.stats.json后缀
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Markdown摘要输出路径（可选）
    #[arg(long)]
    markdown: Option<PathBuf>,

    /// 跳过缓存，强制重新抓取所有URL
    #[arg(long)]
    force_refresh: bool,

    /// 抓取阶段的全局截止时间，秒
    #[arg(long)]
    deadline_secs: Option<u64>,
}

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并执行一次管道运行
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting curatrs...");

    let cli = Cli::parse();

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    // 3. Read candidate list
    let candidates = storage::read_candidates(&cli.input).await?;
    info!("Loaded {} candidates from {}", candidates.len(), cli.input.display());

    // 4. Assemble and run the pipeline
    let use_case = RunPipelineUseCase::new(
        settings,
        cli.force_refresh,
        cli.deadline_secs.map(Duration::from_secs),
    )
    .await?;
    let result = use_case.execute(candidates).await?;

    // 5. Persist outputs
    storage::write_results(&cli.output, &result).await?;

    let stats_path = cli.stats.unwrap_or_else(|| {
        let mut path = cli.output.clone();
        path.set_extension("stats.json");
        path
    });
    storage::write_stats(&stats_path, &result.stats).await?;

    if let Some(markdown_path) = &cli.markdown {
        storage::write_markdown(markdown_path, &result).await?;
    }

    // 前5名打印到日志，便于快速检查
    for ranked in result.items.iter().take(5) {
        info!(
            "{:>2}. {:.3}  {}  ({})",
            ranked.rank, ranked.score, ranked.item.title, ranked.item.url
        );
    }

    info!(
        "Done. selected={} -> {}",
        result.stats.selected,
        cli.output.display()
    );

    Ok(())
}
