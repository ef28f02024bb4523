// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::{article_html, test_settings};
use curatrs::application::use_cases::run_pipeline::RunPipelineUseCase;
use curatrs::domain::models::candidate::CandidateUrl;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html_response(title: &str, chars: usize) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(article_html(title, chars).into_bytes(), "text/html")
}

#[tokio::test]
async fn test_min_chars_filter_and_failed_url_scenario() {
    // 3个URL：正文1200字符、600字符、404；MIN_CONTENT_CHARS=800
    // 预期输出恰好1条（1200字符那条），统计：1条被过滤、1条失败、1条入选
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/long"))
        .respond_with(html_response("Long rust article", 1200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/short"))
        .respond_with(html_response("Short rust note", 600))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let cache_dir = tempfile::tempdir().unwrap();
    let mut settings = test_settings(cache_dir.path());
    settings.min_content_chars = 800;
    settings.final_n = 10;

    let use_case = RunPipelineUseCase::new(settings, false, None).await.unwrap();
    let result = use_case
        .execute(vec![
            CandidateUrl::from_url(format!("{}/long", server.uri())),
            CandidateUrl::from_url(format!("{}/short", server.uri())),
            CandidateUrl::from_url(format!("{}/missing", server.uri())),
        ])
        .await
        .unwrap();

    assert_eq!(result.items.len(), 1);
    assert!(result.items[0].item.url.ends_with("/long"));
    assert_eq!(result.items[0].item.char_count, 1200);

    assert_eq!(result.stats.discovered, 3);
    assert_eq!(result.stats.fetched, 2);
    assert_eq!(result.stats.failed, 1);
    assert_eq!(result.stats.extracted, 2);
    assert_eq!(result.stats.filtered, 1);
    assert_eq!(result.stats.deduped, 0);
    assert_eq!(result.stats.selected, 1);
}

#[tokio::test]
async fn test_warm_cache_issues_no_network_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_response("Cached rust article", 1000))
        .expect(1) // 第二次运行必须完全命中缓存
        .mount(&server)
        .await;

    let cache_dir = tempfile::tempdir().unwrap();
    let candidates = vec![CandidateUrl::from_url(format!("{}/a", server.uri()))];

    let cold = RunPipelineUseCase::new(test_settings(cache_dir.path()), false, None)
        .await
        .unwrap()
        .execute(candidates.clone())
        .await
        .unwrap();
    assert_eq!(cold.stats.cache_hits, 0);
    assert_eq!(cold.items.len(), 1);

    let warm = RunPipelineUseCase::new(test_settings(cache_dir.path()), false, None)
        .await
        .unwrap()
        .execute(candidates)
        .await
        .unwrap();
    assert_eq!(warm.stats.cache_hits, 1);
    assert_eq!(warm.items.len(), 1);

    // 冷热两次运行产出相同条目
    assert_eq!(warm.items[0].item, cold.items[0].item);
}

#[tokio::test]
async fn test_tracking_params_collapse_to_one_item() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/post"))
        .respond_with(html_response("A rust post", 900))
        .expect(1) // 规范化后同一URL只抓一次
        .mount(&server)
        .await;

    let cache_dir = tempfile::tempdir().unwrap();
    let use_case = RunPipelineUseCase::new(test_settings(cache_dir.path()), false, None)
        .await
        .unwrap();

    let result = use_case
        .execute(vec![
            CandidateUrl::from_url(format!("{}/post?utm_source=mail", server.uri())),
            CandidateUrl::from_url(format!("{}/post?utm_medium=social", server.uri())),
        ])
        .await
        .unwrap();

    assert_eq!(result.items.len(), 1);
    assert_eq!(result.stats.discovered, 2);
    assert_eq!(result.stats.deduped, 1);
    assert_eq!(result.stats.selected, 1);
}

#[tokio::test]
async fn test_final_n_one_selects_highest_scoring_item() {
    let server = MockServer::start().await;
    let pages: &[(&str, &str, usize)] = &[
        ("/p1", "Gardening tips for spring", 900),
        ("/p2", "Cooking with cast iron", 900),
        ("/p3", "A note about rust", 900),
        ("/p4", "rust pipelines deep dive with rust pipelines everywhere", 900),
        ("/p5", "Holiday photo roundup", 900),
    ];
    for (route, title, chars) in pages {
        Mock::given(method("GET"))
            .and(path(*route))
            .respond_with(html_response(title, *chars))
            .mount(&server)
            .await;
    }

    let cache_dir = tempfile::tempdir().unwrap();
    let mut settings = test_settings(cache_dir.path());
    settings.final_n = 1;
    settings.profile_text = "rust pipelines".to_string();

    let use_case = RunPipelineUseCase::new(settings, false, None).await.unwrap();
    let result = use_case
        .execute(
            pages
                .iter()
                .map(|(route, _, _)| CandidateUrl::from_url(format!("{}{}", server.uri(), route)))
                .collect(),
        )
        .await
        .unwrap();

    assert_eq!(result.items.len(), 1);
    assert!(result.items[0].item.url.ends_with("/p4"));
    assert_eq!(result.items[0].rank, 1);
}

#[tokio::test]
async fn test_empty_input_completes_with_empty_result() {
    let cache_dir = tempfile::tempdir().unwrap();
    let use_case = RunPipelineUseCase::new(test_settings(cache_dir.path()), false, None)
        .await
        .unwrap();

    let result = use_case.execute(Vec::new()).await.unwrap();
    assert!(result.items.is_empty());
    assert_eq!(result.stats.discovered, 0);
    assert_eq!(result.stats.selected, 0);
}

#[tokio::test]
async fn test_force_refresh_bypasses_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_response("Refreshed rust article", 1000))
        .expect(2) // 强制刷新时第二次运行仍然走网络
        .mount(&server)
        .await;

    let cache_dir = tempfile::tempdir().unwrap();
    let candidates = vec![CandidateUrl::from_url(format!("{}/a", server.uri()))];

    RunPipelineUseCase::new(test_settings(cache_dir.path()), false, None)
        .await
        .unwrap()
        .execute(candidates.clone())
        .await
        .unwrap();

    let refreshed = RunPipelineUseCase::new(test_settings(cache_dir.path()), true, None)
        .await
        .unwrap()
        .execute(candidates)
        .await
        .unwrap();
    assert_eq!(refreshed.stats.cache_hits, 0);
}

#[tokio::test]
async fn test_run_results_are_ordered_and_bounded() {
    let server = MockServer::start().await;
    let titles = [
        "Ownership and borrowing in practice",
        "Worker pools for rust crawlers",
        "Async runtimes compared",
        "Designing on-disk caches",
        "Profile driven ranking for rust feeds",
        "Deduplicating noisy web content",
    ];
    for (i, title) in titles.iter().enumerate() {
        Mock::given(method("GET"))
            .and(path(format!("/item/{}", i)))
            .respond_with(html_response(title, 900 + i * 10))
            .mount(&server)
            .await;
    }

    let cache_dir = tempfile::tempdir().unwrap();
    let mut settings = test_settings(cache_dir.path());
    settings.final_n = 4;

    let use_case = RunPipelineUseCase::new(settings, false, None).await.unwrap();
    let result = use_case
        .execute(
            (0..6)
                .map(|i| CandidateUrl::from_url(format!("{}/item/{}", server.uri(), i)))
                .collect(),
        )
        .await
        .unwrap();

    assert!(result.items.len() <= 4);
    let ranks: Vec<usize> = result.items.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, (1..=result.items.len()).collect::<Vec<_>>());

    // 得分降序
    for window in result.items.windows(2) {
        assert!(window[0].score >= window[1].score);
    }
}
