// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::{article_html, build_crawler};
use curatrs::domain::models::candidate::CandidateUrl;
use curatrs::utils::errors::FetchErrorKind;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html_response(title: &str, chars: usize) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(article_html(title, chars).into_bytes(), "text/html")
}

#[tokio::test]
async fn test_concurrency_does_not_change_results() {
    let server = MockServer::start().await;
    for i in 0..10 {
        Mock::given(method("GET"))
            .and(path(format!("/page/{}", i)))
            .respond_with(html_response(&format!("Page {}", i), 500))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let candidates: Vec<CandidateUrl> = (0..10)
        .map(|i| CandidateUrl::from_url(format!("{}/page/{}", server.uri(), i)))
        .chain(std::iter::once(CandidateUrl::from_url(format!(
            "{}/missing",
            server.uri()
        ))))
        .collect();

    let dir_serial = tempfile::tempdir().unwrap();
    let dir_parallel = tempfile::tempdir().unwrap();

    let serial = build_crawler(dir_serial.path(), 1, 0, false, None)
        .await
        .crawl(candidates.clone())
        .await
        .unwrap();
    let parallel = build_crawler(dir_parallel.path(), 12, 0, false, None)
        .await
        .crawl(candidates.clone())
        .await
        .unwrap();

    assert_eq!(serial.len(), candidates.len());
    assert_eq!(parallel.len(), candidates.len());

    // 结果按提交顺序还原，逐项比较终态
    for (a, b) in serial.iter().zip(parallel.iter()) {
        assert_eq!(a.url, b.url);
        assert_eq!(a.success, b.success);
        assert_eq!(a.status_code, b.status_code);
        assert_eq!(a.error, b.error);
        assert_eq!(a.body, b.body);
    }
}

#[tokio::test]
async fn test_server_errors_are_retried_then_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3) // 首次请求 + 2次重试
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let crawler = build_crawler(dir.path(), 1, 2, false, None).await;

    let results = crawler
        .crawl(vec![CandidateUrl::from_url(format!("{}/flaky", server.uri()))])
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
    assert_eq!(results[0].status_code, Some(500));
    assert_eq!(results[0].error, Some(FetchErrorKind::Network));
}

#[tokio::test]
async fn test_client_errors_fail_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1) // 不消耗重试
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let crawler = build_crawler(dir.path(), 1, 2, false, None).await;

    let results = crawler
        .crawl(vec![CandidateUrl::from_url(format!("{}/gone", server.uri()))])
        .await
        .unwrap();

    assert_eq!(results[0].error, Some(FetchErrorKind::Client));
    assert_eq!(results[0].status_code, Some(404));
}

#[tokio::test]
async fn test_malformed_url_is_terminal_client_error() {
    let dir = tempfile::tempdir().unwrap();
    let crawler = build_crawler(dir.path(), 1, 2, false, None).await;

    let results = crawler
        .crawl(vec![CandidateUrl::from_url("definitely not a url")])
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
    assert_eq!(results[0].error, Some(FetchErrorKind::Client));
}

#[tokio::test]
async fn test_robots_disallow_blocks_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"User-agent: *\nDisallow: /private\n".to_vec(), "text/plain"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/public/page"))
        .respond_with(html_response("Public", 300))
        .expect(1)
        .mount(&server)
        .await;
    // /private/page 故意不挂载：robots拒绝意味着不应发起抓取

    let dir = tempfile::tempdir().unwrap();
    let crawler = build_crawler(dir.path(), 2, 0, true, None).await;

    let results = crawler
        .crawl(vec![
            CandidateUrl::from_url(format!("{}/private/page", server.uri())),
            CandidateUrl::from_url(format!("{}/public/page", server.uri())),
        ])
        .await
        .unwrap();

    assert_eq!(results[0].error, Some(FetchErrorKind::RobotsDenied));
    assert!(results[1].success);
}

#[tokio::test]
async fn test_expired_deadline_abandons_queued_fetches() {
    let dir = tempfile::tempdir().unwrap();
    let crawler = build_crawler(dir.path(), 2, 2, false, Some(Duration::ZERO)).await;

    let results = crawler
        .crawl(vec![
            CandidateUrl::from_url("https://example.com/a"),
            CandidateUrl::from_url("https://example.com/b"),
        ])
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    for result in &results {
        assert!(!result.success);
        assert_eq!(result.error, Some(FetchErrorKind::Timeout));
    }
}

#[tokio::test]
async fn test_every_url_yields_exactly_one_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html_response("Ok", 100))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let crawler = build_crawler(dir.path(), 3, 0, false, None).await;

    let candidates = vec![
        CandidateUrl::from_url(format!("{}/ok", server.uri())),
        CandidateUrl::from_url("bad url"),
        CandidateUrl::from_url(format!("{}/ok", server.uri())),
    ];

    let results = crawler.crawl(candidates.clone()).await.unwrap();
    assert_eq!(results.len(), candidates.len());
    for (candidate, result) in candidates.iter().zip(results.iter()) {
        assert_eq!(result.candidate.url, candidate.url);
    }
}
