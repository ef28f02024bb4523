// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;
use url::Url;

/// URL规范化错误
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("URL解析失败: {0}")]
    Parse(#[from] url::ParseError),

    #[error("不支持的scheme: {0}")]
    UnsupportedScheme(String),
}

/// 跟踪类查询参数，规范化时剔除
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "gclid",
    "fbclid",
    "igshid",
    "mc_cid",
    "mc_eid",
    "ref",
    "ref_src",
];

fn is_tracking_param(name: &str) -> bool {
    TRACKING_PARAMS.contains(&name) || name.starts_with("utm_")
}

/// 规范化URL，作为缓存键与去重的标准形式
///
/// 规则：scheme/host小写、去默认端口、去fragment、
/// 剔除跟踪参数、剩余查询参数按键值排序、去除末尾斜杠。
/// 幂等：对结果再次规范化得到相同字符串
pub fn normalize_url(raw: &str) -> Result<String, NormalizeError> {
    let mut url = Url::parse(raw.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(NormalizeError::UnsupportedScheme(other.to_string())),
    }

    url.set_fragment(None);

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &pairs {
            serializer.append_pair(k, v);
        }
        url.set_query(Some(&serializer.finish()));
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    Ok(url.to_string())
}

/// 提取展示用域名（去掉www.前缀）
pub fn domain_of(url_str: &str) -> String {
    match Url::parse(url_str) {
        Ok(url) => {
            let host = url.host_str().unwrap_or_default();
            host.strip_prefix("www.").unwrap_or(host).to_string()
        }
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_url("HTTPS://Example.COM/Path/?b=2&a=1#frag").unwrap();
        let twice = normalize_url(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_lowers_scheme_and_host() {
        let normalized = normalize_url("HTTP://EXAMPLE.com/Page").unwrap();
        assert_eq!(normalized, "http://example.com/Page");
    }

    #[test]
    fn test_normalize_strips_tracking_params() {
        let a = normalize_url("https://example.com/post?utm_source=x&utm_medium=y").unwrap();
        let b = normalize_url("https://example.com/post?fbclid=abc").unwrap();
        assert_eq!(a, "https://example.com/post");
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalize_sorts_query_pairs() {
        let a = normalize_url("https://example.com/s?q=rust&page=2").unwrap();
        let b = normalize_url("https://example.com/s?page=2&q=rust").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "https://example.com/s?page=2&q=rust");
    }

    #[test]
    fn test_normalize_strips_fragment_and_trailing_slash() {
        let normalized = normalize_url("https://example.com/a/b/#section").unwrap();
        assert_eq!(normalized, "https://example.com/a/b");
    }

    #[test]
    fn test_normalize_keeps_root_path() {
        let normalized = normalize_url("https://example.com").unwrap();
        assert_eq!(normalized, "https://example.com/");
    }

    #[test]
    fn test_normalize_drops_default_port() {
        let normalized = normalize_url("https://example.com:443/x").unwrap();
        assert_eq!(normalized, "https://example.com/x");
    }

    #[test]
    fn test_normalize_rejects_bad_input() {
        assert!(normalize_url("not a url").is_err());
        assert!(matches!(
            normalize_url("ftp://example.com/file"),
            Err(NormalizeError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("https://www.example.com/a"), "example.com");
        assert_eq!(domain_of("https://blog.example.com/a"), "blog.example.com");
        assert_eq!(domain_of("garbage"), "");
    }
}
