// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// 从Content-Type头中提取charset标签
///
/// 例如 `text/html; charset=GBK` 返回 `Some("GBK")`
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').find_map(|part| {
        let part = part.trim();
        part.strip_prefix("charset=")
            .or_else(|| part.strip_prefix("CHARSET="))
            .map(|cs| cs.trim_matches('"').trim_matches('\''))
    })
}

/// 将响应体字节解码为UTF-8字符串
///
/// 顺序：Content-Type声明的charset → UTF-8直接解析 → 统计检测。
/// 对相同的输入字节输出是确定的
pub fn decode_body(body: &[u8], content_type: &str) -> String {
    // 1. 优先使用声明的charset
    if let Some(label) = charset_from_content_type(content_type) {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            let (text, _, _) = encoding.decode(body);
            return text.into_owned();
        }
    }

    // 2. 直接尝试UTF-8
    if let Ok(text) = std::str::from_utf8(body) {
        return text.to_string();
    }

    // 3. 统计检测
    let mut detector = EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charset_from_content_type() {
        assert_eq!(
            charset_from_content_type("text/html; charset=utf-8"),
            Some("utf-8")
        );
        assert_eq!(
            charset_from_content_type("text/html; charset=\"GBK\""),
            Some("GBK")
        );
        assert_eq!(charset_from_content_type("text/html"), None);
    }

    #[test]
    fn test_decode_utf8_body() {
        let body = "你好 world".as_bytes();
        assert_eq!(decode_body(body, "text/html"), "你好 world");
    }

    #[test]
    fn test_decode_declared_charset() {
        // "中文" in GBK
        let gbk_bytes: &[u8] = &[0xd6, 0xd0, 0xce, 0xc4];
        let decoded = decode_body(gbk_bytes, "text/html; charset=gbk");
        assert_eq!(decoded, "中文");
    }

    #[test]
    fn test_decode_detects_without_declaration() {
        let gbk_bytes: &[u8] = &[0xd6, 0xd0, 0xce, 0xc4, b' ', b'a', b'b', b'c'];
        let decoded = decode_body(gbk_bytes, "text/html");
        assert!(decoded.contains("abc"));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let body: &[u8] = &[0xff, 0xfe, b'h', b'i'];
        assert_eq!(decode_body(body, "text/html"), decode_body(body, "text/html"));
    }
}
