// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use std::path::{Component, Path};

pub fn format_file_size(size: u64) -> String {
    let units = ["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < units.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.1} {}", size, units[unit_index])
}

// 百分号解码。非法的转义序列原样保留，非 UTF-8 的结果有损转换
pub fn percent_decode(input: &str, plus_as_space: bool) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(h), Some(l)) => {
                        out.push(h * 16 + l);
                        i += 3;
                        continue;
                    }
                    _ => out.push(b'%'),
                }
            }
            b'+' if plus_as_space => out.push(b' '),
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

// 解析 application/x-www-form-urlencoded 正文，重复的键以后出现的为准
pub fn parse_form(body: &str) -> Vec<(String, String)> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (percent_decode(k, true), percent_decode(v, true)),
            None => (percent_decode(pair, true), String::new()),
        })
        .collect()
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// 用于生成 /files/ 链接的路径段编码
pub fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(b as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", b)),
        }
    }
    encoded
}

/// 静态资源路径只允许普通路径段，拒绝 `..`、根目录与盘符
pub fn is_safe_relative(path: &Path) -> bool {
    path.components()
        .all(|component| matches!(component, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_size() {
        let a = 9926;
        let b = 51800;
        assert_eq!(format_file_size(a), "9.7 KB".to_string());
        assert_eq!(format_file_size(b), "50.6 KB".to_string());
    }

    #[test]
    fn test_file_size_bytes() {
        assert_eq!(format_file_size(0), "0.0 B");
        assert_eq!(format_file_size(512), "512.0 B");
        assert_eq!(format_file_size(1023), "1023.0 B");
    }

    #[test]
    fn test_file_size_mb() {
        assert_eq!(format_file_size(1048576), "1.0 MB");
        assert_eq!(format_file_size(5242880), "5.0 MB");
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("my%20note.txt", false), "my note.txt");
        assert_eq!(percent_decode("a+b.txt", false), "a+b.txt");
        assert_eq!(percent_decode("a+b.txt", true), "a b.txt");
        assert_eq!(percent_decode("%E4%B8%AD.txt", false), "中.txt");
        assert_eq!(percent_decode("..%2Fetc.txt", false), "../etc.txt");
    }

    #[test]
    fn test_percent_decode_malformed() {
        assert_eq!(percent_decode("100%", false), "100%");
        assert_eq!(percent_decode("%zz.txt", false), "%zz.txt");
        assert_eq!(percent_decode("%4", false), "%4");
    }

    #[test]
    fn test_parse_form() {
        let pairs = parse_form("fileName=a.txt&fileContent=hello+world%21&flag");
        assert_eq!(
            pairs,
            vec![
                ("fileName".to_string(), "a.txt".to_string()),
                ("fileContent".to_string(), "hello world!".to_string()),
                ("flag".to_string(), String::new()),
            ]
        );
        assert!(parse_form("").is_empty());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#39;y&#39;"
        );
    }

    #[test]
    fn test_encode_path_segment() {
        assert_eq!(encode_path_segment("a b.txt"), "a%20b.txt");
        assert_eq!(encode_path_segment("note.txt"), "note.txt");
        assert_eq!(percent_decode(&encode_path_segment("中 #.txt"), false), "中 #.txt");
    }

    #[test]
    fn test_is_safe_relative() {
        assert!(is_safe_relative(Path::new("css/site.css")));
        assert!(!is_safe_relative(Path::new("../secret")));
        assert!(!is_safe_relative(Path::new("css/../../secret")));
        assert!(!is_safe_relative(Path::new("/etc/passwd")));
    }
}
