// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求处理模块
//!
//! 该模块负责将 TCP 流中读取的原始字节解析为强类型的 `Request` 结构体。它涵盖了：
//! 1. 请求行（Request-Line）的解析（方法、路径、版本）。
//! 2. 常用 HTTP 标头（Headers）的提取。
//! 3. 内容协商（Content Negotiation）相关的编码解析。
//! 4. 请求体（Body）的一次性解析，结果见 [`crate::payload::Body`]。

use crate::{exception::Exception, param::*, payload::Body};
use log::error;

/// 头部与正文之间的分隔符
const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// 表示一个完整的 HTTP 请求。
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP 请求方法
    method: HttpRequestMethod,
    /// 请求的资源路径（包含查询字符串，未解码）
    path: String,
    /// HTTP 协议版本
    version: HttpVersion,
    /// 客户端标识字符串
    user_agent: String,
    /// 客户端支持的压缩编码列表（按解析顺序排列）
    accept_encoding: Vec<HttpEncoding>,
    /// 客户端接受的内容类型（MIME）
    accept: Option<String>,
    /// 解析后的正文
    body: Body,
}

/// 在缓冲区中查找头部结束位置（`\r\n\r\n` 的起始下标）
pub fn find_head_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEAD_TERMINATOR.len())
        .position(|window| window == HEAD_TERMINATOR)
}

/// 头部到达后，根据 `Content-Length` 计算整个报文应有的字节数。
///
/// 头部尚不完整时返回 `Ok(None)`。声明的长度无法表示时返回 `RequestTooLarge`，
/// 分块编码（`Transfer-Encoding` 且没有 `Content-Length`）返回 `LengthRequired`。
pub fn expected_len(buffer: &[u8]) -> Result<Option<usize>, Exception> {
    let head_end = match find_head_end(buffer) {
        Some(end) => end,
        None => return Ok(None),
    };
    let head = String::from_utf8_lossy(&buffer[..head_end]);
    let mut content_length = None;
    let mut transfer_encoding = false;
    for (name, value) in head
        .split(CRLF)
        .skip(1)
        .filter_map(|line| line.split_once(':'))
    {
        let name = name.trim();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = Some(value.trim());
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            transfer_encoding = true;
        }
    }

    let content_length = match content_length {
        Some(value) => match value.parse::<u64>() {
            Ok(len) => usize::try_from(len).map_err(|_| Exception::RequestTooLarge)?,
            // 全是数字却超出 u64 的长度同样视为过大
            Err(_) if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) => {
                return Err(Exception::RequestTooLarge)
            }
            Err(_) => return Err(Exception::InvalidContentLength),
        },
        None if transfer_encoding => return Err(Exception::LengthRequired),
        None => 0,
    };
    head_end
        .checked_add(HEAD_TERMINATOR.len())
        .and_then(|len| len.checked_add(content_length))
        .map(Some)
        .ok_or(Exception::RequestTooLarge)
}

impl Request {
    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 逻辑步骤
    /// 1. 拆分头部与正文，验证头部是合法的 UTF-8 字符串。
    /// 2. 解析请求行：提取方法、路径和协议版本。
    /// 3. 迭代解析标头：识别 `User-Agent`, `Accept`, `Content-Type` 等字段。
    /// 4. 按 `Content-Type` 解析正文。
    ///
    /// # 参数
    /// * `buffer` - 从网络 Socket 读取的原始数据。
    /// * `id` - 全局请求 ID，用于在多线程环境下追踪日志。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let (head_bytes, body_bytes) = match find_head_end(buffer) {
            Some(end) => (&buffer[..end], &buffer[end + HEAD_TERMINATOR.len()..]),
            None => (buffer, &buffer[buffer.len()..]),
        };

        // 1. 头部必须是 UTF-8，正文交给 Body 自行处理
        let request_string = match std::str::from_utf8(head_bytes) {
            Ok(string) => string,
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let request_lines: Vec<&str> = request_string.split(CRLF).collect();

        // 2. 解析请求行 (e.g., "PATCH /files/a.txt HTTP/1.1")
        let first_line_parts: Vec<&str> = request_lines[0].split(' ').collect();

        if first_line_parts.len() < 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_lines[0]);
            return Err(Exception::UnSupportedRequestMethod);
        }

        // 解析方法名
        let method_str = first_line_parts[0].to_uppercase();
        let method = match method_str.as_str() {
            "GET" => HttpRequestMethod::Get,
            "HEAD" => HttpRequestMethod::Head,
            "OPTIONS" => HttpRequestMethod::Options,
            "POST" => HttpRequestMethod::Post,
            "PUT" => HttpRequestMethod::Put,
            "PATCH" => HttpRequestMethod::Patch,
            "DELETE" => HttpRequestMethod::Delete,
            _ => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, &method_str);
                return Err(Exception::UnSupportedRequestMethod);
            }
        };

        // 解析协议版本
        let version_str = first_line_parts[first_line_parts.len() - 1].to_uppercase();
        let version = match version_str.as_str() {
            "HTTP/1.1" => HttpVersion::V1_1,
            "HTTP/1.0" => HttpVersion::V1_0,
            _ => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, &version_str);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        // 解析路径（路径中出现未编码空格时通过 join 尝试恢复）
        let path = if first_line_parts.len() == 3 {
            first_line_parts[1].to_string()
        } else {
            first_line_parts[1..first_line_parts.len() - 1].join(" ")
        };

        // 3. 迭代各行解析 Headers，字段名大小写不敏感
        let mut user_agent = "".to_string();
        let mut accept_encoding = vec![];
        let mut accept = None;
        let mut content_type = None;
        let mut content_length = None;
        for line in request_lines.iter().skip(1) {
            let (name, value) = match line.split_once(':') {
                Some((n, v)) => (n.trim().to_lowercase(), v.trim()),
                None => continue,
            };
            match name.as_str() {
                "user-agent" => user_agent = value.to_string(),
                "accept" => accept = Some(value.to_string()),
                "content-type" => content_type = Some(value.to_string()),
                "content-length" => content_length = value.parse::<usize>().ok(),
                // 只要包含关键词即视为支持
                "accept-encoding" => {
                    if value.contains("gzip") {
                        accept_encoding.push(HttpEncoding::Gzip);
                    }
                    if value.contains("deflate") {
                        accept_encoding.push(HttpEncoding::Deflate);
                    }
                    if value.contains("br") {
                        accept_encoding.push(HttpEncoding::Br);
                    }
                }
                _ => {}
            }
        }

        // 4. 正文以 Content-Length 为准，多余的字节丢弃
        let body_bytes = match content_length {
            Some(len) if len < body_bytes.len() => &body_bytes[..len],
            _ => body_bytes,
        };
        let body = Body::parse(content_type.as_deref(), body_bytes);

        Ok(Self {
            method,
            path,
            version,
            user_agent,
            accept_encoding,
            accept,
            body,
        })
    }
}

// --- Getter 访问器实现 ---

impl Request {
    /// 获取 HTTP 协议版本
    pub fn version(&self) -> &HttpVersion {
        &self.version
    }

    /// 获取请求路径（含查询参数）
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 获取请求方法
    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    /// 获取用户代理字符串
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// 获取客户端支持的压缩算法列表
    pub fn accept_encoding(&self) -> &[HttpEncoding] {
        &self.accept_encoding
    }

    /// 获取客户端接受的文件 MIME 类型
    pub fn accept(&self) -> Option<&String> {
        self.accept.as_ref()
    }

    /// 获取解析后的正文
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// 客户端是否期望 JSON 形式的视图
    pub fn wants_json(&self) -> bool {
        self.accept
            .as_ref()
            .map_or(false, |a| a.contains(CONTENT_TYPE_JSON))
    }

    /// HEAD 请求只返回头部
    pub fn is_head(&self) -> bool {
        self.method == HttpRequestMethod::Head
    }
}
