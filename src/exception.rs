// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了文件服务在请求处理生命周期中可能抛出的各类异常情况。
//!
//! ## 设计意图
//! - **错误分类**：涵盖了协议解析错误与存储层（数据目录）错误。
//! - **语义映射**：每个变体都对应了特定的 HTTP 状态码，见 [`Exception::status_code`]。
//! - **用户友好**：通过实现 `std::fmt::Display`，确保错误信息可以被安全地记录到日志。

use std::{fmt, io};

/// 服务器处理请求过程中发生的异常类型。
///
/// 该枚举通常作为 `Result` 的 `Err` 部分返回，用于指示处理失败的具体原因。
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Exception {
    /// 请求行或请求头无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 请求行格式不完整，或使用了服务器不认识的 HTTP 方法。
    UnSupportedRequestMethod,
    /// 客户端使用了服务器不支持的 HTTP 协议版本（例如：HTTP/2.0）。
    UnsupportedHttpVersion,
    /// 请求报文（头部 + 正文）超过了 `max_request_size`。对应 `413`。
    RequestTooLarge,
    /// 数据目录中不存在所请求的文件。对应 `404 Not Found`。
    FileNotFound,
    /// 目标文件名已被占用。对应 `409 Conflict`。
    FileAlreadyExists,
    /// `Content-Length` 不是合法的十进制数。对应 `400 Bad Request`。
    InvalidContentLength,
    /// 正文使用了分块编码且没有 `Content-Length`。对应 `411 Length Required`。
    LengthRequired,
    /// 其余的文件系统错误（权限不足、磁盘已满等）。对应 `500`。
    Storage(io::ErrorKind),
}

use Exception::*;

impl Exception {
    /// 异常对应的 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            RequestIsNotUtf8
            | UnSupportedRequestMethod
            | UnsupportedHttpVersion
            | InvalidContentLength => 400,
            LengthRequired => 411,
            RequestTooLarge => 413,
            FileNotFound => 404,
            FileAlreadyExists => 409,
            Storage(_) => 500,
        }
    }
}

impl From<io::Error> for Exception {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => FileNotFound,
            io::ErrorKind::AlreadyExists => FileAlreadyExists,
            kind => Storage(kind),
        }
    }
}

/// 为 `Exception` 实现 `Display` 特性，使其支持字符串格式化输出。
impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request head can't be parsed in UTF-8"),
            UnSupportedRequestMethod => write!(f, "Unsupported request method"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            RequestTooLarge => write!(f, "Request is too large (413)"),
            FileNotFound => write!(f, "File not found (404)"),
            FileAlreadyExists => write!(f, "File already exists (409)"),
            InvalidContentLength => write!(f, "Content-Length header is not a valid number"),
            LengthRequired => write!(
                f,
                "Chunked request bodies are not supported, please send a Content-Length header"
            ),
            Storage(kind) => write!(f, "Storage error: {}", kind),
        }
    }
}
