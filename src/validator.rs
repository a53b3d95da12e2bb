// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 文件名校验
//!
//! 数据目录是扁平的，文件名即资源标识，因此文件名必须：
//! 1. 非空；
//! 2. 不包含 `< > : " / \ | ? *` 以及任何控制字符（0x00-0x1F）；
//! 3. 以 `.扩展名` 结尾，扩展名由一个或多个除 `.`、`/`、`\` 以外的字符组成。
//!
//! 校验不做任何规范化（大小写、Unicode、首尾空白），调用方需要自行留意。

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// 非法字符集合
    static ref INVALID_CHARS: Regex = Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).unwrap();
    /// 末尾的扩展名
    static ref EXTENSION: Regex = Regex::new(r"\.[^\\/.]+$").unwrap();
}

/// 判断候选文件名是否合法
pub fn is_valid_name(candidate: &str) -> bool {
    if candidate.is_empty() {
        return false;
    }
    if INVALID_CHARS.is_match(candidate) {
        return false;
    }
    EXTENSION.is_match(candidate)
}

/// 可能缺失的文件名（例如请求体中为 `null` 或不是字符串），缺失即非法
pub fn is_valid_name_opt(candidate: Option<&str>) -> bool {
    candidate.map_or(false, is_valid_name)
}
