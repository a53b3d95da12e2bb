// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由表
//!
//! | 方法 | 路径 | 路由 |
//! |---|---|---|
//! | GET/HEAD | `/` | 文件列表 |
//! | GET/HEAD | `/create` | 创建表单 |
//! | POST | `/create` | 创建文件 |
//! | GET/HEAD | `/files/:filename` | 查看文件 |
//! | PATCH | `/files/:filename` | 修改文件 |
//! | DELETE | `/files/:filename` | 删除文件 |
//! | OPTIONS | 以上任一路径 | 预检 |
//!
//! 查询字符串被忽略，末尾的单个 `/` 被容忍，`:filename` 只匹配一个路径段并做百分号解码。

use crate::{param::HttpRequestMethod, util::percent_decode};

use HttpRequestMethod::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Index,
    CreateForm,
    CreateFile,
    ShowFile(String),
    UpdateFile(String),
    DeleteFile(String),
    Options,
    Invalid,
}

/// 去掉查询字符串与片段，保留原始（未解码）路径
pub fn strip_query(target: &str) -> &str {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    &target[..end]
}

pub fn route(method: HttpRequestMethod, target: &str) -> Route {
    let mut path = strip_query(target);
    if path.len() > 1 && path.ends_with('/') {
        path = &path[..path.len() - 1];
    }

    let readable = matches!(method, Get | Head);
    match path {
        "/" | "/create" if method == Options => Route::Options,
        "/" if readable => Route::Index,
        "/create" if readable => Route::CreateForm,
        "/create" if method == Post => Route::CreateFile,
        _ => match path.strip_prefix("/files/") {
            Some(segment) if !segment.is_empty() && !segment.contains('/') => {
                let filename = percent_decode(segment, false);
                match method {
                    Options => Route::Options,
                    Get | Head => Route::ShowFile(filename),
                    Patch => Route::UpdateFile(filename),
                    Delete => Route::DeleteFile(filename),
                    _ => Route::Invalid,
                }
            }
            _ => Route::Invalid,
        },
    }
}
