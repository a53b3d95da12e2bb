// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由处理函数
//!
//! 守卫全部通过后，每个处理函数只做一到两次存储调用，不重试。
//! 守卫之后发生的竞争（文件被并发删除、名字被抢先占用）由存储层以异常报告，
//! 在这里转换为 404 / 409。

use crate::{
    exception::Exception,
    guard::{guards_for, run_guards, Action, GuardContext, Rejection, MISSING_FILE_NAME},
    payload::{Body, Payload},
    request::Request,
    router::Route,
    store::FileStore,
};

use log::{error, info};

/// 处理结果，由 [`crate::response::Response::from_outcome`] 渲染
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Listing(Vec<String>),
    Document { name: String, content: String },
    CreateForm,
    Success { status: u16, details: &'static str },
    Rejected(Rejection),
    Options,
    InvalidRoute,
}

pub const CREATED: &str = "File created successfully";
pub const UPDATED: &str = "File updated successfully";
pub const DELETED: &str = "File deleted successfully";

/// 按路由执行守卫与处理函数
pub fn handle(id: u128, route: &Route, request: &Request, store: &dyn FileStore) -> Outcome {
    let body = request.body();
    match route {
        Route::Index => list(id, store),
        Route::CreateForm => Outcome::CreateForm,
        Route::Options => Outcome::Options,
        Route::Invalid => Outcome::InvalidRoute,
        Route::ShowFile(name) => guarded(id, Action::Read, Some(name.as_str()), body, store, |p| {
            read(id, store, name, p)
        }),
        Route::CreateFile => guarded(id, Action::Create, None, body, store, |p| {
            create(id, store, p)
        }),
        Route::UpdateFile(name) => guarded(id, Action::Update, Some(name.as_str()), body, store, |p| {
            update(id, store, name, p)
        }),
        Route::DeleteFile(name) => guarded(id, Action::Delete, Some(name.as_str()), body, store, |p| {
            delete(id, store, name, p)
        }),
    }
}

fn guarded<F>(
    id: u128,
    action: Action,
    filename: Option<&str>,
    body: &Body,
    store: &dyn FileStore,
    handler: F,
) -> Outcome
where
    F: FnOnce(&Payload) -> Result<Outcome, Rejection>,
{
    let ctx = GuardContext {
        action,
        filename,
        body,
        store,
    };
    let result = run_guards(id, &ctx, guards_for(action)).and_then(|()| {
        // 读取与删除不需要正文，格式错误的正文对它们没有影响
        let empty = Payload::default();
        handler(body.payload().unwrap_or(&empty))
    });
    match result {
        Ok(outcome) => outcome,
        Err(rejection) => Outcome::Rejected(rejection),
    }
}

/// 列出数据目录中的全部文件
pub fn list(id: u128, store: &dyn FileStore) -> Outcome {
    match store.list() {
        Ok(names) => {
            info!("[ID{}]列出{}个文件", id, names.len());
            Outcome::Listing(names)
        }
        Err(e) => {
            error!("[ID{}]无法列出数据目录：{}", id, e);
            Outcome::Rejected(Rejection::from_exception(e, Action::Read))
        }
    }
}

pub fn read(
    id: u128,
    store: &dyn FileStore,
    name: &str,
    _payload: &Payload,
) -> Result<Outcome, Rejection> {
    let content = store.read(name).map_err(|e| {
        error!("[ID{}]读取文件{}失败：{}", id, name, e);
        Rejection::from_exception(e, Action::Read)
    })?;
    Ok(Outcome::Document {
        name: name.to_string(),
        content,
    })
}

pub fn create(id: u128, store: &dyn FileStore, payload: &Payload) -> Result<Outcome, Rejection> {
    let (name, content) = match (payload.file_name.text(), payload.file_content.text()) {
        (Some(name), Some(content)) => (name, content),
        _ => return Err(Rejection::new(400, MISSING_FILE_NAME)),
    };
    store.create(name, content).map_err(|e| {
        error!("[ID{}]创建文件{}失败：{}", id, name, e);
        Rejection::from_exception(e, Action::Create)
    })?;
    info!("[ID{}]已创建文件{}（{}字节）", id, name, content.len());
    Ok(Outcome::Success {
        status: 201,
        details: CREATED,
    })
}

/// 只改名、改名并重写、只重写三种情况
pub fn update(
    id: u128,
    store: &dyn FileStore,
    name: &str,
    payload: &Payload,
) -> Result<Outcome, Rejection> {
    let fail = |e: Exception| {
        error!("[ID{}]修改文件{}失败：{}", id, name, e);
        Rejection::from_exception(e, Action::Update)
    };

    let mut current = name;
    if let Some(new_name) = payload.new_file_name.text() {
        store.rename(name, new_name).map_err(fail)?;
        info!("[ID{}]文件{}已重命名为{}", id, name, new_name);
        current = new_name;
    }
    if let Some(new_content) = payload.new_file_content.text() {
        store.write(current, new_content).map_err(fail)?;
        info!("[ID{}]文件{}的内容已重写（{}字节）", id, current, new_content.len());
    }
    Ok(Outcome::Success {
        status: 200,
        details: UPDATED,
    })
}

pub fn delete(
    id: u128,
    store: &dyn FileStore,
    name: &str,
    _payload: &Payload,
) -> Result<Outcome, Rejection> {
    store.delete(name).map_err(|e| {
        error!("[ID{}]删除文件{}失败：{}", id, name, e);
        Rejection::from_exception(e, Action::Delete)
    })?;
    info!("[ID{}]已删除文件{}", id, name);
    Ok(Outcome::Success {
        status: 200,
        details: DELETED,
    })
}
