// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由守卫
//!
//! 每个文件路由在执行核心动作之前，按固定顺序运行一组守卫。
//! 守卫是“判定 + 应答”对：判定通过则继续，否则立即给出带状态码与说明的 [`Rejection`]。
//!
//! - 守卫只读，不修改任何状态；
//! - 第一个失败的守卫决定返回给客户端的错误，因此顺序本身是接口约定的一部分；
//! - 状态码统一：格式错误 400，资源不存在 404，名称冲突 409。
//!
//! | 路由 | 守卫顺序 |
//! |---|---|
//! | 读取 | 文件名格式、必须存在 |
//! | 创建 | 正文格式、`fileName` 非空、`fileContent` 存在、文件名格式、必须不存在、内容为字符串 |
//! | 修改 | 文件名格式、必须存在、正文格式、至少一个修改项、新文件名格式、新文件名未占用、新内容为字符串 |
//! | 删除 | 文件名格式、必须存在 |

use crate::{
    exception::Exception,
    payload::{Body, Field, Payload},
    store::FileStore,
    validator::{is_valid_name, is_valid_name_opt},
};

use log::{debug, error};

/// 路由正在执行的动作，决定部分错误文案
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

/// 守卫失败时的终止应答
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub status: u16,
    pub details: String,
}

impl Rejection {
    pub fn new(status: u16, details: &str) -> Self {
        Self {
            status,
            details: details.to_string(),
        }
    }

    /// 由存储层异常构造应答，用于守卫之后的竞争情况
    pub fn from_exception(exception: Exception, action: Action) -> Self {
        match exception {
            Exception::FileNotFound => Self::new(404, not_found_details(action)),
            Exception::FileAlreadyExists => Self::new(409, conflict_details(action)),
            other => Self {
                status: other.status_code(),
                details: other.to_string(),
            },
        }
    }
}

/// 守卫可见的请求信息
pub struct GuardContext<'a> {
    pub action: Action,
    /// 路径参数 `:filename`（已解码）
    pub filename: Option<&'a str>,
    pub body: &'a Body,
    pub store: &'a dyn FileStore,
}

impl GuardContext<'_> {
    fn payload(&self) -> Result<&Payload, Rejection> {
        self.body
            .payload()
            .ok_or_else(|| Rejection::new(400, MALFORMED_BODY))
    }

    fn exists(&self, name: &str) -> Result<bool, Rejection> {
        self.store.exists(name).map_err(|e| {
            error!("查询文件{}是否存在时出错：{}", name, e);
            Rejection::from_exception(e, self.action)
        })
    }
}

pub type Check = fn(&GuardContext<'_>) -> Result<(), Rejection>;

/// 一个具名的守卫
pub struct Guard {
    pub name: &'static str,
    pub check: Check,
}

/// 按顺序运行守卫，遇到第一个失败即返回
pub fn run_guards(id: u128, ctx: &GuardContext<'_>, guards: &[Guard]) -> Result<(), Rejection> {
    for guard in guards {
        if let Err(rejection) = (guard.check)(ctx) {
            debug!(
                "[ID{}]守卫{}拒绝了请求：{} {}",
                id, guard.name, rejection.status, rejection.details
            );
            return Err(rejection);
        }
    }
    debug!("[ID{}]{}个守卫全部通过", id, guards.len());
    Ok(())
}

pub const INVALID_FILE_NAME: &str = "Invalid file name";
pub const INVALID_NEW_FILE_NAME: &str = "Invalid new file name";
pub const MALFORMED_BODY: &str = "Invalid JSON structure";
pub const MISSING_FILE_NAME: &str = "The request body should be in JSON format and contains a 'fileName' property, which represents the file name that you want to create";
pub const MISSING_FILE_CONTENT: &str = "The request body should be in JSON format and contains a 'fileContent' property, which represents the content of file that you want to create";
pub const FILE_CONTENT_NOT_TEXT: &str =
    "Invalid file content, make sure that the file content is 'string'";
pub const NOTHING_TO_UPDATE: &str = "Your body request should be in JSON format and contains either 'newFileName' property or 'newFileContent' property or both of them";
pub const NEW_FILE_CONTENT_NOT_TEXT: &str =
    "Invalid new file content, make sure that the new file content is 'string'";
pub const CREATE_CONFLICT: &str =
    "The file that you are trying to create already exists, please enter a different name";
pub const RENAME_CONFLICT: &str =
    "You are trying to change the file name to one that already exists";
pub const READ_NOT_FOUND: &str =
    "The file that you are trying to fetch does not exist in the data directory, please check again";
pub const UPDATE_NOT_FOUND: &str =
    "The file that you are trying to modify does not exist in the data directory, please check again";
pub const DELETE_NOT_FOUND: &str =
    "The file that you are trying to delete does not exist in the data directory";

fn not_found_details(action: Action) -> &'static str {
    match action {
        Action::Read => READ_NOT_FOUND,
        Action::Update => UPDATE_NOT_FOUND,
        Action::Delete | Action::Create => DELETE_NOT_FOUND,
    }
}

fn conflict_details(action: Action) -> &'static str {
    match action {
        Action::Update => RENAME_CONFLICT,
        _ => CREATE_CONFLICT,
    }
}

// --- 判定函数 ---

fn path_name_is_valid(ctx: &GuardContext<'_>) -> Result<(), Rejection> {
    match is_valid_name_opt(ctx.filename) {
        true => Ok(()),
        false => Err(Rejection::new(400, INVALID_FILE_NAME)),
    }
}

fn target_exists(ctx: &GuardContext<'_>) -> Result<(), Rejection> {
    let name = ctx.filename.unwrap_or_default();
    match ctx.exists(name)? {
        true => Ok(()),
        false => Err(Rejection::new(404, not_found_details(ctx.action))),
    }
}

fn body_is_well_formed(ctx: &GuardContext<'_>) -> Result<(), Rejection> {
    ctx.payload().map(|_| ())
}

fn file_name_is_present(ctx: &GuardContext<'_>) -> Result<(), Rejection> {
    match &ctx.payload()?.file_name {
        Field::Absent => Err(Rejection::new(400, MISSING_FILE_NAME)),
        Field::Text(name) if name.is_empty() => Err(Rejection::new(400, MISSING_FILE_NAME)),
        _ => Ok(()),
    }
}

fn file_content_is_present(ctx: &GuardContext<'_>) -> Result<(), Rejection> {
    match ctx.payload()?.file_content.is_present() {
        true => Ok(()),
        false => Err(Rejection::new(400, MISSING_FILE_CONTENT)),
    }
}

fn file_name_is_valid(ctx: &GuardContext<'_>) -> Result<(), Rejection> {
    match is_valid_name_opt(ctx.payload()?.file_name.text()) {
        true => Ok(()),
        false => Err(Rejection::new(400, INVALID_FILE_NAME)),
    }
}

fn file_name_is_free(ctx: &GuardContext<'_>) -> Result<(), Rejection> {
    let name = ctx.payload()?.file_name.text().unwrap_or_default();
    match ctx.exists(name)? {
        true => Err(Rejection::new(409, CREATE_CONFLICT)),
        false => Ok(()),
    }
}

fn file_content_is_text(ctx: &GuardContext<'_>) -> Result<(), Rejection> {
    match ctx.payload()?.file_content {
        Field::Text(_) => Ok(()),
        _ => Err(Rejection::new(400, FILE_CONTENT_NOT_TEXT)),
    }
}

fn change_is_requested(ctx: &GuardContext<'_>) -> Result<(), Rejection> {
    let payload = ctx.payload()?;
    match payload.new_file_name.is_present() || payload.new_file_content.is_present() {
        true => Ok(()),
        false => Err(Rejection::new(400, NOTHING_TO_UPDATE)),
    }
}

fn new_name_is_valid(ctx: &GuardContext<'_>) -> Result<(), Rejection> {
    let new_name = &ctx.payload()?.new_file_name;
    if !new_name.is_present() {
        return Ok(());
    }
    match new_name.text().map_or(false, is_valid_name) {
        true => Ok(()),
        false => Err(Rejection::new(400, INVALID_NEW_FILE_NAME)),
    }
}

fn new_name_is_free(ctx: &GuardContext<'_>) -> Result<(), Rejection> {
    let new_name = match ctx.payload()?.new_file_name.text() {
        Some(name) => name,
        None => return Ok(()),
    };
    match ctx.exists(new_name)? {
        true => Err(Rejection::new(409, RENAME_CONFLICT)),
        false => Ok(()),
    }
}

fn new_content_is_text(ctx: &GuardContext<'_>) -> Result<(), Rejection> {
    match ctx.payload()?.new_file_content {
        Field::Mistyped => Err(Rejection::new(400, NEW_FILE_CONTENT_NOT_TEXT)),
        _ => Ok(()),
    }
}

// --- 各路由的守卫序列 ---

pub static READ_GUARDS: &[Guard] = &[
    Guard { name: "name-format", check: path_name_is_valid },
    Guard { name: "must-exist", check: target_exists },
];

pub static CREATE_GUARDS: &[Guard] = &[
    Guard { name: "body-well-formed", check: body_is_well_formed },
    Guard { name: "file-name-present", check: file_name_is_present },
    Guard { name: "file-content-present", check: file_content_is_present },
    Guard { name: "name-format", check: file_name_is_valid },
    Guard { name: "must-not-exist", check: file_name_is_free },
    Guard { name: "content-is-string", check: file_content_is_text },
];

pub static UPDATE_GUARDS: &[Guard] = &[
    Guard { name: "name-format", check: path_name_is_valid },
    Guard { name: "must-exist", check: target_exists },
    Guard { name: "body-well-formed", check: body_is_well_formed },
    Guard { name: "change-requested", check: change_is_requested },
    Guard { name: "new-name-format", check: new_name_is_valid },
    Guard { name: "new-name-must-not-exist", check: new_name_is_free },
    Guard { name: "new-content-is-string", check: new_content_is_text },
];

pub static DELETE_GUARDS: &[Guard] = &[
    Guard { name: "name-format", check: path_name_is_valid },
    Guard { name: "must-exist", check: target_exists },
];

/// 动作对应的守卫序列
pub fn guards_for(action: Action) -> &'static [Guard] {
    match action {
        Action::Read => READ_GUARDS,
        Action::Create => CREATE_GUARDS,
        Action::Update => UPDATE_GUARDS,
        Action::Delete => DELETE_GUARDS,
    }
}
