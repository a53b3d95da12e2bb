// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求体解析
//!
//! 请求体在进入路由守卫之前只解析一次，结果是强类型的 [`Body`]：
//! 要么是格式错误，要么是一个 [`Payload`]，其中每个已知字段都被归类为
//! 缺失、类型错误或字符串三种状态之一。守卫只读取这些分类结果，
//! 不再对原始 JSON 做“有没有这个属性”的临时判断。
//!
//! 支持两种编码：
//! - `application/json`（未声明 `Content-Type` 时也按 JSON 尝试）
//! - `application/x-www-form-urlencoded`（HTML 表单提交）
//!
//! 其他内容类型的正文被忽略，视为空对象。

use crate::util::parse_form;

use serde_json::{Map, Value};

/// 创建接口中的文件名字段
pub const FIELD_FILE_NAME: &str = "fileName";
/// 创建接口中的文件内容字段
pub const FIELD_FILE_CONTENT: &str = "fileContent";
/// 修改接口中的新文件名字段
pub const FIELD_NEW_FILE_NAME: &str = "newFileName";
/// 修改接口中的新文件内容字段
pub const FIELD_NEW_FILE_CONTENT: &str = "newFileContent";

/// 单个字段的分类结果
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Field {
    /// 请求体中没有这个键
    #[default]
    Absent,
    /// 键存在，但值不是字符串（包括 `null`）
    Mistyped,
    /// 键存在且值为字符串
    Text(String),
}

impl Field {
    fn classify(value: Option<&Value>) -> Self {
        match value {
            None => Field::Absent,
            Some(Value::String(s)) => Field::Text(s.clone()),
            Some(_) => Field::Mistyped,
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Field::Absent)
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Field::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// 所有路由可能用到的正文字段
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Payload {
    pub file_name: Field,
    pub file_content: Field,
    pub new_file_name: Field,
    pub new_file_content: Field,
}

impl Payload {
    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            file_name: Field::classify(object.get(FIELD_FILE_NAME)),
            file_content: Field::classify(object.get(FIELD_FILE_CONTENT)),
            new_file_name: Field::classify(object.get(FIELD_NEW_FILE_NAME)),
            new_file_content: Field::classify(object.get(FIELD_NEW_FILE_CONTENT)),
        }
    }
}

/// 解析后的请求体
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Fields(Payload),
    /// 声明为 JSON（或未声明类型）但无法解析
    Malformed,
}

impl Default for Body {
    fn default() -> Self {
        Body::Fields(Payload::default())
    }
}

impl Body {
    pub fn parse(content_type: Option<&str>, bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Body::default();
        }
        let content_type = content_type.map(|t| t.to_ascii_lowercase());
        match content_type.as_deref() {
            Some(t) if t.contains("application/x-www-form-urlencoded") => {
                let text = String::from_utf8_lossy(bytes);
                let mut object = Map::new();
                for (key, value) in parse_form(&text) {
                    object.insert(key, Value::String(value));
                }
                Body::Fields(Payload::from_object(&object))
            }
            Some(t) if t.contains("json") => Self::parse_json(bytes),
            None => Self::parse_json(bytes),
            Some(_) => Body::default(),
        }
    }

    fn parse_json(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(object)) => Body::Fields(Payload::from_object(&object)),
            // 数组、数字等合法 JSON 没有任何属性
            Ok(_) => Body::default(),
            Err(_) => Body::Malformed,
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Body::Fields(payload) => Some(payload),
            Body::Malformed => None,
        }
    }
}
