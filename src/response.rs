// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use crate::{
    exception::Exception,
    handler::Outcome,
    param::*,
    request::Request,
    view::HtmlBuilder,
};

use brotli::enc::{self, backward_references::BrotliEncoderParams};
use bytes::Bytes;
use chrono::prelude::*;
use flate2::{
    write::{DeflateEncoder, GzEncoder},
    Compression,
};
use log::{debug, error, warn};
use serde_derive::Serialize;

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

#[derive(Debug, Clone)]
pub struct Response {
    version: HttpVersion,
    status_code: u16,
    information: String,
    content_type: Option<String>,
    content_length: u64,
    date: DateTime<Utc>,
    content_encoding: Option<HttpEncoding>,
    server_name: String,
    allow: Option<Vec<HttpRequestMethod>>,
    content: Option<Bytes>,
}

/// 接口统一的响应信封
#[derive(Serialize)]
struct Envelope<'a> {
    message: &'a str,
    details: &'a str,
}

#[derive(Serialize)]
struct Listing<'a> {
    files: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Document<'a> {
    file_name: &'a str,
    file_content: &'a str,
}

impl Response {
    pub fn new() -> Self {
        Self {
            version: HttpVersion::V1_1,
            status_code: 200,
            information: "OK".to_string(),
            content_type: None,
            content_length: 0,
            date: Utc::now(),
            content_encoding: None,
            server_name: SERVER_NAME.to_string(),
            allow: None,
            content: None,
        }
    }

    fn with_body(
        code: u16,
        content_type: &str,
        data: Vec<u8>,
        accept_encoding: &[HttpEncoding],
        headonly: bool,
        id: u128,
    ) -> Self {
        let mut response = Self::new();
        response.set_code(code);
        response.content_type = Some(content_type.to_string());
        if headonly {
            response.content_length = data.len() as u64;
            return response;
        }

        response.content_encoding = match should_skip_compression(content_type) {
            true => None,
            false => decide_encoding(accept_encoding),
        };
        match response.content_encoding {
            Some(HttpEncoding::Gzip) => debug!("[ID{}]使用Gzip压缩编码", id),
            Some(HttpEncoding::Br) => debug!("[ID{}]使用Brotli压缩编码", id),
            Some(HttpEncoding::Deflate) => debug!("[ID{}]使用Deflate压缩编码", id),
            None => debug!("[ID{}]不进行压缩", id),
        };
        let content = match compress(&data, response.content_encoding) {
            Ok(c) => c,
            Err(e) => {
                error!("[ID{}]压缩响应失败: {}，返回未压缩内容", id, e);
                response.content_encoding = None;
                data
            }
        };
        response.content_length = content.len() as u64;
        response.content = Some(Bytes::from(content));
        response
    }

    pub fn from_json<T: serde::Serialize>(
        code: u16,
        value: &T,
        accept_encoding: &[HttpEncoding],
        headonly: bool,
        id: u128,
    ) -> Self {
        match serde_json::to_vec(value) {
            Ok(data) => Self::with_body(code, CONTENT_TYPE_JSON, data, accept_encoding, headonly, id),
            Err(e) => {
                error!("[ID{}]序列化JSON失败：{}", id, e);
                Self::with_body(500, CONTENT_TYPE_JSON, Vec::new(), accept_encoding, headonly, id)
            }
        }
    }

    pub fn from_html(
        code: u16,
        html: String,
        accept_encoding: &[HttpEncoding],
        headonly: bool,
        id: u128,
    ) -> Self {
        debug!("[ID{}]HTML原始大小: {} bytes", id, html.len());
        Self::with_body(code, CONTENT_TYPE_HTML, html.into_bytes(), accept_encoding, headonly, id)
    }

    /// `{"message": ..., "details": ...}` 形式的响应
    pub fn from_envelope(
        code: u16,
        message: &str,
        details: &str,
        accept_encoding: &[HttpEncoding],
        headonly: bool,
        id: u128,
    ) -> Self {
        let envelope = Envelope { message, details };
        Self::from_json(code, &envelope, accept_encoding, headonly, id)
    }

    /// 无法得到合法请求时（解析失败、报文过大）的响应
    pub fn from_exception(exception: Exception, id: u128) -> Self {
        let details = exception.to_string();
        Self::from_envelope(exception.status_code(), MESSAGE_ERROR, &details, &[], false, id)
    }

    pub fn response_options() -> Self {
        let mut response = Self::new();
        response.set_code(204);
        response.allow = Some(ALLOWED_METHODS.to_vec());
        response
    }

    pub fn response_invalid_route(request: &Request, id: u128) -> Self {
        Self::from_envelope(
            404,
            MESSAGE_INVALID_ROUTE,
            DETAILS_INVALID_ROUTE,
            request.accept_encoding(),
            request.is_head(),
            id,
        )
    }

    /// 将处理结果渲染为响应。`Accept: application/json` 时视图以 JSON 返回
    pub fn from_outcome(outcome: &Outcome, request: &Request, id: u128) -> Self {
        let accept_encoding = request.accept_encoding();
        let headonly = request.is_head();
        let json = request.wants_json();
        match outcome {
            Outcome::Listing(names) if json => {
                Self::from_json(200, &Listing { files: names }, accept_encoding, headonly, id)
            }
            Outcome::Listing(names) => {
                let html = HtmlBuilder::from_listing(names).build();
                Self::from_html(200, html, accept_encoding, headonly, id)
            }
            Outcome::Document { name, content } if json => {
                let document = Document {
                    file_name: name,
                    file_content: content,
                };
                Self::from_json(200, &document, accept_encoding, headonly, id)
            }
            Outcome::Document { name, content } => {
                let html = HtmlBuilder::from_document(name, content).build();
                Self::from_html(200, html, accept_encoding, headonly, id)
            }
            Outcome::CreateForm => {
                let html = HtmlBuilder::create_form().build();
                Self::from_html(200, html, accept_encoding, headonly, id)
            }
            Outcome::Success { status, details } => Self::from_envelope(
                *status,
                MESSAGE_SUCCESS,
                details,
                accept_encoding,
                headonly,
                id,
            ),
            Outcome::Rejected(rejection) => Self::from_envelope(
                rejection.status,
                MESSAGE_ERROR,
                &rejection.details,
                accept_encoding,
                headonly,
                id,
            ),
            Outcome::Options => Self::response_options(),
            Outcome::InvalidRoute => Self::response_invalid_route(request, id),
        }
    }

    /// 静态资源
    pub fn from_file(path: &Path, request: &Request, id: u128) -> Self {
        let mime = match path.extension().and_then(|e| e.to_str()) {
            Some(extension) => get_mime(extension),
            None => MIME_TYPES["_"],
        };
        debug!("[ID{}]静态文件{}，MIME类型: {}", id, path.display(), mime);
        match fs::read(path) {
            Ok(data) => Self::with_body(
                200,
                mime,
                data,
                request.accept_encoding(),
                request.is_head(),
                id,
            ),
            Err(e) => {
                warn!("[ID{}]无法读取静态文件{}：{}", id, path.display(), e);
                let exception = Exception::from(e);
                Self::from_envelope(
                    exception.status_code(),
                    MESSAGE_ERROR,
                    &exception.to_string(),
                    request.accept_encoding(),
                    request.is_head(),
                    id,
                )
            }
        }
    }

    fn set_code(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.information = match STATUS_CODES.get(&code) {
            Some(&information) => information.to_string(),
            None => {
                error!("非法的状态码：{}。这条错误说明代码编写出现了错误。", code);
                "Unknown".to_string()
            }
        };
        self
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let version: &str = match self.version {
            HttpVersion::V1_0 => "HTTP/1.0",
            HttpVersion::V1_1 => "HTTP/1.1",
        };
        let status_code: &str = &self.status_code.to_string();
        let information: &str = &self.information;
        let content_length: &str = &self.content_length.to_string();
        let date: &str = &format_date(&self.date);
        let server: &str = &self.server_name;

        let header = [
            version,
            " ",
            status_code,
            " ",
            information,
            CRLF,
            match &self.content_type {
                Some(t) => ["Content-Type: ", t, CRLF].concat(),
                None => "".to_string(),
            }
            .as_str(),
            match self.content_encoding {
                Some(e) => format!("Content-Encoding: {}{}", e, CRLF),
                None => "".to_string(),
            }
            .as_str(),
            "Content-Length: ",
            content_length,
            CRLF,
            "Date: ",
            date,
            CRLF,
            "Server: ",
            server,
            CRLF,
            match &self.allow {
                Some(a) => {
                    let methods: Vec<String> = a.iter().map(|m| m.to_string()).collect();
                    ["Allow: ", &methods.join(", "), CRLF].concat()
                }
                None => "".to_string(),
            }
            .as_str(),
            "Connection: close",
            CRLF,
            CRLF,
        ]
        .concat();
        [
            header.as_bytes(),
            match &self.content {
                Some(c) => c,
                None => b"",
            },
        ]
        .concat()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }

    pub fn get_content_length(&self) -> u64 {
        self.content_length
    }
}

// IMF-fixdate，例如 Sun, 06 Nov 1994 08:49:37 GMT
fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn compress(data: &[u8], mode: Option<HttpEncoding>) -> io::Result<Vec<u8>> {
    match mode {
        Some(HttpEncoding::Gzip) => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            encoder.finish()
        }
        Some(HttpEncoding::Deflate) => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            encoder.finish()
        }
        Some(HttpEncoding::Br) => {
            let params = BrotliEncoderParams::default();
            let mut output = Vec::new();
            enc::BrotliCompress(&mut io::Cursor::new(data), &mut output, &params)?;
            Ok(output)
        }
        None => Ok(data.to_vec()),
    }
}

fn should_skip_compression(mime_type: &str) -> bool {
    let skip_types = [
        "image/jpeg",
        "image/png",
        "image/gif",
        "image/webp",
        "image/x-icon",
        "font/woff",
        "font/woff2",
        "application/wasm",
    ];

    skip_types
        .iter()
        .any(|&skip_type| mime_type.starts_with(skip_type))
}

fn decide_encoding(accept_encoding: &[HttpEncoding]) -> Option<HttpEncoding> {
    if accept_encoding.contains(&HttpEncoding::Gzip) {
        Some(HttpEncoding::Gzip)
    } else if accept_encoding.contains(&HttpEncoding::Deflate) {
        Some(HttpEncoding::Deflate)
    } else if accept_encoding.contains(&HttpEncoding::Br) {
        Some(HttpEncoding::Br)
    } else {
        None
    }
}

fn get_mime(extension: &str) -> &'static str {
    let extension = extension.to_ascii_lowercase();
    match MIME_TYPES.get(extension.as_str()) {
        Some(v) => *v,
        None => MIME_TYPES["_"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::Rejection;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn request(raw: &str) -> Request {
        Request::try_from(raw.as_bytes(), 1).unwrap()
    }

    fn text(response: &Response) -> String {
        String::from_utf8_lossy(&response.as_bytes()).to_string()
    }

    fn body_json(response: &Response) -> serde_json::Value {
        serde_json::from_slice(response.content().unwrap()).unwrap()
    }

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(format_date(&date), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn test_compress_none() {
        let data = b"Hello, World!".to_vec();
        assert_eq!(compress(&data, None).unwrap(), data);
    }

    #[test]
    fn test_compress_gzip_round_trip() {
        let data = vec![b'A'; 10000];
        let compressed = compress(&data, Some(HttpEncoding::Gzip)).unwrap();
        assert!(compressed.len() < data.len());

        let mut decoded = Vec::new();
        GzDecoder::new(&compressed[..]).read_to_end(&mut decoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_compress_large_data() {
        let data = vec![b'A'; 10000];
        let result_deflate = compress(&data, Some(HttpEncoding::Deflate)).unwrap();
        let result_br = compress(&data, Some(HttpEncoding::Br)).unwrap();

        assert!(result_deflate.len() < data.len());
        assert!(result_br.len() < data.len());
    }

    #[test]
    fn test_decide_encoding() {
        assert_eq!(
            decide_encoding(&[HttpEncoding::Br, HttpEncoding::Gzip]),
            Some(HttpEncoding::Gzip)
        );
        assert_eq!(
            decide_encoding(&[HttpEncoding::Br, HttpEncoding::Deflate]),
            Some(HttpEncoding::Deflate)
        );
        assert_eq!(decide_encoding(&[HttpEncoding::Br]), Some(HttpEncoding::Br));
        assert_eq!(decide_encoding(&[]), None);
    }

    #[test]
    fn test_get_mime() {
        assert_eq!(get_mime("html"), "text/html;charset=utf-8");
        assert_eq!(get_mime("CSS"), "text/css;charset=utf-8");
        assert_eq!(get_mime("png"), "image/png");
        assert_eq!(get_mime("unknown"), "application/octet-stream");
    }

    #[test]
    fn test_response_status_code_various() {
        for (code, expected_info) in [
            (200, "OK"),
            (201, "Created"),
            (204, "No Content"),
            (400, "Bad Request"),
            (404, "Not Found"),
            (409, "Conflict"),
            (413, "Content Too Large"),
            (500, "Internal Server Error"),
        ] {
            let mut response = Response::new();
            response.set_code(code);
            assert_eq!(response.status_code(), code);
            assert_eq!(response.information(), expected_info);
        }
    }

    #[test]
    fn test_success_envelope() {
        let req = request("POST /create HTTP/1.1\r\n\r\n");
        let outcome = Outcome::Success {
            status: 201,
            details: "File created successfully",
        };
        let response = Response::from_outcome(&outcome, &req, 1);

        assert_eq!(response.status_code(), 201);
        assert_eq!(
            body_json(&response),
            serde_json::json!({"message": "Sucess", "details": "File created successfully"})
        );
        assert!(text(&response).contains("Content-Type: application/json"));
    }

    #[test]
    fn test_rejection_envelope() {
        let req = request("GET /files/x HTTP/1.1\r\n\r\n");
        let outcome = Outcome::Rejected(Rejection::new(400, "Invalid file name"));
        let response = Response::from_outcome(&outcome, &req, 1);

        assert_eq!(response.status_code(), 400);
        assert_eq!(
            body_json(&response),
            serde_json::json!({"message": "Error", "details": "Invalid file name"})
        );
    }

    #[test]
    fn test_invalid_route_envelope() {
        let req = request("GET /nope HTTP/1.1\r\n\r\n");
        let response = Response::from_outcome(&Outcome::InvalidRoute, &req, 1);

        assert_eq!(response.status_code(), 404);
        assert_eq!(body_json(&response)["message"], "Invalid route");
    }

    #[test]
    fn test_listing_negotiation() {
        let names = vec!["a.txt".to_string()];
        let outcome = Outcome::Listing(names);

        let html = Response::from_outcome(&outcome, &request("GET / HTTP/1.1\r\n\r\n"), 1);
        assert!(text(&html).contains("Content-Type: text/html"));
        assert!(text(&html).contains("/files/a.txt"));

        let json_req = request("GET / HTTP/1.1\r\nAccept: application/json\r\n\r\n");
        let json = Response::from_outcome(&outcome, &json_req, 1);
        assert_eq!(body_json(&json), serde_json::json!({"files": ["a.txt"]}));
    }

    #[test]
    fn test_document_json() {
        let outcome = Outcome::Document {
            name: "a.txt".to_string(),
            content: "hi".to_string(),
        };
        let req = request("GET /files/a.txt HTTP/1.1\r\nAccept: application/json\r\n\r\n");
        let response = Response::from_outcome(&outcome, &req, 1);

        assert_eq!(
            body_json(&response),
            serde_json::json!({"fileName": "a.txt", "fileContent": "hi"})
        );
    }

    #[test]
    fn test_options_response() {
        let response = Response::response_options();
        let text = text(&response);

        assert!(text.starts_with("HTTP/1.1 204 No Content"));
        assert!(text.contains("Allow: GET, HEAD, OPTIONS, POST, PATCH, DELETE"));
        assert!(text.contains("Content-Length: 0"));
    }

    #[test]
    fn test_head_request_response() {
        let req = request("HEAD / HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let response = Response::from_outcome(&Outcome::Listing(vec![]), &req, 1);
        let text = text(&response);

        assert!(text.starts_with("HTTP/1.1 200 OK"));
        assert!(text.contains("Server: shaneyale-fileserver"));
        assert!(response.get_content_length() > 0);
        assert!(!text.contains("<!DOCTYPE html>"));
    }

    #[test]
    fn test_gzip_response_header() {
        let req = request("GET / HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n");
        let response = Response::from_outcome(&Outcome::CreateForm, &req, 1);
        let text = text(&response);

        assert!(text.contains("Content-Encoding: gzip"));
        let mut decoded = String::new();
        GzDecoder::new(&response.content().unwrap()[..])
            .read_to_string(&mut decoded)
            .unwrap();
        assert!(decoded.contains("fileName"));
    }

    #[test]
    fn test_from_exception() {
        let response = Response::from_exception(Exception::RequestTooLarge, 1);
        assert_eq!(response.status_code(), 413);
        assert_eq!(body_json(&response)["message"], "Error");
    }
}
