// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use crate::util::{encode_path_segment, escape_html, format_file_size};

const BASE_CSS: &str = r"
            body {
                width: 40em;
                margin: 0 auto;
                font-family: Tahoma, Verdana, Arial, sans-serif;
            }
            ";

pub struct HtmlBuilder {
    title: String,
    css: String,
    script: String,
    body: String,
}

impl HtmlBuilder {
    pub fn from_listing(names: &[String]) -> Self {
        let mut sorted: Vec<&String> = names.iter().collect();
        sorted.sort();

        let mut body = String::new();
        body.push_str("<h1>文件列表</h1><hr>");
        if sorted.is_empty() {
            body.push_str("<p>数据目录中还没有文件。</p>");
        } else {
            body.push_str("<table>");
            for name in sorted {
                body.push_str(&format!(
                    r#"
                    <tr>
                        <td><a href="/files/{}">{}</a></td>
                    </tr>
                    "#,
                    encode_path_segment(name),
                    escape_html(name)
                ));
            }
            body.push_str("</table>");
        }
        body.push_str(r#"<hr><p><a href="/create">新建文件</a></p>"#);

        let css = [
            BASE_CSS,
            r"
            table {
                border-collapse: collapse;
                width: 100%;
            }

            td {
                padding: 8px;
                border: none; /* 隐藏单元格边框 */
            }",
        ]
        .concat();
        Self {
            title: "文件列表".to_string(),
            css,
            script: "".to_string(),
            body,
        }
    }

    pub fn from_document(name: &str, content: &str) -> Self {
        let escaped_name = escape_html(name);
        let body = format!(
            r#"
            <h1>{name}</h1>
            <p>大小：{size}</p>
            <hr>
            <textarea id="content" rows="20">{content}</textarea>
            <p>
                <input id="new-name" value="{name}">
                <button onclick="saveFile()">保存</button>
                <button onclick="deleteFile()">删除</button>
            </p>
            <p id="status"></p>
            <p><a href="/">返回列表</a></p>
            "#,
            name = escaped_name,
            size = format_file_size(content.len() as u64),
            content = escape_html(content),
        );
        // 名字经过 JSON 编码后嵌入脚本，`<` 转义以免提前闭合 script 标签
        let name_literal = serde_json::Value::String(name.to_string())
            .to_string()
            .replace('<', "\\u003c");
        let script = format!(
            r#"
            const FILE_NAME = {name_literal};
            const target = "/files/" + encodeURIComponent(FILE_NAME);
            async function send(method, payload) {{
                const res = await fetch(target, {{
                    method,
                    headers: {{ "Content-Type": "application/json" }},
                    body: payload === undefined ? undefined : JSON.stringify(payload),
                }});
                const json = await res.json();
                document.getElementById("status").textContent = json.details;
                return res.ok;
            }}
            async function saveFile() {{
                const payload = {{ newFileContent: document.getElementById("content").value }};
                const newName = document.getElementById("new-name").value;
                if (newName !== FILE_NAME) payload.newFileName = newName;
                if (await send("PATCH", payload) && payload.newFileName) {{
                    location.href = "/files/" + encodeURIComponent(newName);
                }}
            }}
            async function deleteFile() {{
                if (await send("DELETE")) location.href = "/";
            }}
            "#
        );
        let css = [
            BASE_CSS,
            r"
            textarea {
                width: 100%;
                font-family: monospace;
                white-space: pre-wrap; /* 保留换行符和空格 */
            }",
        ]
        .concat();
        Self {
            title: escaped_name,
            css,
            script,
            body,
        }
    }

    pub fn create_form() -> Self {
        let body = r#"
            <h1>新建文件</h1><hr>
            <form method="post" action="/create" onsubmit="return createFile(event)">
                <p><label>文件名 <input name="fileName" placeholder="note.txt"></label></p>
                <p><textarea name="fileContent" rows="15"></textarea></p>
                <p><button type="submit">创建</button></p>
            </form>
            <p id="status"></p>
            <p><a href="/">返回列表</a></p>
            "#
        .to_string();
        let script = r#"
            async function createFile(event) {
                event.preventDefault();
                const form = event.target;
                const res = await fetch("/create", {
                    method: "POST",
                    headers: { "Content-Type": "application/json" },
                    body: JSON.stringify({
                        fileName: form.fileName.value,
                        fileContent: form.fileContent.value,
                    }),
                });
                const json = await res.json();
                document.getElementById("status").textContent = json.details;
                if (res.ok) location.href = "/files/" + encodeURIComponent(form.fileName.value);
                return false;
            }
            "#
        .to_string();
        let css = [BASE_CSS, "textarea { width: 100%; font-family: monospace; }"].concat();
        Self {
            title: "新建文件".to_string(),
            css,
            script,
            body,
        }
    }

    pub fn build(&self) -> String {
        format!(
            r##"<!DOCTYPE html>
            <!-- 本文件由shaneyale的Rust Fileserver自动生成 -->
            <html>
                <head>
                    <meta charset="utf-8">
                    <script>{}</script>
                    <title>{}</title>
                    <style>{}</style>
                </head>
                <body>
                {}
                </body>
            </html>"##,
            self.script, self.title, self.css, self.body
        )
    }
}
