//! 请求/响应的文本快照，写入测试报告用

use reqwest::header::{HeaderName, HeaderValue};

use crate::http::client::{OutboundBody, OutboundRequest};
use crate::http::response::Response;

const NONE: &str = "<none>";

/// 渲染发出的请求：方法、URL、query、header 和 body
pub fn render_request(request: &OutboundRequest) -> String {
    let mut output = Vec::new();
    output.push(format!("Request method:\t{}", request.method));
    output.push(format!("Request URI:\t{}", request.url));

    let query: Vec<String> = request
        .url
        .query_pairs()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    push_block(&mut output, "Query params:\t", &query);
    push_block(&mut output, "Headers:\t\t", &header_lines(request.headers.iter(), "="));

    match &request.body {
        OutboundBody::Empty => {
            output.push(format!("Multiparts:\t\t{}", NONE));
            output.push("Body:".to_string());
            output.push(NONE.to_string());
        }
        OutboundBody::Bytes(bytes) => {
            output.push(format!("Multiparts:\t\t{}", NONE));
            output.push("Body:".to_string());
            output.push(render_body(bytes));
        }
        OutboundBody::Multipart(part) => {
            let lines = vec![
                format!(
                    "Content-Disposition: form-data; name = {}; filename = {}",
                    part.field, part.file_name
                ),
                format!("Content-Type: {}", part.content_type),
                format!("<{} bytes>", part.bytes.len()),
            ];
            push_block(&mut output, "Multiparts:\t\t", &lines);
            output.push("Body:".to_string());
            output.push(NONE.to_string());
        }
    }

    output.join("\n")
}

/// 渲染收到的响应：状态行、header 和 body
pub fn render_response(response: &Response) -> String {
    let mut output = Vec::new();

    match response.status {
        Some(status) => output.push(format!("HTTP {}", status)),
        // 状态码非法时服务器仍然可能返回了 header 和 body，照常输出
        None => output.push(format!(
            "Request failed: {}",
            response.error.as_deref().unwrap_or("unknown error")
        )),
    }

    output.extend(header_lines(response.headers.iter(), ": "));

    if !response.body.is_empty() {
        output.push(String::new());
        output.push(render_body(&response.body));
    }

    output.join("\n")
}

fn header_lines<'a>(
    headers: impl Iterator<Item = (&'a HeaderName, &'a HeaderValue)>,
    separator: &str,
) -> Vec<String> {
    headers
        .map(|(name, value)| {
            format!(
                "{}{}{}",
                name,
                separator,
                value.to_str().unwrap_or("<invalid utf-8>")
            )
        })
        .collect()
}

fn push_block(output: &mut Vec<String>, label: &str, lines: &[String]) {
    let mut lines = lines.iter();
    match lines.next() {
        Some(first) => {
            output.push(format!("{}{}", label, first));
            for line in lines {
                output.push(format!("\t\t\t\t{}", line));
            }
        }
        None => output.push(format!("{}{}", label, NONE)),
    }
}

/// JSON 会被格式化；其他 UTF-8 文本原样输出；二进制只显示长度
fn render_body(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => try_format_json(text).unwrap_or_else(|| text.to_string()),
        Err(_) => format!("<{} bytes of binary data>", bytes.len()),
    }
}

fn try_format_json(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    serde_json::to_string_pretty(&value).ok()
}
