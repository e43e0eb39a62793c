use std::borrow::Cow;
use std::time::Duration;

use reqwest::header::HeaderMap as Headers;
use serde::de::DeserializeOwned;

use crate::Result;
use crate::http::types::Status;

/// 一次请求的结果
///
/// 非 2xx 状态和连接失败都不是错误，调用方自行断言。
/// 连接失败时 `status` 为 `None`，`error` 记录原因。
#[derive(Debug, Clone)]
pub struct Response {
    pub status: Option<Status>,
    pub headers: Headers,
    /// 原始字节，未经任何解码
    pub body: Vec<u8>,
    pub duration: Duration,
    pub error: Option<String>,
}

impl Response {
    pub fn new(status: u16, headers: Headers, body: Vec<u8>, duration: Duration) -> Self {
        match Status::new(status) {
            Ok(status) => Self {
                status: Some(status),
                headers,
                body,
                duration,
                error: None,
            },
            Err(e) => Self {
                status: None,
                headers,
                body,
                duration,
                error: Some(e.to_string()),
            },
        }
    }

    /// 传输层失败（连接被拒绝、超时等）
    pub fn failed(message: String, duration: Duration) -> Self {
        Self {
            status: None,
            headers: Headers::new(),
            body: Vec::new(),
            duration,
            error: Some(message),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status.map(|s| s.code())
    }

    pub fn is_transport_failure(&self) -> bool {
        self.status.is_none()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|s| s.is_success())
    }

    pub fn is_client_error(&self) -> bool {
        self.status.is_some_and(|s| s.is_client_error())
    }

    pub fn is_server_error(&self) -> bool {
        self.status.is_some_and(|s| s.is_server_error())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// body 按 UTF-8 解读，非法字节被替换
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}
