use std::path::PathBuf;

use reqwest::header::{CONTENT_TYPE, HeaderMap as Headers, HeaderName, HeaderValue};
use serde_json::{Map, Value};

use crate::http::types::{Method, Url};
use crate::{HarnessError, Result};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const MULTIPART_FIELD: &str = "file";

/// 请求目标：基础地址 + 可选端口 + endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub base_url: String,
    pub port: Option<u16>,
    pub endpoint: String,
}

impl Target {
    pub fn new(base_url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            port: None,
            endpoint: endpoint.into(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// 解析出完整地址；base URL 和 endpoint 都不能为空
    pub fn url(&self) -> Result<Url> {
        if self.endpoint.trim().is_empty() {
            return Err(HarnessError::InvalidRequest(
                "endpoint must not be empty".to_string(),
            ));
        }
        let base = Url::parse(&self.base_url)?.with_port(self.port)?;
        Ok(base.join(self.endpoint.trim()))
    }
}

/// 请求体的几种编码方式
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    /// 序列化为 JSON 对象
    Fields(Map<String, Value>),
    /// 原样发送
    Text(String),
    /// query 参数追加到 URL，body 原样发送
    Query {
        params: Vec<(String, String)>,
        body: Option<String>,
    },
    /// 以 multipart 字段 "file" 上传文件
    File {
        path: PathBuf,
        content_type: String,
    },
    /// 使用调用方指定的 Content-Type
    Typed {
        body: Option<String>,
        content_type: String,
    },
}

impl Payload {
    pub fn fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Payload::Fields(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// 默认的 Content-Type；multipart 由传输层带上 boundary 后设置
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Payload::Empty | Payload::Fields(_) | Payload::Text(_) | Payload::Query { .. } => {
                Some(JSON_CONTENT_TYPE)
            }
            Payload::Typed { content_type, .. } => Some(content_type),
            Payload::File { .. } => None,
        }
    }

    pub fn query_params(&self) -> &[(String, String)] {
        match self {
            Payload::Query { params, .. } => params,
            _ => &[],
        }
    }
}

/// 一次请求的完整描述，构造后不再修改
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub target: Target,
    pub headers: Headers,
    pub payload: Payload,
}

impl ApiRequest {
    pub fn new(method: Method, target: Target) -> Self {
        Self {
            method,
            target,
            headers: Headers::new(),
            payload: Payload::Empty,
        }
    }

    pub fn get(target: Target) -> Self {
        Self::new(Method::Get, target)
    }

    pub fn post(target: Target) -> Self {
        Self::new(Method::Post, target)
    }

    pub fn put(target: Target) -> Self {
        Self::new(Method::Put, target)
    }

    pub fn delete(target: Target) -> Self {
        Self::new(Method::Delete, target)
    }

    /// 追加一个 header，同名 header 保留多个值
    pub fn with_header(mut self, key: &str, value: &str) -> Result<Self> {
        let name: HeaderName = key
            .parse()
            .map_err(|_| HarnessError::InvalidRequest(format!("invalid header name: {}", key)))?;
        let value: HeaderValue = value.parse().map_err(|_| {
            HarnessError::InvalidRequest(format!("invalid value for header {}", key))
        })?;
        self.headers.append(name, value);
        Ok(self)
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_fields(self, fields: Map<String, Value>) -> Self {
        self.with_payload(Payload::Fields(fields))
    }

    pub fn with_text(self, text: &str) -> Self {
        self.with_payload(Payload::Text(text.to_owned()))
    }

    pub fn with_content_type(self, content_type: &str, body: Option<&str>) -> Self {
        self.with_payload(Payload::Typed {
            body: body.map(str::to_owned),
            content_type: content_type.to_owned(),
        })
    }

    pub fn with_file(self, path: impl Into<PathBuf>, content_type: &str) -> Self {
        self.with_payload(Payload::File {
            path: path.into(),
            content_type: content_type.to_owned(),
        })
    }

    /// 追加 query 参数；已有的文本 body 会被保留
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        let pair = (key.to_string(), value.to_string());
        self.payload = match self.payload {
            Payload::Query { mut params, body } => {
                params.push(pair);
                Payload::Query { params, body }
            }
            Payload::Text(body) => Payload::Query {
                params: vec![pair],
                body: Some(body),
            },
            _ => Payload::Query {
                params: vec![pair],
                body: None,
            },
        };
        self
    }

    /// 最终发送的 header：默认 Content-Type 在前，调用方 header 覆盖同名项
    ///
    /// 文件上传时忽略调用方的 Content-Type，由传输层写入带 boundary 的 multipart 类型。
    pub fn effective_headers(&self) -> Result<Headers> {
        let mut headers = Headers::new();
        if let Some(content_type) = self.payload.content_type() {
            let value = HeaderValue::from_str(content_type).map_err(|_| {
                HarnessError::InvalidRequest(format!("invalid content type: {}", content_type))
            })?;
            headers.insert(CONTENT_TYPE, value);
        }

        for name in self.headers.keys() {
            headers.remove(name);
        }
        let is_upload = matches!(self.payload, Payload::File { .. });
        for (name, value) in self.headers.iter() {
            if is_upload && name == CONTENT_TYPE {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }
        Ok(headers)
    }
}
