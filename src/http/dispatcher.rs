use std::path::Path;

use reqwest::header::HeaderMap as Headers;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::HttpConfig;
use crate::http::capture::{render_request, render_response};
use crate::http::client::{FilePart, HttpTransport, OutboundBody, OutboundRequest, Transport};
use crate::http::request::{ApiRequest, MULTIPART_FIELD, Payload, Target};
use crate::http::response::Response;
use crate::http::types::Method;
use crate::report::{EntryHandle, Level};
use crate::{HarnessError, Result};

const OCTET_STREAM: &str = "application/octet-stream";

/// 一次请求的结果及其文本快照
///
/// `request_log` 与 `response_log` 每次调用都重新生成，不会在多次请求间累积。
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub response: Response,
    pub request_log: String,
    pub response_log: String,
}

impl Dispatch {
    /// 把请求/响应快照作为一个代码块写入报告条目
    pub fn log_to(&self, entry: &EntryHandle) -> Result<()> {
        entry.log_exchange(Level::Info, &self.request_log, &self.response_log)
    }
}

/// REST 请求发送器
pub struct ApiClient<T = HttpTransport> {
    transport: T,
}

impl ApiClient<HttpTransport> {
    pub fn new() -> Result<Self> {
        Self::from_config(&HttpConfig::default())
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        Ok(Self::with_transport(HttpTransport::new(config)?))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 发送请求
    ///
    /// 只有请求本身无法构造时才返回 `Err`（空 endpoint、非法端口、上传文件读取失败等）；
    /// 非 2xx 和连接失败都体现在返回的 [`Response`] 中。
    pub async fn dispatch(&self, request: &ApiRequest) -> Result<Dispatch> {
        let outbound = prepare(request).await?;
        debug!("dispatching {} {}", outbound.method, outbound.url);

        let request_log = render_request(&outbound);
        let response = self.transport.send(outbound).await?;
        let response_log = render_response(&response);

        Ok(Dispatch {
            response,
            request_log,
            response_log,
        })
    }

    /// 发送 JSON 对象 body（可为空）
    pub async fn send(
        &self,
        target: &Target,
        method: Method,
        headers: &Headers,
        fields: Option<Map<String, Value>>,
    ) -> Result<Dispatch> {
        let payload = fields.map_or(Payload::Empty, Payload::Fields);
        self.dispatch(&build(target, method, headers, payload)).await
    }

    /// 原样发送字符串 body
    pub async fn send_text(
        &self,
        target: &Target,
        method: Method,
        headers: &Headers,
        body: Option<&str>,
    ) -> Result<Dispatch> {
        let payload = body.map_or(Payload::Empty, |b| Payload::Text(b.to_owned()));
        self.dispatch(&build(target, method, headers, payload)).await
    }

    /// query 参数追加到 URL，body 原样发送
    pub async fn send_with_query(
        &self,
        target: &Target,
        query: &[(&str, &str)],
        method: Method,
        headers: &Headers,
        body: Option<&str>,
    ) -> Result<Dispatch> {
        let payload = Payload::Query {
            params: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.map(str::to_owned),
        };
        self.dispatch(&build(target, method, headers, payload)).await
    }

    /// 以 multipart 字段 "file" 上传文件；文件不存在时返回 IO 错误
    pub async fn send_file(
        &self,
        target: &Target,
        content_type: &str,
        method: Method,
        headers: &Headers,
        path: impl AsRef<Path>,
    ) -> Result<Dispatch> {
        let payload = Payload::File {
            path: path.as_ref().to_path_buf(),
            content_type: content_type.to_owned(),
        };
        self.dispatch(&build(target, method, headers, payload)).await
    }

    /// 使用指定 Content-Type 原样发送 body
    pub async fn send_with_content_type(
        &self,
        target: &Target,
        content_type: &str,
        method: Method,
        headers: &Headers,
        body: Option<&str>,
    ) -> Result<Dispatch> {
        let payload = Payload::Typed {
            body: body.map(str::to_owned),
            content_type: content_type.to_owned(),
        };
        self.dispatch(&build(target, method, headers, payload)).await
    }
}

fn build(target: &Target, method: Method, headers: &Headers, payload: Payload) -> ApiRequest {
    ApiRequest::new(method, target.clone())
        .with_headers(headers.clone())
        .with_payload(payload)
}

/// 把请求描述转换为可发送的请求；上传文件在这里读取
async fn prepare(request: &ApiRequest) -> Result<OutboundRequest> {
    let url = request
        .target
        .url()?
        .to_request_url(request.payload.query_params())?;
    let headers = request.effective_headers()?;

    let body = match &request.payload {
        Payload::Empty => OutboundBody::Empty,
        Payload::Fields(fields) => OutboundBody::Bytes(serde_json::to_vec(fields)?),
        Payload::Text(text) => OutboundBody::Bytes(text.clone().into_bytes()),
        Payload::Query { body, .. } | Payload::Typed { body, .. } => match body {
            Some(text) => OutboundBody::Bytes(text.clone().into_bytes()),
            None => OutboundBody::Empty,
        },
        Payload::File { path, content_type } => {
            OutboundBody::Multipart(read_file_part(path, content_type).await?)
        }
    };

    Ok(OutboundRequest {
        method: request.method,
        url,
        headers,
        body,
    })
}

async fn read_file_part(path: &Path, content_type: &str) -> Result<FilePart> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        HarnessError::IoError(std::io::Error::new(
            e.kind(),
            format!("cannot read upload file {}: {}", path.display(), e),
        ))
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| MULTIPART_FIELD.to_string());

    // multipart/* 描述的是整个请求，文件本身按二进制处理
    let part_type = if content_type.trim().to_ascii_lowercase().starts_with("multipart/") {
        OCTET_STREAM
    } else {
        content_type
    };

    Ok(FilePart {
        field: MULTIPART_FIELD.to_string(),
        file_name,
        content_type: part_type.to_string(),
        bytes,
    })
}
