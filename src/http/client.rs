use std::future::Future;
use std::time::Instant;

use reqwest::header::HeaderMap as Headers;
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

use crate::config::HttpConfig;
use crate::http::response::Response;
use crate::http::types::Method;
use crate::{HarnessError, Result};

/// 已经准备好、可直接发送的请求
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: reqwest::Url,
    pub headers: Headers,
    pub body: OutboundBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundBody {
    Empty,
    Bytes(Vec<u8>),
    Multipart(FilePart),
}

/// multipart 中的单个文件字段
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// HTTP 传输层
///
/// 连接失败应当以 [`Response::failed`] 返回；`Err` 只用于请求本身无法构造的情况。
pub trait Transport {
    fn send(&self, request: OutboundRequest) -> impl Future<Output = Result<Response>> + Send;
}

/// 基于 reqwest 的默认传输层
///
/// 关闭了所有响应解码 (gzip/brotli/deflate/zstd)，body 保持线上原始字节。
#[derive(Clone)]
pub struct HttpTransport {
    inner: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout())
            .no_gzip()
            .no_brotli()
            .no_deflate()
            .no_zstd();

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent);
        }

        Ok(Self {
            inner: builder.build()?,
        })
    }

    fn multipart(part: FilePart) -> Result<Form> {
        let file = Part::bytes(part.bytes)
            .file_name(part.file_name)
            .mime_str(&part.content_type)
            .map_err(|_| {
                HarnessError::InvalidRequest(format!(
                    "invalid part content type: {}",
                    part.content_type
                ))
            })?;
        Ok(Form::new().part(part.field, file))
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<Response> {
        let mut req = self
            .inner
            .request(request.method.into(), request.url.clone())
            .headers(request.headers);

        req = match request.body {
            OutboundBody::Empty => req,
            OutboundBody::Bytes(bytes) => req.body(bytes),
            OutboundBody::Multipart(part) => req.multipart(Self::multipart(part)?),
        };

        let start = Instant::now();
        let response = match req.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("{} {} failed: {}", request.method, request.url, e);
                return Ok(Response::failed(e.to_string(), start.elapsed()));
            }
        };

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                warn!("{} {} body read failed: {}", request.method, request.url, e);
                let mut partial = Response::new(status, headers, Vec::new(), start.elapsed());
                partial.error = Some(e.to_string());
                return Ok(partial);
            }
        };
        let duration = start.elapsed();

        debug!(
            "{} {} -> {} ({}ms)",
            request.method,
            request.url,
            status,
            duration.as_millis()
        );
        Ok(Response::new(status, headers, body, duration))
    }
}
