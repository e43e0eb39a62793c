use std::fmt;
use std::str::FromStr;

use crate::{HarnessError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl FromStr for Method {
    type Err = HarnessError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            _ => Err(HarnessError::InvalidRequest(format!(
                "Unsupported HTTP method: {}",
                s
            ))),
        }
    }
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Get, Method::Post, Method::Put, Method::Delete];

    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 请求的基础地址
///
/// 端口为 `None` 时使用 scheme 的默认端口。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
    pub query: String,
}

impl Url {
    /// 默认 host，当 URL 中未指定 host 时使用
    const DEFAULT_HOST: &'static str = "localhost";
    /// 默认 scheme，当 URL 中未指定 scheme 时使用
    const DEFAULT_SCHEME: &'static str = "http";

    pub fn parse(s: &str) -> Result<Self> {
        let input = s.trim();
        if input.is_empty() {
            return Err(HarnessError::InvalidUrl("base URL is empty".to_string()));
        }

        // 处理各种简化格式:
        // 1. ":3000" -> "http://localhost:3000"
        // 2. "localhost:3000" -> "http://localhost:3000"
        // 3. "https://:8080" -> "https://localhost:8080"
        let normalized = if input.starts_with(':') {
            format!("{}://{}{}", Self::DEFAULT_SCHEME, Self::DEFAULT_HOST, input)
        } else if let Some(pos) = input.find("://") {
            let after_scheme = &input[pos + 3..];
            if after_scheme.starts_with(':') {
                format!("{}://{}{}", &input[..pos], Self::DEFAULT_HOST, after_scheme)
            } else {
                input.to_string()
            }
        } else {
            format!("{}://{}", Self::DEFAULT_SCHEME, input)
        };

        let url = url::Url::parse(&normalized)?;
        let host = url
            .host_str()
            .ok_or_else(|| HarnessError::InvalidUrl(format!("missing host in {}", input)))?;

        Ok(Url {
            scheme: url.scheme().to_string(),
            host: host.to_string(),
            // url 会把与 scheme 默认值相同的端口规范化为 None
            port: url.port(),
            path: url.path().trim_end_matches('/').to_string(),
            query: url.query().unwrap_or_default().to_string(),
        })
    }

    /// 覆盖端口；0 不是合法端口
    pub fn with_port(mut self, port: Option<u16>) -> Result<Self> {
        match port {
            Some(0) => Err(HarnessError::InvalidRequest(
                "port must be a positive integer".to_string(),
            )),
            Some(port) => {
                self.port = Some(port);
                Ok(self)
            }
            None => Ok(self),
        }
    }

    /// 把 endpoint 拼接到基础路径之后，endpoint 中的 query 会合并
    pub fn join(&self, endpoint: &str) -> Url {
        let (path, query) = endpoint.split_once('?').unwrap_or((endpoint, ""));
        let path = path.trim_start_matches('/');

        let mut joined = self.clone();
        joined.path = format!("{}/{}", self.path, path);
        joined.query = match (self.query.is_empty(), query.is_empty()) {
            (_, true) => self.query.clone(),
            (true, false) => query.to_string(),
            (false, false) => format!("{}&{}", self.query, query),
        };
        joined
    }

    /// 转换为 reqwest 的 URL，并按顺序追加 query 参数
    pub fn to_request_url(&self, params: &[(String, String)]) -> Result<reqwest::Url> {
        // parse_with_params 在参数为空时也会留下一个 '?'
        if params.is_empty() {
            return Ok(reqwest::Url::parse(&self.to_string())?);
        }
        Ok(reqwest::Url::parse_with_params(&self.to_string(), params)?)
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;

        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }

        if self.path.is_empty() {
            write!(f, "/")?;
        } else {
            write!(f, "{}", self.path)?;
        }

        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Status(u16);

impl Status {
    pub fn new(code: u16) -> Result<Self> {
        if (100..600).contains(&code) {
            Ok(Self(code))
        } else {
            Err(HarnessError::InvalidRequest(format!(
                "Invalid HTTP status code: {}",
                code
            )))
        }
    }

    pub fn code(&self) -> u16 {
        self.0
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.0)
    }

    pub fn is_client_error(&self) -> bool {
        (400..=499).contains(&self.0)
    }

    pub fn is_server_error(&self) -> bool {
        (500..=599).contains(&self.0)
    }

    pub fn reason_phrase(&self) -> &'static str {
        reqwest::StatusCode::from_u16(self.0)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("Unknown")
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}
