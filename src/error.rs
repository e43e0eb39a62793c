use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("无效的请求: {0}")]
    InvalidRequest(String),

    #[error("无效的 URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP 请求失败: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON 解析错误: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL 解析错误: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("报告尚未初始化")]
    ReportNotActive,

    #[error("报告已经输出，不能再次使用")]
    ReportFlushed,

    #[error("当前线程没有活动的测试条目")]
    NoCurrentEntry,

    #[error("测试条目已结束: {0}")]
    EntryClosed(String),

    #[error("未开始的测试: {0}")]
    UnknownTest(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for HarnessError {
    fn from(err: anyhow::Error) -> Self {
        HarnessError::Other(format!("{:#}", err))
    }
}

impl From<toml::de::Error> for HarnessError {
    fn from(err: toml::de::Error) -> Self {
        HarnessError::ConfigError(err.to_string())
    }
}

/// Result type for apiharness crate
pub type Result<T> = std::result::Result<T, HarnessError>;
