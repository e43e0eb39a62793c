use crate::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 环境变量：覆盖报告输出路径
pub const REPORT_PATH_ENV: &str = "APIHARNESS_REPORT_PATH";

/// 完整的配置文件 (apiharness.toml)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub http: HttpConfig,
    pub report: ReportConfig,
}

/// `[http]` 配置段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// 请求超时（秒）
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[report]` 配置段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// HTML 报告输出路径
    pub path: PathBuf,
    pub title: String,
    /// 额外输出一份 JSON 报告
    pub json_path: Option<PathBuf>,
    /// 输出报告时是否在终端打印摘要
    pub console_summary: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("extent-report.html"),
            title: "API Test Report".to_string(),
            json_path: None,
            console_summary: false,
        }
    }
}

impl ReportConfig {
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// 应用环境变量覆盖
    fn apply_env(&mut self) {
        self.apply_path_override(std::env::var(REPORT_PATH_ENV).ok());
    }

    /// 空白值不覆盖
    fn apply_path_override(&mut self, path: Option<String>) {
        if let Some(path) = path
            && !path.trim().is_empty()
        {
            self.path = PathBuf::from(path);
        }
    }
}

/// 配置文件加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 配置文件名
    const CONFIG_FILE: &'static str = "apiharness.toml";

    /// 从指定路径加载配置文件
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<HarnessConfig> {
        let content = fs::read_to_string(path.as_ref())?;
        let mut config: HarnessConfig = toml::from_str(&content)?;
        config.report.apply_env();
        Ok(config)
    }

    /// 查找并加载配置文件
    /// 查找顺序：
    /// 1. 当前目录及其父目录
    /// 2. 用户配置目录 ~/.config/apiharness/
    pub fn find_and_load() -> Option<HarnessConfig> {
        Self::find_config_file().and_then(|path| match Self::load_from_path(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Ignoring config file {}: {}", path.display(), e);
                None
            }
        })
    }

    /// 找不到配置文件时使用默认配置
    pub fn load_or_default() -> HarnessConfig {
        Self::find_and_load().unwrap_or_else(|| {
            let mut config = HarnessConfig::default();
            config.report.apply_env();
            config
        })
    }

    fn find_config_file() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::search(current, dirs::home_dir())
    }

    /// 从 start 向上查找，最后查找 home/.config/apiharness/
    fn search(start: PathBuf, home: Option<PathBuf>) -> Option<PathBuf> {
        let mut current = start;

        loop {
            let config_path = current.join(Self::CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        let home = home?;
        let config_path = home
            .join(".config")
            .join("apiharness")
            .join(Self::CONFIG_FILE);
        config_path.exists().then_some(config_path)
    }
}
