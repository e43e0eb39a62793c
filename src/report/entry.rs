use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{HarnessError, Result};

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Pass,
    Fail,
    Skip,
    Info,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Pass => "PASS",
            Level::Fail => "FAIL",
            Level::Skip => "SKIP",
            Level::Info => "INFO",
        }
    }

    /// 条目状态的优先级：FAIL > SKIP > PASS > INFO
    fn severity(&self) -> u8 {
        match self {
            Level::Info => 0,
            Level::Pass => 1,
            Level::Skip => 2,
            Level::Fail => 3,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 记录内容：普通消息，或者请求/响应快照组成的代码块
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum RecordBody {
    Message(String),
    Exchange { request: String, response: String },
}

impl From<&str> for RecordBody {
    fn from(message: &str) -> Self {
        RecordBody::Message(message.to_string())
    }
}

impl From<String> for RecordBody {
    fn from(message: String) -> Self {
        RecordBody::Message(message)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub level: Level,
    pub timestamp: DateTime<Utc>,
    pub body: RecordBody,
    /// 失败时的完整错误链
    pub detail: Option<String>,
}

impl LogRecord {
    pub fn message(&self) -> Option<&str> {
        match &self.body {
            RecordBody::Message(message) => Some(message),
            RecordBody::Exchange { .. } => None,
        }
    }
}

/// 一个测试在报告中的记录
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub records: Vec<LogRecord>,
}

impl ReportEntry {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            started_at: Utc::now(),
            finished_at: None,
            records: Vec::new(),
        }
    }

    pub fn status(&self) -> Level {
        self.records
            .iter()
            .map(|r| r.level)
            .max_by_key(Level::severity)
            .unwrap_or(Level::Info)
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }
}

/// 共享的条目句柄
///
/// 克隆得到的句柄指向同一个条目；条目结束后不再接受新记录。
#[derive(Debug, Clone)]
pub struct EntryHandle {
    inner: Arc<Mutex<ReportEntry>>,
}

impl EntryHandle {
    pub(crate) fn new(entry: ReportEntry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(entry)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReportEntry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> Uuid {
        self.lock().id
    }

    pub fn name(&self) -> String {
        self.lock().name.clone()
    }

    /// 当前内容的副本
    pub fn snapshot(&self) -> ReportEntry {
        self.lock().clone()
    }

    pub fn same_entry(&self, other: &EntryHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn push(&self, level: Level, body: RecordBody, detail: Option<String>) -> Result<()> {
        let mut entry = self.lock();
        if entry.is_finished() {
            return Err(HarnessError::EntryClosed(entry.name.clone()));
        }
        entry.records.push(LogRecord {
            level,
            timestamp: Utc::now(),
            body,
            detail,
        });
        Ok(())
    }

    pub fn log(&self, level: Level, body: impl Into<RecordBody>) -> Result<()> {
        self.push(level, body.into(), None)
    }

    pub fn pass(&self, message: impl Into<String>) -> Result<()> {
        self.log(Level::Pass, message.into())
    }

    pub fn fail(&self, message: impl Into<String>) -> Result<()> {
        self.log(Level::Fail, message.into())
    }

    pub fn skip(&self, message: impl Into<String>) -> Result<()> {
        self.log(Level::Skip, message.into())
    }

    pub fn info(&self, message: impl Into<String>) -> Result<()> {
        self.log(Level::Info, message.into())
    }

    pub fn log_exchange(&self, level: Level, request: &str, response: &str) -> Result<()> {
        let body = RecordBody::Exchange {
            request: request.to_string(),
            response: response.to_string(),
        };
        self.push(level, body, None)
    }

    /// 记录失败：消息为错误本身，detail 为完整的错误链
    pub fn log_failure(&self, error: &anyhow::Error) -> Result<()> {
        self.push(
            Level::Fail,
            RecordBody::Message(error.to_string()),
            Some(format!("{:?}", error)),
        )
    }

    /// 结束条目；重复调用无副作用
    pub fn finish(&self) {
        let mut entry = self.lock();
        if entry.finished_at.is_none() {
            entry.finished_at = Some(Utc::now());
        }
    }
}
