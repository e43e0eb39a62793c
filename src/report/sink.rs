use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, ThreadId};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::{ConfigLoader, ReportConfig};
use crate::report::console::ConsoleSummary;
use crate::report::entry::{EntryHandle, Level, RecordBody, ReportEntry};
use crate::report::html::HtmlWriter;
use crate::report::json::JsonWriter;
use crate::report::writer::{ReportSnapshot, ReportWriter};
use crate::{HarnessError, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 一次测试运行的报告：条目列表 + 输出目标
pub struct Report {
    title: String,
    started_at: DateTime<Utc>,
    entries: Mutex<Vec<EntryHandle>>,
    writers: Vec<Box<dyn ReportWriter>>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            started_at: Utc::now(),
            entries: Mutex::new(Vec::new()),
            writers: Vec::new(),
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        let mut report =
            Self::new(config.title.clone()).with_writer(HtmlWriter::new(config.path.clone()));
        if let Some(json_path) = &config.json_path {
            report = report.with_writer(JsonWriter::new(json_path.clone()));
        }
        if config.console_summary {
            report = report.with_writer(ConsoleSummary::new(true));
        }
        report
    }

    pub fn with_writer(mut self, writer: impl ReportWriter + 'static) -> Self {
        self.writers.push(Box::new(writer));
        self
    }

    pub fn writer_names(&self) -> Vec<&str> {
        self.writers.iter().map(|w| w.name()).collect()
    }

    pub fn create_entry(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> EntryHandle {
        let handle = EntryHandle::new(ReportEntry::new(name, description));
        lock(&self.entries).push(handle.clone());
        handle
    }

    /// 所有条目的副本，按创建顺序
    pub fn entries(&self) -> Vec<ReportEntry> {
        lock(&self.entries).iter().map(EntryHandle::snapshot).collect()
    }

    pub fn snapshot(&self) -> ReportSnapshot {
        ReportSnapshot::new(self.title.clone(), self.started_at, self.entries())
    }

    /// 写入所有输出目标；单个目标失败不影响其他目标，返回第一个错误
    fn persist(&self) -> Result<()> {
        let snapshot = self.snapshot();
        let mut first_error = None;

        for writer in &self.writers {
            match writer.write(&snapshot) {
                Ok(()) => debug!("report written by {} writer", writer.name()),
                Err(e) => {
                    warn!("{} writer failed: {}", writer.name(), e);
                    first_error.get_or_insert(e);
                }
            }
        }

        info!(
            "Report flushed: {} tests, {} passed, {} failed, {} skipped",
            snapshot.summary.total,
            snapshot.summary.passed,
            snapshot.summary.failed,
            snapshot.summary.skipped
        );
        first_error.map_or(Ok(()), Err)
    }
}

/// 报告生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkPhase {
    Uninitialized,
    Active,
    Flushed,
}

enum SinkState {
    Uninitialized,
    Active(Arc<Report>),
    Flushed,
}

/// 报告入口
///
/// 状态: Uninitialized -> Active -> Flushed。
/// 每个线程有自己的"当前条目"，[`ReportSink::log`] 只写入调用线程的条目。
pub struct ReportSink {
    factory: Box<dyn Fn() -> Report + Send + Sync>,
    state: Mutex<SinkState>,
    current: Mutex<HashMap<ThreadId, EntryHandle>>,
}

impl ReportSink {
    pub fn new(config: ReportConfig) -> Self {
        Self::with_factory(move || Report::from_config(&config))
    }

    /// 自定义报告的构造方式（例如额外的输出目标）
    pub fn with_factory(factory: impl Fn() -> Report + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            state: Mutex::new(SinkState::Uninitialized),
            current: Mutex::new(HashMap::new()),
        }
    }

    /// 进程级的报告，配置来自 apiharness.toml
    pub fn global() -> &'static ReportSink {
        static SINK: OnceLock<ReportSink> = OnceLock::new();
        SINK.get_or_init(|| ReportSink::new(ConfigLoader::load_or_default().report))
    }

    pub fn phase(&self) -> SinkPhase {
        match *lock(&self.state) {
            SinkState::Uninitialized => SinkPhase::Uninitialized,
            SinkState::Active(_) => SinkPhase::Active,
            SinkState::Flushed => SinkPhase::Flushed,
        }
    }

    /// 第一次调用时创建报告，之后返回同一个实例
    pub fn ensure_initialized(&self) -> Result<Arc<Report>> {
        let mut state = lock(&self.state);
        if let SinkState::Active(report) = &*state {
            return Ok(Arc::clone(report));
        }
        if let SinkState::Flushed = &*state {
            return Err(HarnessError::ReportFlushed);
        }

        let report = Arc::new((self.factory)());
        info!("Report initialized with writers {:?}", report.writer_names());
        *state = SinkState::Active(Arc::clone(&report));
        Ok(report)
    }

    /// 创建条目并设为调用线程的当前条目（覆盖之前的条目）
    ///
    /// 创建期间持有状态锁，与 flush 互斥：返回 Ok 的条目一定出现在输出中。
    pub fn begin_entry(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<EntryHandle> {
        let state = lock(&self.state);
        let report = match &*state {
            SinkState::Active(report) => report,
            SinkState::Uninitialized => return Err(HarnessError::ReportNotActive),
            SinkState::Flushed => return Err(HarnessError::ReportFlushed),
        };
        let handle = report.create_entry(name, description);
        lock(&self.current).insert(thread::current().id(), handle.clone());
        Ok(handle)
    }

    pub fn current_entry(&self) -> Option<EntryHandle> {
        lock(&self.current).get(&thread::current().id()).cloned()
    }

    /// 写入调用线程的当前条目；没有当前条目时返回错误，不会隐式创建
    pub fn log(&self, level: Level, body: impl Into<RecordBody>) -> Result<()> {
        let entry = self.current_entry().ok_or(HarnessError::NoCurrentEntry)?;
        entry.log(level, body)
    }

    /// 输出报告，只会写一次
    ///
    /// 从未初始化时直接进入 Flushed，不产生任何输出。
    pub fn flush(&self) -> Result<()> {
        let previous = std::mem::replace(&mut *lock(&self.state), SinkState::Flushed);
        lock(&self.current).clear();

        match previous {
            SinkState::Active(report) => report.persist(),
            SinkState::Uninitialized => {
                debug!("flush called before the report was initialized");
                Ok(())
            }
            SinkState::Flushed => Ok(()),
        }
    }
}
