//! 测试运行生命周期与报告之间的衔接
//!
//! `on_test_start` 返回的条目句柄就是一次测试执行的身份，结果回调必须带上它。
//! 同名测试（参数化、数据驱动）并发执行时各自写入自己的条目，
//! 跨线程恢复的异步测试也不依赖线程局部状态。

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::report::{EntryHandle, Level, ReportSink};
use crate::{HarnessError, Result};

pub const PASSED_MESSAGE: &str = "Test Passed";
pub const SKIPPED_MESSAGE: &str = "Test Skipped";

/// 测试的标识信息
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestInfo {
    pub name: String,
    pub description: String,
    pub skip: bool,
}

impl TestInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            skip: false,
        }
    }

    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }
}

/// 测试结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed(String),
    Skipped,
}

/// 测试运行器的生命周期回调
pub trait TestListener {
    /// 所有测试开始之前
    fn on_start(&self) -> Result<()>;

    /// 单个测试开始；返回这次执行的报告条目
    fn on_test_start(&self, test: &TestInfo) -> Result<EntryHandle>;

    fn on_test_success(&self, test: &TestInfo, entry: &EntryHandle) -> Result<()>;

    fn on_test_failure(
        &self,
        test: &TestInfo,
        entry: &EntryHandle,
        error: &anyhow::Error,
    ) -> Result<()>;

    fn on_test_skipped(&self, test: &TestInfo, entry: &EntryHandle) -> Result<()>;

    /// 所有测试结束之后
    fn on_finish(&self) -> Result<()>;
}

/// 把生命周期事件写入 [`ReportSink`]
pub struct ReportListener<'a> {
    sink: &'a ReportSink,
    /// 正在执行的测试：条目 id -> 测试名
    running: Mutex<HashMap<Uuid, String>>,
}

impl ReportListener<'static> {
    /// 使用进程级报告
    pub fn global() -> Self {
        Self::new(ReportSink::global())
    }
}

impl<'a> ReportListener<'a> {
    pub fn new(sink: &'a ReportSink) -> Self {
        Self {
            sink,
            running: Mutex::new(HashMap::new()),
        }
    }

    pub fn sink(&self) -> &ReportSink {
        self.sink
    }

    fn running(&self) -> MutexGuard<'_, HashMap<Uuid, String>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 登记结果并结束条目；每个条目只能登记一次
    fn complete(
        &self,
        test: &TestInfo,
        entry: &EntryHandle,
        record: impl FnOnce(&EntryHandle) -> Result<()>,
    ) -> Result<()> {
        if self.running().remove(&entry.id()).is_none() {
            return Err(HarnessError::UnknownTest(test.name.clone()));
        }
        let result = record(entry);
        entry.finish();
        result
    }

    /// 按顺序执行一个测试：开始、运行（或跳过）、记录结果
    pub async fn run<F, Fut>(&self, test: &TestInfo, body: F) -> Result<TestOutcome>
    where
        F: FnOnce(EntryHandle) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let entry = self.on_test_start(test)?;

        if test.skip {
            self.on_test_skipped(test, &entry)?;
            return Ok(TestOutcome::Skipped);
        }

        match body(entry.clone()).await {
            Ok(()) => {
                self.on_test_success(test, &entry)?;
                Ok(TestOutcome::Passed)
            }
            Err(e) => {
                self.on_test_failure(test, &entry, &e)?;
                Ok(TestOutcome::Failed(format!("{:#}", e)))
            }
        }
    }
}

impl TestListener for ReportListener<'_> {
    fn on_start(&self) -> Result<()> {
        crate::logger::init_logger();
        self.sink.ensure_initialized()?;
        Ok(())
    }

    fn on_test_start(&self, test: &TestInfo) -> Result<EntryHandle> {
        let entry = self.sink.begin_entry(&test.name, &test.description)?;
        self.running().insert(entry.id(), test.name.clone());
        debug!("test started: {}", test.name);
        Ok(entry)
    }

    fn on_test_success(&self, test: &TestInfo, entry: &EntryHandle) -> Result<()> {
        self.complete(test, entry, |entry| entry.log(Level::Pass, PASSED_MESSAGE))
    }

    fn on_test_failure(
        &self,
        test: &TestInfo,
        entry: &EntryHandle,
        error: &anyhow::Error,
    ) -> Result<()> {
        self.complete(test, entry, |entry| entry.log_failure(error))?;
        info!("test failed: {}: {:#}", test.name, error);
        Ok(())
    }

    fn on_test_skipped(&self, test: &TestInfo, entry: &EntryHandle) -> Result<()> {
        self.complete(test, entry, |entry| entry.log(Level::Skip, SKIPPED_MESSAGE))
    }

    fn on_finish(&self) -> Result<()> {
        let unfinished: Vec<String> = self.running().drain().map(|(_, name)| name).collect();
        if !unfinished.is_empty() {
            warn!("tests without an outcome at finish: {:?}", unfinished);
        }
        self.sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Report;

    fn sink() -> ReportSink {
        ReportSink::with_factory(|| Report::new("listener"))
    }

    #[test]
    fn test_outcomes_are_logged_and_close_entries() {
        let sink = sink();
        let listener = ReportListener::new(&sink);
        listener.on_start().unwrap();

        let login = TestInfo::new("loginTest", "verifies login");
        let entry = listener.on_test_start(&login).unwrap();
        entry.info("sending credentials").unwrap();
        listener.on_test_success(&login, &entry).unwrap();

        let logout = TestInfo::new("logoutTest", "");
        let logout_entry = listener.on_test_start(&logout).unwrap();
        listener
            .on_test_failure(
                &logout,
                &logout_entry,
                &anyhow::anyhow!("expected 200, got 500"),
            )
            .unwrap();

        let report = sink.ensure_initialized().unwrap();
        let entries = report.entries();
        assert_eq!(entries[0].status(), Level::Pass);
        assert_eq!(entries[0].records[1].message(), Some(PASSED_MESSAGE));
        assert!(entries[0].is_finished());
        assert_eq!(entries[1].status(), Level::Fail);
        assert_eq!(entries[1].records[0].message(), Some("expected 200, got 500"));

        assert!(matches!(
            entry.info("after finish"),
            Err(HarnessError::EntryClosed(_))
        ));
    }

    #[test]
    fn test_outcome_for_unknown_test_is_error() {
        let sink = sink();
        let listener = ReportListener::new(&sink);
        let other = ReportListener::new(&sink);
        listener.on_start().unwrap();

        let test = TestInfo::new("never_started", "");
        let foreign = other.on_test_start(&test).unwrap();
        let result = listener.on_test_skipped(&test, &foreign);
        assert!(matches!(result, Err(HarnessError::UnknownTest(name)) if name == "never_started"));
        assert!(!foreign.snapshot().is_finished());
    }

    #[test]
    fn test_outcome_reported_twice_is_error() {
        let sink = sink();
        let listener = ReportListener::new(&sink);
        listener.on_start().unwrap();

        let test = TestInfo::new("once", "");
        let entry = listener.on_test_start(&test).unwrap();
        listener.on_test_success(&test, &entry).unwrap();

        let result = listener.on_test_failure(&test, &entry, &anyhow::anyhow!("late"));
        assert!(matches!(result, Err(HarnessError::UnknownTest(_))));
        assert_eq!(entry.snapshot().status(), Level::Pass);
    }

    #[test]
    fn test_same_name_tests_keep_separate_entries() {
        let sink = sink();
        let listener = ReportListener::new(&sink);
        listener.on_start().unwrap();

        let test = TestInfo::new("dataDriven", "row");
        let first = listener.on_test_start(&test).unwrap();
        let second = listener.on_test_start(&test).unwrap();
        assert!(!first.same_entry(&second));

        listener
            .on_test_failure(&test, &second, &anyhow::anyhow!("row 2 failed"))
            .unwrap();
        listener.on_test_success(&test, &first).unwrap();

        assert_eq!(first.snapshot().status(), Level::Pass);
        assert_eq!(second.snapshot().status(), Level::Fail);
        assert!(first.snapshot().is_finished());
        assert!(second.snapshot().is_finished());
    }

    #[test]
    fn test_test_start_before_suite_start_is_error() {
        let sink = sink();
        let listener = ReportListener::new(&sink);
        let result = listener.on_test_start(&TestInfo::new("early", ""));
        assert!(matches!(result, Err(HarnessError::ReportNotActive)));
    }

    #[tokio::test]
    async fn test_run_sequences_callbacks() {
        let sink = sink();
        let listener = ReportListener::new(&sink);
        listener.on_start().unwrap();

        let passed = listener
            .run(&TestInfo::new("ok", ""), |entry| async move {
                entry.info("step one")?;
                Ok::<(), anyhow::Error>(())
            })
            .await
            .unwrap();
        assert_eq!(passed, TestOutcome::Passed);

        let failed = listener
            .run(&TestInfo::new("broken", ""), |_| async {
                Err::<(), _>(anyhow::anyhow!("status was 404"))
            })
            .await
            .unwrap();
        assert_eq!(failed, TestOutcome::Failed("status was 404".to_string()));

        let skipped = listener
            .run(&TestInfo::new("later", "").skipped(), |_| async {
                Err::<(), _>(anyhow::anyhow!("skipped test body must not run"))
            })
            .await
            .unwrap();
        assert_eq!(skipped, TestOutcome::Skipped);

        let statuses: Vec<Level> = sink
            .ensure_initialized()
            .unwrap()
            .entries()
            .iter()
            .map(|e| e.status())
            .collect();
        assert_eq!(statuses, vec![Level::Pass, Level::Fail, Level::Skip]);

        listener.on_finish().unwrap();
        assert!(matches!(
            sink.ensure_initialized(),
            Err(HarnessError::ReportFlushed)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_runs_with_same_name() {
        let sink = sink();
        let listener = ReportListener::new(&sink);
        listener.on_start().unwrap();

        let test = TestInfo::new("dataDriven", "row");
        let (first, second) = tokio::join!(
            listener.run(&test, |entry| async move {
                entry.info("row 1")?;
                tokio::task::yield_now().await;
                Ok::<(), anyhow::Error>(())
            }),
            listener.run(&test, |entry| async move {
                entry.info("row 2")?;
                tokio::task::yield_now().await;
                Err::<(), _>(anyhow::anyhow!("row 2 failed"))
            }),
        );
        assert_eq!(first.unwrap(), TestOutcome::Passed);
        assert_eq!(second.unwrap(), TestOutcome::Failed("row 2 failed".to_string()));

        let entries = sink.ensure_initialized().unwrap().entries();
        assert_eq!(entries.len(), 2);
        for entry in &entries {
            assert!(entry.is_finished());
            match entry.records[0].message() {
                Some("row 1") => assert_eq!(entry.status(), Level::Pass),
                Some("row 2") => assert_eq!(entry.status(), Level::Fail),
                other => panic!("unexpected first record: {:?}", other),
            }
            assert_eq!(entry.records.len(), 2);
        }

        listener.on_finish().unwrap();
        assert!(matches!(
            sink.ensure_initialized(),
            Err(HarnessError::ReportFlushed)
        ));
    }
}
