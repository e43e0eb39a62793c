use crate::report::entry::{Level, ReportEntry};
use serde::{Serialize, Serializer};
use std::time::Duration;

/// 测试摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub total_duration: Duration,
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

impl TestSummary {
    /// 只有 INFO 记录的条目不计入 passed/failed/skipped
    pub fn from_entries(entries: &[ReportEntry]) -> Self {
        let count = |level: Level| entries.iter().filter(|e| e.status() == level).count();
        let total_duration = entries
            .iter()
            .map(|e| e.duration().to_std().unwrap_or_default())
            .sum();

        Self {
            total: entries.len(),
            passed: count(Level::Pass),
            failed: count(Level::Fail),
            skipped: count(Level::Skip),
            total_duration,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
