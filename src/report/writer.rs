use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::Result;
use crate::report::entry::ReportEntry;
use crate::report::summary::TestSummary;

/// 输出时的报告内容
#[derive(Debug, Clone, Serialize)]
pub struct ReportSnapshot {
    pub title: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub entries: Vec<ReportEntry>,
    pub summary: TestSummary,
}

impl ReportSnapshot {
    pub fn new(title: String, started_at: DateTime<Utc>, entries: Vec<ReportEntry>) -> Self {
        let summary = TestSummary::from_entries(&entries);
        Self {
            title,
            started_at,
            finished_at: Utc::now(),
            entries,
            summary,
        }
    }
}

/// 报告输出目标
pub trait ReportWriter: Send + Sync {
    fn name(&self) -> &str;

    fn write(&self, report: &ReportSnapshot) -> Result<()>;
}
