use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use fs2::FileExt;

use crate::Result;
use crate::report::entry::{Level, LogRecord, RecordBody, ReportEntry};
use crate::report::writer::{ReportSnapshot, ReportWriter};

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 0; background: #f5f6f8; color: #222; }
header { background: #25303b; color: #fff; padding: 16px 24px; }
header h1 { margin: 0 0 8px 0; font-size: 20px; }
.counts span { margin-right: 16px; }
main { padding: 16px 24px; }
.test { background: #fff; border-radius: 4px; margin-bottom: 16px; padding: 12px 16px; border-left: 4px solid #888; }
.test.pass { border-color: #2e9e4f; }
.test.fail { border-color: #d64545; }
.test.skip { border-color: #e0a100; }
.test h2 { margin: 0; font-size: 16px; }
.description { color: #666; margin: 4px 0 8px 0; }
table { border-collapse: collapse; width: 100%; }
td { border-top: 1px solid #eee; padding: 6px; vertical-align: top; }
.level { font-weight: bold; width: 48px; }
.level.pass { color: #2e9e4f; } .level.fail { color: #d64545; } .level.skip { color: #e0a100; } .level.info { color: #3b73b9; }
.time { color: #999; width: 90px; white-space: nowrap; }
.exchange { display: flex; gap: 8px; }
pre { background: #f0f2f4; padding: 8px; margin: 0; overflow-x: auto; flex: 1; }
"#;

/// 把报告写成一个独立的 HTML 文件
pub struct HtmlWriter {
    path: PathBuf,
}

impl HtmlWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ensure directory exists
    fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl ReportWriter for HtmlWriter {
    fn name(&self) -> &str {
        "html"
    }

    /// Writes under an exclusive lock so two test binaries sharing the same
    /// report path never interleave their output.
    fn write(&self, report: &ReportSnapshot) -> Result<()> {
        self.ensure_dir()?;
        let html = render(report);

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.path)?;
        file.lock_exclusive()?;
        file.set_len(0)?;
        file.write_all(html.as_bytes())?;
        file.flush()?;
        drop(file);

        Ok(())
    }
}

pub fn render(report: &ReportSnapshot) -> String {
    let mut html = String::new();
    let summary = &report.summary;

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n",
        title = escape(&report.title)
    );
    let _ = write!(
        html,
        "<header>\n<h1>{}</h1>\n<div class=\"counts\"><span>Tests: {}</span><span>Passed: {}</span><span>Failed: {}</span><span>Skipped: {}</span><span>Duration: {:.3}s</span></div>\n<div>{} &ndash; {}</div>\n</header>\n<main>\n",
        escape(&report.title),
        summary.total,
        summary.passed,
        summary.failed,
        summary.skipped,
        summary.total_duration.as_secs_f64(),
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.finished_at.format("%Y-%m-%d %H:%M:%S UTC"),
    );

    for entry in &report.entries {
        render_entry(&mut html, entry);
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn render_entry(html: &mut String, entry: &ReportEntry) {
    let status = entry.status();
    let _ = write!(
        html,
        "<section class=\"test {class}\" id=\"{id}\">\n<h2>{name} <small class=\"level {class}\">{status}</small></h2>\n",
        class = css_class(status),
        id = entry.id,
        name = escape(&entry.name),
        status = status,
    );
    if !entry.description.is_empty() {
        let _ = writeln!(
            html,
            "<div class=\"description\">{}</div>",
            escape(&entry.description)
        );
    }

    html.push_str("<table>\n");
    for record in &entry.records {
        render_record(html, record);
    }
    html.push_str("</table>\n</section>\n");
}

fn render_record(html: &mut String, record: &LogRecord) {
    let _ = write!(
        html,
        "<tr class=\"log\"><td class=\"level {}\">{}</td><td class=\"time\">{}</td><td>",
        css_class(record.level),
        record.level,
        record.timestamp.format("%H:%M:%S%.3f"),
    );

    match &record.body {
        RecordBody::Message(message) => {
            let _ = write!(html, "<span class=\"message\">{}</span>", escape(message));
        }
        RecordBody::Exchange { request, response } => {
            let _ = write!(
                html,
                "<div class=\"exchange\"><pre>{}</pre><pre>{}</pre></div>",
                escape(request),
                escape(response)
            );
        }
    }

    if let Some(detail) = &record.detail {
        let _ = write!(html, "<pre class=\"detail\">{}</pre>", escape(detail));
    }
    html.push_str("</td></tr>\n");
}

fn css_class(level: Level) -> &'static str {
    match level {
        Level::Pass => "pass",
        Level::Fail => "fail",
        Level::Skip => "skip",
        Level::Info => "info",
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
