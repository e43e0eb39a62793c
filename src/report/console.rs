use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, Table};

use crate::Result;
use crate::report::entry::Level;
use crate::report::writer::{ReportSnapshot, ReportWriter};

/// 在终端打印测试结果表格和摘要
pub struct ConsoleSummary {
    color: bool,
}

impl ConsoleSummary {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn render(&self, report: &ReportSnapshot) -> String {
        let mut output = Vec::new();

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["Test", "Status", "Records", "Duration"]);
        if !self.color {
            table.force_no_tty();
        }

        for entry in &report.entries {
            let status = entry.status();
            let status_color = match status {
                Level::Pass => Color::Green,
                Level::Fail => Color::Red,
                Level::Skip => Color::Yellow,
                Level::Info => Color::Blue,
            };
            let mut status_cell = Cell::new(status);
            if self.color {
                status_cell = status_cell.fg(status_color);
            }

            table.add_row(vec![
                Cell::new(&entry.name).add_attribute(Attribute::Bold),
                status_cell,
                Cell::new(entry.records.len()),
                Cell::new(format!("{}ms", entry.duration().num_milliseconds())),
            ]);
        }

        output.push(table.to_string());
        output.push("━".repeat(50));
        output.push(self.paint_bold("Summary"));
        output.push("━".repeat(50));

        let summary = &report.summary;
        output.push(format!(
            "  {}: {} passed, {} failed, {} skipped, {} total",
            self.paint_bold("Tests"),
            self.paint(summary.passed, Level::Pass),
            self.paint(summary.failed, Level::Fail),
            self.paint(summary.skipped, Level::Skip),
            summary.total
        ));
        output.push(format!(
            "  {}: {:.3}s",
            self.paint_bold("Duration"),
            summary.total_duration.as_secs_f64()
        ));

        output.join("\n")
    }

    fn paint(&self, count: usize, level: Level) -> String {
        let text = count.to_string();
        if !self.color {
            return text;
        }
        match level {
            Level::Pass => text.green().to_string(),
            Level::Fail => text.red().to_string(),
            Level::Skip => text.dimmed().to_string(),
            Level::Info => text,
        }
    }

    fn paint_bold(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }
}

impl ReportWriter for ConsoleSummary {
    fn name(&self) -> &str {
        "console"
    }

    fn write(&self, report: &ReportSnapshot) -> Result<()> {
        println!("\n{}\n", self.render(report));
        Ok(())
    }
}
