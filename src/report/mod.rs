pub mod console;
pub mod entry;
pub mod html;
pub mod json;
pub mod sink;
pub mod summary;
pub mod writer;

pub use console::ConsoleSummary;
pub use entry::{EntryHandle, Level, LogRecord, RecordBody, ReportEntry};
pub use html::HtmlWriter;
pub use json::JsonWriter;
pub use sink::{Report, ReportSink, SinkPhase};
pub use summary::TestSummary;
pub use writer::{ReportSnapshot, ReportWriter};
