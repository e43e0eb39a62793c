pub mod config;
pub mod error;
pub mod http;
pub mod listener;
pub mod logger;
pub mod payload;
pub mod report;

// Re-export commonly used types
pub use error::{HarnessError, Result};
pub use http::{ApiClient, ApiRequest, Dispatch, Method, Payload, Response, Target};
pub use listener::{ReportListener, TestInfo, TestListener, TestOutcome};
pub use payload::{is_valid_json, load_json_payload, read_json_payload};
pub use report::{EntryHandle, Level, ReportSink};
