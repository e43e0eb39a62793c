use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use fs2::FileExt;

use crate::Result;
use crate::report::writer::{ReportSnapshot, ReportWriter};

/// 把报告写成 JSON，供 CI 或其他工具读取
pub struct JsonWriter {
    path: PathBuf,
}

impl JsonWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportWriter for JsonWriter {
    fn name(&self) -> &str {
        "json"
    }

    fn write(&self, report: &ReportSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.path)?;
        file.lock_exclusive()?;
        file.set_len(0)?;

        let mut out = BufWriter::new(&file);
        serde_json::to_writer_pretty(&mut out, report)?;
        out.write_all(b"\n")?;
        out.flush()?;

        Ok(())
    }
}
