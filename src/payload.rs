//! JSON 请求体文件的读取与校验

use std::fs;
use std::path::Path;

use serde::de::IgnoredAny;

use crate::{HarnessError, Result};

/// 判断字符串是否为合法 JSON，从不出错
pub fn is_valid_json(text: &str) -> bool {
    serde_json::from_str::<IgnoredAny>(text).is_ok()
}

/// 读取 JSON 文件并原样返回文本（不重新序列化，保留原有格式和字段顺序）
pub fn read_json_payload<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    if let Err(e) = serde_json::from_str::<IgnoredAny>(&text) {
        return Err(HarnessError::Other(format!(
            "{} is not valid JSON: {}",
            path.display(),
            e
        )));
    }
    Ok(text)
}

/// 读取 JSON 请求体文件
///
/// # Panics
///
/// 文件无法读取或内容不是合法 JSON 时 panic：这是测试本身的问题，不是被测系统的行为。
#[track_caller]
pub fn load_json_payload<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();
    match read_json_payload(path) {
        Ok(text) => text,
        Err(e) => panic!(
            "Failed to read or invalid JSON payload {}: {}",
            path.display(),
            e
        ),
    }
}
