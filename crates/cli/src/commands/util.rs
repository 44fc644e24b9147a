use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use fwgate_core::config::VerifyConfig;

/// Load the config file if one was given (delegates to core helper), then apply env overrides.
pub fn load_verify_config(path: Option<&str>) -> Result<VerifyConfig> {
    fwgate_core::config::resolve_config(path.map(Path::new))
}

/// Current time as RFC 3339, used for run envelopes.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// JSON wrapper around a command's result with timing metadata.
#[derive(Debug, Serialize)]
pub struct RunEnvelope<T: Serialize> {
    pub fwgate_version: String,
    pub started_at: String,
    pub finished_at: String,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> RunEnvelope<T> {
    pub fn new(started_at: String, body: T) -> Self {
        Self {
            fwgate_version: fwgate_core::version().to_string(),
            started_at,
            finished_at: now_rfc3339(),
            body,
        }
    }
}

/// JSON form of one stage's result.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageJson<'a, T: Serialize> {
    Ok { report: &'a T },
    Error { message: String },
    Skipped,
}

impl<'a, T: Serialize> StageJson<'a, T> {
    pub fn from_result<E: std::fmt::Display>(result: &'a Result<T, E>) -> Self {
        match result {
            Ok(report) => StageJson::Ok { report },
            Err(err) => StageJson::Error { message: err.to_string() },
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
