use std::path::Path;
use std::time::Duration;

use crate::config::ToolSettings;
use crate::services::size::SymbolLister;
use crate::services::tools::{run_tool, Stdout, ToolError};

/// `nm`-backed symbol listing: `--print-size --size-sort --radix=d`, tail-truncated.
#[derive(Debug, Clone)]
pub struct NmSymbolLister {
    argv: Vec<String>,
    timeout: Option<Duration>,
}

impl NmSymbolLister {
    pub fn new(argv: Vec<String>, timeout: Option<Duration>) -> Self {
        Self { argv, timeout }
    }

    pub fn from_settings(tools: &ToolSettings) -> Self {
        Self::new(tools.nm.clone(), tools.timeout())
    }
}

impl SymbolLister for NmSymbolLister {
    fn largest_symbols(&self, binary: &Path, count: usize) -> Result<Vec<String>, ToolError> {
        let args = vec![
            "--print-size".to_string(),
            "--size-sort".to_string(),
            "--radix=d".to_string(),
            binary.display().to_string(),
        ];
        let run = run_tool(&self.argv, &args, Stdout::Capture, self.timeout, "nm")?;
        if !run.success() {
            tracing::warn!(code = ?run.exit_code, "nm exited unsuccessfully");
        }
        Ok(tail_lines(&run.stdout, count))
    }

    fn name(&self) -> &'static str {
        "nm"
    }
}

/// Keep the last `count` non-empty lines, i.e. the largest symbols of a size-sorted listing.
pub fn tail_lines(body: &str, count: usize) -> Vec<String> {
    let lines: Vec<&str> = body.lines().filter(|l| !l.trim().is_empty()).collect();
    let skip = lines.len().saturating_sub(count);
    lines.into_iter().skip(skip).map(str::to_string).collect()
}
