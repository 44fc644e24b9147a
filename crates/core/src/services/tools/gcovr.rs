use std::time::Duration;

use crate::config::ToolSettings;
use crate::services::coverage::{CoverageMode, CoverageRequest, CoverageTool};
use crate::services::tools::{format_percent, run_tool, Stdout, ToolError, ToolRun};

/// gcovr-backed coverage aggregation.
#[derive(Debug, Clone)]
pub struct GcovrTool {
    argv: Vec<String>,
    timeout: Option<Duration>,
    passthrough: Stdout,
}

impl GcovrTool {
    pub fn new(argv: Vec<String>, timeout: Option<Duration>) -> Self {
        Self { argv, timeout, passthrough: Stdout::Inherit }
    }

    /// Where the HTML and gate runs send their console output (inherited by default).
    /// The text run is always captured.
    pub fn with_passthrough(mut self, passthrough: Stdout) -> Self {
        self.passthrough = passthrough;
        self
    }

    pub fn passthrough(&self) -> Stdout {
        self.passthrough
    }

    pub fn from_settings(tools: &ToolSettings) -> Self {
        Self::new(tools.gcovr.clone(), tools.timeout())
    }

    /// Build the gcovr argument list for one request (without the program itself).
    ///
    /// The report runs exclude throw/unreachable branches and run `-j` jobs.
    /// The gate run carries only thresholds, root, object directory and excludes.
    pub fn arguments(request: &CoverageRequest) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        let report = match &request.mode {
            CoverageMode::HtmlDetails { output } => {
                args.push("--html-details".into());
                args.push(format!("--html={}", output.display()));
                args.push("--print-summary".into());
                true
            }
            CoverageMode::Text => {
                args.push("--txt".into());
                args.push("--print-summary".into());
                true
            }
            CoverageMode::Gate { thresholds } => {
                args.push("--fail-under-line".into());
                args.push(format_percent(thresholds.min_line_percent));
                args.push("--fail-under-branch".into());
                args.push(format_percent(thresholds.min_branch_percent));
                false
            }
        };
        if report {
            args.push("--exclude-throw-branches".into());
            args.push("--exclude-unreachable-branches".into());
        }
        args.push("--root".into());
        args.push(request.source_root.display().to_string());
        args.push("--object-directory".into());
        args.push(request.object_dir.display().to_string());
        if report {
            args.push("-j".into());
            args.push(request.jobs.to_string());
        }
        for pattern in &request.exclude {
            args.push("--exclude".into());
            args.push(pattern.clone());
        }
        args
    }
}

impl CoverageTool for GcovrTool {
    fn run(&self, request: &CoverageRequest) -> Result<ToolRun, ToolError> {
        let stdout = match request.mode {
            CoverageMode::Text => Stdout::Capture,
            CoverageMode::HtmlDetails { .. } | CoverageMode::Gate { .. } => self.passthrough,
        };
        run_tool(&self.argv, &Self::arguments(request), stdout, self.timeout, "gcovr")
    }

    fn name(&self) -> &'static str {
        "gcovr"
    }
}
