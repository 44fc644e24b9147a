use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{CoverageThresholds, VerifyConfig};
use crate::layout::BuildLayout;
use crate::services::tools::{ToolError, ToolRun};

#[derive(Debug, Error)]
pub enum CoverageError {
    #[error("Object directory not found at {0}")]
    MissingObjectDir(PathBuf),
    #[error("Failed to create report directory {path}: {source}")]
    CreateReportDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write coverage report {path}: {source}")]
    WriteReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Which report (or check) a coverage invocation produces.
#[derive(Debug, Clone, PartialEq)]
pub enum CoverageMode {
    HtmlDetails { output: PathBuf },
    Text,
    Gate { thresholds: CoverageThresholds },
}

/// One invocation of the coverage aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageRequest {
    pub mode: CoverageMode,
    pub object_dir: PathBuf,
    pub source_root: PathBuf,
    pub exclude: Vec<String>,
    pub jobs: u32,
}

/// Capability implemented by coverage aggregators (gcovr, or a fake in tests).
pub trait CoverageTool: Send + Sync {
    fn run(&self, request: &CoverageRequest) -> Result<ToolRun, ToolError>;
    fn name(&self) -> &'static str;
}

/// Headline figures scraped from the text report, when the tool printed them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub line_percent: Option<f64>,
    pub branch_percent: Option<f64>,
}

/// Best-effort scan for `lines: 75.0% (...)` and `branches: 72.0% (...)`.
pub fn parse_summary(body: &str) -> CoverageSummary {
    let mut summary = CoverageSummary::default();
    for line in body.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("lines:") {
            summary.line_percent = summary.line_percent.or_else(|| leading_percent(rest));
        } else if let Some(rest) = line.strip_prefix("branches:") {
            summary.branch_percent = summary.branch_percent.or_else(|| leading_percent(rest));
        }
    }
    summary
}

fn leading_percent(text: &str) -> Option<f64> {
    let token = text.split_whitespace().next()?;
    token.strip_suffix('%')?.parse().ok()
}

/// Gate result. The gate is advisory unless the caller decides otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CoverageVerdict {
    Passed,
    BelowThreshold { exit_code: Option<i32> },
}

impl CoverageVerdict {
    pub fn passed(&self) -> bool {
        matches!(self, CoverageVerdict::Passed)
    }
}

/// Result of one coverage run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageOutcome {
    pub html_report: PathBuf,
    pub text_report: PathBuf,
    pub html_exit_code: Option<i32>,
    pub text_exit_code: Option<i32>,
    pub gate_exit_code: Option<i32>,
    pub thresholds: CoverageThresholds,
    pub summary: CoverageSummary,
    pub verdict: CoverageVerdict,
}

impl CoverageOutcome {
    /// Human-readable summary as printed to the build log.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Coverage Report Generated:");
        let _ = writeln!(out, "HTML Report: {}", self.html_report.display());
        let _ = writeln!(out, "Text Report: {}", self.text_report.display());
        if let Some(line) = self.summary.line_percent {
            let _ = writeln!(out, "Line coverage: {line:.1}%");
        }
        if let Some(branch) = self.summary.branch_percent {
            let _ = writeln!(out, "Branch coverage: {branch:.1}%");
        }
        if !self.verdict.passed() {
            let _ = writeln!(out);
            let _ = writeln!(out, "WARNING: Coverage below thresholds!");
            let _ = writeln!(
                out,
                "Required: {}% line coverage, {}% branch coverage",
                self.thresholds.min_line_percent, self.thresholds.min_branch_percent
            );
        }
        out
    }
}

/// Runs the coverage aggregator three times (HTML, text, threshold check).
pub struct CoverageGate<'a> {
    pub config: &'a VerifyConfig,
    pub tool: &'a dyn CoverageTool,
}

impl<'a> CoverageGate<'a> {
    pub fn new(config: &'a VerifyConfig, tool: &'a dyn CoverageTool) -> Self {
        Self { config, tool }
    }

    fn request(&self, mode: CoverageMode, object_dir: &Path) -> CoverageRequest {
        let settings = &self.config.coverage;
        CoverageRequest {
            mode,
            object_dir: object_dir.to_path_buf(),
            source_root: settings.source_root.clone(),
            exclude: settings.exclude.clone(),
            jobs: settings.jobs,
        }
    }

    pub fn run(&self, layout: &BuildLayout) -> Result<CoverageOutcome, CoverageError> {
        let object_dir = &layout.build_dir;
        if !object_dir.is_dir() {
            return Err(CoverageError::MissingObjectDir(object_dir.clone()));
        }
        fs::create_dir_all(&layout.coverage_dir).map_err(|source| {
            CoverageError::CreateReportDir { path: layout.coverage_dir.clone(), source }
        })?;

        let html = self.tool.run(&self.request(
            CoverageMode::HtmlDetails { output: layout.html_report.clone() },
            object_dir,
        ))?;
        warn_on_failure(self.tool.name(), "html report", &html);

        let text = self.tool.run(&self.request(CoverageMode::Text, object_dir))?;
        warn_on_failure(self.tool.name(), "text report", &text);
        fs::write(&layout.text_report, &text.stdout).map_err(|source| {
            CoverageError::WriteReport { path: layout.text_report.clone(), source }
        })?;

        let thresholds = self.config.coverage.thresholds.clone();
        let gate = self
            .tool
            .run(&self.request(CoverageMode::Gate { thresholds: thresholds.clone() }, object_dir))?;
        let verdict = if gate.success() {
            CoverageVerdict::Passed
        } else {
            tracing::warn!(
                code = ?gate.exit_code,
                min_line = thresholds.min_line_percent,
                min_branch = thresholds.min_branch_percent,
                "coverage below thresholds"
            );
            CoverageVerdict::BelowThreshold { exit_code: gate.exit_code }
        };

        Ok(CoverageOutcome {
            html_report: layout.html_report.clone(),
            text_report: layout.text_report.clone(),
            html_exit_code: html.exit_code,
            text_exit_code: text.exit_code,
            gate_exit_code: gate.exit_code,
            thresholds,
            summary: parse_summary(&text.stdout),
            verdict,
        })
    }
}

fn warn_on_failure(tool: &str, step: &str, run: &ToolRun) {
    if !run.success() {
        tracing::warn!(tool, step, code = ?run.exit_code, "coverage step exited unsuccessfully");
    }
}
