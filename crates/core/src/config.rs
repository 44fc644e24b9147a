use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the symbol-table tool argv (whitespace separated).
pub const NM_ENV: &str = "FWGATE_NM";
/// Environment variable overriding the coverage tool argv (whitespace separated).
pub const GCOVR_ENV: &str = "FWGATE_GCOVR";

/// Hardware capacities of the target device and the warning limits applied to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    /// Flash capacity in bytes.
    pub flash_capacity: u64,
    /// RAM capacity in bytes.
    pub ram_capacity: u64,
    /// Flash utilization (percent) above which a warning is emitted.
    pub flash_warn_percent: f64,
    /// RAM utilization (percent) above which a warning is emitted.
    pub ram_warn_percent: f64,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            flash_capacity: 2 * 1024 * 1024,
            ram_capacity: 264 * 1024,
            flash_warn_percent: 70.0,
            ram_warn_percent: 50.0,
        }
    }
}

/// Minimum acceptable coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageThresholds {
    pub min_line_percent: f64,
    pub min_branch_percent: f64,
}

impl Default for CoverageThresholds {
    fn default() -> Self {
        Self { min_line_percent: 80.0, min_branch_percent: 70.0 }
    }
}

/// Settings for the coverage stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageSettings {
    pub thresholds: CoverageThresholds,
    /// Worker count handed to the coverage tool (`-j`).
    pub jobs: u32,
    /// Path regexes excluded from coverage metrics.
    pub exclude: Vec<String>,
    /// Source root handed to the coverage tool (`--root`).
    pub source_root: PathBuf,
    /// Name of the report directory created under the build directory.
    pub report_dir: String,
    /// Treat a failing gate as fatal instead of advisory.
    pub enforce: bool,
}

impl Default for CoverageSettings {
    fn default() -> Self {
        Self {
            thresholds: CoverageThresholds::default(),
            jobs: 4,
            exclude: vec!["test/.*".to_string(), "lib/.*".to_string()],
            source_root: PathBuf::from("."),
            report_dir: "coverage".to_string(),
            enforce: false,
        }
    }
}

/// External tool invocations. Each tool is an argv prefix so wrappers such as
/// `python3 -m gcovr` work without a shim script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub nm: Vec<String>,
    pub gcovr: Vec<String>,
    /// Upper bound for each tool invocation. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
    /// Number of largest symbols listed in the size report.
    pub top_symbols: usize,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            nm: vec!["arm-none-eabi-nm".to_string()],
            gcovr: vec!["gcovr".to_string()],
            timeout_secs: Some(600),
            top_symbols: 20,
        }
    }
}

impl ToolSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Apply `FWGATE_NM` / `FWGATE_GCOVR` overrides when set and non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Some(argv) = argv_from_env(NM_ENV) {
            self.nm = argv;
        }
        if let Some(argv) = argv_from_env(GCOVR_ENV) {
            self.gcovr = argv;
        }
    }
}

fn argv_from_env(key: &str) -> Option<Vec<String>> {
    let value = std::env::var(key).ok()?;
    let argv: Vec<String> = value.split_whitespace().map(str::to_string).collect();
    if argv.is_empty() {
        None
    } else {
        Some(argv)
    }
}

/// Serializable configuration for a verification run.
///
/// Every field has a default matching the target board, so an empty file (or
/// no file at all) yields a working configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Schema/config version. This is about the config format, not the firmware version.
    pub config_version: String,
    pub budget: Budget,
    pub coverage: CoverageSettings,
    pub tools: ToolSettings,
    /// Extension of the linker map written next to the binary.
    pub map_extension: String,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            config_version: "0.1.0".to_string(),
            budget: Budget::default(),
            coverage: CoverageSettings::default(),
            tools: ToolSettings::default(),
            map_extension: "map".to_string(),
        }
    }
}

/// Load a config file from disk. `.yaml`/`.yml` are parsed as YAML, everything else as JSON.
pub fn load_config(path: &Path) -> Result<VerifyConfig> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let config: VerifyConfig = match ext {
        "yaml" | "yml" => serde_yaml::from_str(&body)
            .with_context(|| format!("Failed to parse YAML config {}", path.display()))?,
        _ => serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse JSON config {}", path.display()))?,
    };
    config.validate()?;
    Ok(config)
}

/// Load the config at `path` if given, otherwise use defaults; env overrides are applied last.
pub fn resolve_config(path: Option<&Path>) -> Result<VerifyConfig> {
    let mut config = match path {
        Some(p) => load_config(p)?,
        None => VerifyConfig::default(),
    };
    config.tools.apply_env_overrides();
    Ok(config)
}

impl VerifyConfig {
    /// Reject configurations that would divide by zero or never invoke a tool.
    pub fn validate(&self) -> Result<()> {
        if self.budget.flash_capacity == 0 {
            return Err(anyhow!("budget.flash_capacity must be greater than zero"));
        }
        if self.budget.ram_capacity == 0 {
            return Err(anyhow!("budget.ram_capacity must be greater than zero"));
        }
        if self.tools.nm.is_empty() {
            return Err(anyhow!("tools.nm must name a program"));
        }
        if self.tools.gcovr.is_empty() {
            return Err(anyhow!("tools.gcovr must name a program"));
        }
        if self.coverage.jobs == 0 {
            return Err(anyhow!("coverage.jobs must be at least 1"));
        }
        Ok(())
    }
}
