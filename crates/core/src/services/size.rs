use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Budget, VerifyConfig};
use crate::layout::map_path_for;
use crate::model::BuildArtifact;
use crate::services::tools::ToolError;

#[derive(Debug, Error)]
pub enum SizeError {
    #[error("Binary not found at {0}")]
    MissingBinary(PathBuf),
    #[error("Failed to read binary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Capability used for the diagnostic "largest symbols" listing.
pub trait SymbolLister: Send + Sync {
    /// Return up to `count` symbol lines, largest last.
    fn largest_symbols(&self, binary: &Path, count: usize) -> Result<Vec<String>, ToolError>;
    fn name(&self) -> &'static str;
}

/// Lister that never shells out; used when symbol listing is switched off.
pub struct NoSymbols;

impl SymbolLister for NoSymbols {
    fn largest_symbols(&self, _binary: &Path, _count: usize) -> Result<Vec<String>, ToolError> {
        Ok(vec![])
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Static-memory section a map line was attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemorySection {
    Data,
    Bss,
}

/// One linker-map line that counts against RAM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMapEntry {
    pub section: MemorySection,
    /// First token of the line as written in the map (e.g. `.data`, `.bss.buffer`).
    pub name: String,
    pub size: u64,
}

/// Parse one map line. Returns `None` for lines that do not mention `.data`/`.bss`
/// or whose second token is not hexadecimal.
pub fn parse_map_line(line: &str) -> Option<MemoryMapEntry> {
    let section = if line.contains(".data") {
        MemorySection::Data
    } else if line.contains(".bss") {
        MemorySection::Bss
    } else {
        return None;
    };
    let mut tokens = line.split_whitespace();
    let name = tokens.next()?.to_string();
    let raw = tokens.next()?;
    let digits = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")).unwrap_or(raw);
    match u64::from_str_radix(digits, 16) {
        Ok(size) => Some(MemoryMapEntry { section, name, size }),
        Err(_) => {
            tracing::trace!(line, "skipping map line with non-hex size token");
            None
        }
    }
}

/// Lazily yield the RAM-relevant entries of a map file, skipping anything unparsable.
pub fn parse_map_entries(body: &str) -> impl Iterator<Item = MemoryMapEntry> + '_ {
    body.lines().filter_map(parse_map_line)
}

/// Total `.data` + `.bss` bytes in a map file body.
pub fn ram_usage(body: &str) -> u64 {
    parse_map_entries(body).fold(0u64, |acc, entry| acc.saturating_add(entry.size))
}

/// Utilization as a percentage of `capacity`.
pub fn percent_of(used: u64, capacity: u64) -> f64 {
    if capacity == 0 {
        return 0.0;
    }
    used as f64 / capacity as f64 * 100.0
}

/// A budget limit that was exceeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "memory", rename_all = "snake_case")]
pub enum BudgetBreach {
    Flash { percent: f64, limit: f64 },
    Ram { percent: f64, limit: f64 },
}

impl BudgetBreach {
    pub fn message(&self) -> String {
        match self {
            BudgetBreach::Flash { limit, .. } => format!("WARNING: Flash usage exceeds {limit}% limit!"),
            BudgetBreach::Ram { limit, .. } => format!("WARNING: RAM usage exceeds {limit}% limit!"),
        }
    }
}

/// Flash/RAM figures checked against a budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utilization {
    pub flash_used: u64,
    pub flash_capacity: u64,
    pub flash_percent: f64,
    pub ram_used: u64,
    pub ram_capacity: u64,
    pub ram_percent: f64,
    pub breaches: Vec<BudgetBreach>,
}

/// Apply the budget to measured usage. Limits are exclusive: exactly 70% does not warn.
pub fn evaluate(flash_used: u64, ram_used: u64, budget: &Budget) -> Utilization {
    let flash_percent = percent_of(flash_used, budget.flash_capacity);
    let ram_percent = percent_of(ram_used, budget.ram_capacity);
    let mut breaches = Vec::new();
    if flash_percent > budget.flash_warn_percent {
        breaches.push(BudgetBreach::Flash {
            percent: flash_percent,
            limit: budget.flash_warn_percent,
        });
    }
    if ram_percent > budget.ram_warn_percent {
        breaches.push(BudgetBreach::Ram { percent: ram_percent, limit: budget.ram_warn_percent });
    }
    Utilization {
        flash_used,
        flash_capacity: budget.flash_capacity,
        flash_percent,
        ram_used,
        ram_capacity: budget.ram_capacity,
        ram_percent,
        breaches,
    }
}

/// Outcome of one size analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeReport {
    pub artifact: BuildArtifact,
    pub map_path: PathBuf,
    /// `false` when the map was missing or unreadable and RAM was reported as zero.
    pub map_found: bool,
    pub utilization: Utilization,
    pub top_symbols: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbols_error: Option<String>,
}

impl SizeReport {
    pub fn has_breaches(&self) -> bool {
        !self.utilization.breaches.is_empty()
    }

    /// Human-readable report as printed to the build log.
    pub fn render(&self) -> String {
        let u = &self.utilization;
        let mut out = String::new();
        let _ = writeln!(out, "Firmware Size Analysis:");
        let _ = writeln!(out, "-----------------------");
        let _ = writeln!(
            out,
            "Flash Usage: {} bytes ({:.1}% of {} bytes)",
            group_thousands(u.flash_used),
            u.flash_percent,
            group_thousands(u.flash_capacity)
        );
        let _ = writeln!(
            out,
            "RAM Usage:  {} bytes ({:.1}% of {} bytes)",
            group_thousands(u.ram_used),
            u.ram_percent,
            group_thousands(u.ram_capacity)
        );
        if !self.map_found {
            let _ = writeln!(out, "(no map file at {}; RAM not measured)", self.map_path.display());
        }
        for breach in &u.breaches {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", breach.message());
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Memory Map:");
        let _ = writeln!(out, "-----------");
        if let Some(err) = &self.symbols_error {
            let _ = writeln!(out, "(symbol listing unavailable: {err})");
        }
        for line in &self.top_symbols {
            let _ = writeln!(out, "{line}");
        }
        out
    }
}

/// Format an integer with `,` thousands separators (`1500000` -> `1,500,000`).
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Measures a linked binary against the flash/RAM budget.
pub struct SizeBudgetAnalyzer<'a> {
    pub config: &'a VerifyConfig,
    pub symbols: &'a dyn SymbolLister,
}

impl<'a> SizeBudgetAnalyzer<'a> {
    pub fn new(config: &'a VerifyConfig, symbols: &'a dyn SymbolLister) -> Self {
        Self { config, symbols }
    }

    pub fn analyze(&self, binary: &Path) -> Result<SizeReport, SizeError> {
        if !binary.is_file() {
            return Err(SizeError::MissingBinary(binary.to_path_buf()));
        }
        let artifact = BuildArtifact::inspect(binary)
            .map_err(|source| SizeError::Io { path: binary.to_path_buf(), source })?;

        let map_path = map_path_for(binary, &self.config.map_extension);
        let (map_found, ram_used) = match fs::read(&map_path) {
            Ok(bytes) => (true, ram_usage(&String::from_utf8_lossy(&bytes))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(map = %map_path.display(), "no linker map; RAM usage reported as 0");
                (false, 0)
            }
            Err(err) => {
                tracing::warn!(map = %map_path.display(), error = %err, "linker map unreadable; RAM usage reported as 0");
                (false, 0)
            }
        };

        let utilization = evaluate(artifact.size, ram_used, &self.config.budget);
        for breach in &utilization.breaches {
            tracing::warn!("{}", breach.message());
        }

        let (top_symbols, symbols_error) =
            match self.symbols.largest_symbols(binary, self.config.tools.top_symbols) {
                Ok(lines) => (lines, None),
                Err(err) => {
                    tracing::warn!(lister = self.symbols.name(), error = %err, "symbol listing failed");
                    (vec![], Some(err.to_string()))
                }
            };

        Ok(SizeReport { artifact, map_path, map_found, utilization, top_symbols, symbols_error })
    }
}
