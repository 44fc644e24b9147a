use anyhow::{Context, Result};
use serde::Serialize;

use fwgate_core::services::size::{NoSymbols, SizeBudgetAnalyzer, SizeReport, SymbolLister};
use fwgate_core::services::tools::NmSymbolLister;

use crate::absolute_path;
use crate::commands::{load_verify_config, now_rfc3339, print_json, RunEnvelope};

#[derive(Serialize)]
pub struct SizeJson<'a> {
    pub report: &'a SizeReport,
}

/// Measure a linked binary against the flash/RAM budget and print the report.
///
/// Budget breaches are warnings only; a missing binary is an error.
pub fn size_command(
    binary: &str,
    config_path: Option<&str>,
    json: bool,
    skip_symbols: bool,
) -> Result<()> {
    let started_at = now_rfc3339();
    let config = load_verify_config(config_path)?;
    let binary_path = absolute_path(binary)?;

    let nm = NmSymbolLister::from_settings(&config.tools);
    let symbols: &dyn SymbolLister = if skip_symbols { &NoSymbols } else { &nm };
    let report = SizeBudgetAnalyzer::new(&config, symbols)
        .analyze(&binary_path)
        .with_context(|| format!("Size analysis failed for {}", binary_path.display()))?;

    if json {
        return print_json(&RunEnvelope::new(started_at, SizeJson { report: &report }));
    }

    println!();
    print!("{}", report.render());
    Ok(())
}
