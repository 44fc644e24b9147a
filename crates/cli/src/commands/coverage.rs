use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use fwgate_core::layout::BuildLayout;
use fwgate_core::services::coverage::{CoverageGate, CoverageOutcome};
use fwgate_core::services::pipeline::GatePolicy;
use fwgate_core::services::tools::{GcovrTool, Stdout};

use crate::absolute_path;
use crate::commands::{load_verify_config, now_rfc3339, print_json, RunEnvelope};

#[derive(Serialize)]
pub struct CoverageJson<'a> {
    pub outcome: &'a CoverageOutcome,
}

/// Generate HTML and text coverage reports for a build directory and apply the gate.
///
/// Under the advisory policy a failing gate only prints a warning. With
/// `enforce` (or `coverage.enforce` in the config) it becomes an error.
pub fn coverage_command(
    build_dir: &str,
    source_root: Option<&str>,
    config_path: Option<&str>,
    json: bool,
    enforce: bool,
) -> Result<()> {
    let started_at = now_rfc3339();
    let mut config = load_verify_config(config_path)?;
    if let Some(root) = source_root {
        config.coverage.source_root = absolute_path(root)?;
    }
    let policy = GatePolicy::from_enforce(enforce || config.coverage.enforce);
    let layout = BuildLayout::for_build_dir(absolute_path(build_dir)?, &config);

    let tool = GcovrTool::from_settings(&config.tools).with_passthrough(passthrough_for(json));
    let outcome = CoverageGate::new(&config, &tool)
        .run(&layout)
        .with_context(|| format!("Coverage run failed for {}", layout.build_dir.display()))?;

    if json {
        print_json(&RunEnvelope::new(started_at, CoverageJson { outcome: &outcome }))?;
    } else {
        println!();
        print!("{}", outcome.render());
    }

    if policy == GatePolicy::Enforcing && !outcome.verdict.passed() {
        return Err(anyhow!(
            "Coverage gate failed: required {}% line and {}% branch coverage",
            outcome.thresholds.min_line_percent,
            outcome.thresholds.min_branch_percent
        ));
    }
    Ok(())
}

/// gcovr's own console output goes to stderr when stdout carries JSON.
pub fn passthrough_for(json: bool) -> Stdout {
    if json {
        Stdout::Stderr
    } else {
        Stdout::Inherit
    }
}
