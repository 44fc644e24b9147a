use anyhow::{anyhow, Result};
use serde::Serialize;

use fwgate_core::layout::BuildLayout;
use fwgate_core::services::coverage::CoverageOutcome;
use fwgate_core::services::pipeline::{GatePolicy, PipelineOutcome, VerificationPipeline};
use fwgate_core::services::size::{NoSymbols, SizeReport, SymbolLister};
use fwgate_core::services::tools::{GcovrTool, NmSymbolLister};

use crate::absolute_path;
use crate::commands::{
    load_verify_config, now_rfc3339, passthrough_for, print_json, RunEnvelope, StageJson,
};

#[derive(Serialize)]
pub struct VerifyJson<'a> {
    pub size: StageJson<'a, SizeReport>,
    pub coverage: StageJson<'a, CoverageOutcome>,
    pub fatal: bool,
}

/// Options for `verify`, grouped so the command signature stays readable.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub build_dir: Option<String>,
    pub source_root: Option<String>,
    pub config_path: Option<String>,
    pub json: bool,
    pub enforce: bool,
    pub skip_coverage: bool,
    pub skip_symbols: bool,
}

/// Run the size analyzer and the coverage gate for one build and print both reports.
pub fn verify_command(binary: &str, opts: &VerifyOptions) -> Result<()> {
    let started_at = now_rfc3339();
    let mut config = load_verify_config(opts.config_path.as_deref())?;
    if let Some(root) = &opts.source_root {
        config.coverage.source_root = absolute_path(root)?;
    }
    let policy = GatePolicy::from_enforce(opts.enforce || config.coverage.enforce);

    let binary_path = absolute_path(binary)?;
    let build_dir = opts.build_dir.as_deref().map(absolute_path).transpose()?;
    let layout = BuildLayout::new(&binary_path, build_dir.as_deref(), &config);

    let nm = NmSymbolLister::from_settings(&config.tools);
    let symbols: &dyn SymbolLister = if opts.skip_symbols { &NoSymbols } else { &nm };
    let gcovr =
        GcovrTool::from_settings(&config.tools).with_passthrough(passthrough_for(opts.json));
    let pipeline = VerificationPipeline { config: &config, symbols, coverage_tool: &gcovr };

    let outcome = pipeline.run(&layout, !opts.skip_coverage);
    let fatal = outcome.is_fatal(policy);

    if opts.json {
        let coverage = match &outcome.coverage {
            Some(result) => StageJson::from_result(result),
            None => StageJson::Skipped,
        };
        let body = VerifyJson { size: StageJson::from_result(&outcome.size), coverage, fatal };
        print_json(&RunEnvelope::new(started_at, body))?;
    } else {
        print_outcome(&outcome);
    }

    if fatal {
        return Err(anyhow!("Verification failed ({} policy)", policy_name(policy)));
    }
    Ok(())
}

fn print_outcome(outcome: &PipelineOutcome) {
    println!();
    match &outcome.size {
        Ok(report) => print!("{}", report.render()),
        Err(err) => println!("Size analysis failed: {err}"),
    }
    match &outcome.coverage {
        Some(Ok(cov)) => {
            println!();
            print!("{}", cov.render());
        }
        Some(Err(err)) => {
            println!();
            println!("Coverage run failed: {err}");
        }
        None => {}
    }
}

fn policy_name(policy: GatePolicy) -> &'static str {
    match policy {
        GatePolicy::Advisory => "advisory",
        GatePolicy::Enforcing => "enforcing",
    }
}
