use fwgate_core::config::VerifyConfig;
use fwgate_core::layout::BuildLayout;
use fwgate_core::services::coverage::{CoverageMode, CoverageRequest, CoverageTool};
use fwgate_core::services::pipeline::{GatePolicy, VerificationPipeline};
use fwgate_core::services::size::NoSymbols;
use fwgate_core::services::tools::{ToolError, ToolRun};
use tempfile::tempdir;

struct GateExit(i32);

impl CoverageTool for GateExit {
    fn run(&self, request: &CoverageRequest) -> Result<ToolRun, ToolError> {
        let code = match request.mode {
            CoverageMode::Gate { .. } => self.0,
            _ => 0,
        };
        Ok(ToolRun { exit_code: Some(code), stdout: String::new() })
    }

    fn name(&self) -> &'static str {
        "gate-exit"
    }
}

fn build_dir_with_binary() -> (tempfile::TempDir, BuildLayout, VerifyConfig) {
    let temp = tempdir().unwrap();
    let binary = temp.path().join("firmware.elf");
    std::fs::write(&binary, vec![0u8; 1024]).unwrap();
    let cfg = VerifyConfig::default();
    let layout = BuildLayout::new(&binary, None, &cfg);
    (temp, layout, cfg)
}

#[test]
fn below_threshold_coverage_completes_under_advisory_policy() {
    let (_temp, layout, cfg) = build_dir_with_binary();
    let tool = GateExit(2);
    let pipeline = VerificationPipeline { config: &cfg, symbols: &NoSymbols, coverage_tool: &tool };

    let outcome = pipeline.run(&layout, true);
    assert!(outcome.size.is_ok());
    assert!(matches!(outcome.coverage, Some(Ok(_))));
    assert!(!outcome.coverage_passed());
    assert!(!outcome.is_fatal(GatePolicy::Advisory));
    assert!(outcome.is_fatal(GatePolicy::Enforcing));
}

#[test]
fn passing_run_is_never_fatal() {
    let (_temp, layout, cfg) = build_dir_with_binary();
    let tool = GateExit(0);
    let pipeline = VerificationPipeline { config: &cfg, symbols: &NoSymbols, coverage_tool: &tool };

    let outcome = pipeline.run(&layout, true);
    assert!(outcome.coverage_passed());
    assert!(!outcome.is_fatal(GatePolicy::Advisory));
    assert!(!outcome.is_fatal(GatePolicy::Enforcing));
}

#[test]
fn skipped_coverage_leaves_only_size_result() {
    let (_temp, layout, cfg) = build_dir_with_binary();
    let tool = GateExit(2);
    let pipeline = VerificationPipeline { config: &cfg, symbols: &NoSymbols, coverage_tool: &tool };

    let outcome = pipeline.run(&layout, false);
    assert!(outcome.coverage.is_none());
    assert!(!outcome.is_fatal(GatePolicy::Enforcing));
}

#[test]
fn missing_binary_with_skipped_coverage_is_fatal_even_when_advisory() {
    let temp = tempdir().unwrap();
    let cfg = VerifyConfig::default();
    let layout = BuildLayout::new(temp.path().join("absent.elf"), None, &cfg);
    let tool = GateExit(0);
    let pipeline = VerificationPipeline { config: &cfg, symbols: &NoSymbols, coverage_tool: &tool };

    let outcome = pipeline.run(&layout, false);
    assert!(outcome.size.is_err());
    assert!(outcome.is_fatal(GatePolicy::Advisory));
}

#[test]
fn missing_binary_with_working_coverage_is_advisory() {
    let temp = tempdir().unwrap();
    let cfg = VerifyConfig::default();
    let layout = BuildLayout::new(temp.path().join("absent.elf"), None, &cfg);
    let tool = GateExit(0);
    let pipeline = VerificationPipeline { config: &cfg, symbols: &NoSymbols, coverage_tool: &tool };

    let outcome = pipeline.run(&layout, true);
    assert!(outcome.size.is_err());
    assert!(!outcome.is_fatal(GatePolicy::Advisory));
    assert!(outcome.is_fatal(GatePolicy::Enforcing));
    assert_eq!(GatePolicy::from_enforce(true), GatePolicy::Enforcing);
}
