use std::path::PathBuf;

use fwgate_core::config::{CoverageThresholds, VerifyConfig};
use fwgate_core::layout::BuildLayout;
use fwgate_core::services::coverage::{CoverageGate, CoverageMode, CoverageRequest};
use fwgate_core::services::tools::{GcovrTool, Stdout};

fn request(mode: CoverageMode) -> CoverageRequest {
    CoverageRequest {
        mode,
        object_dir: PathBuf::from(".pio/build/env"),
        source_root: PathBuf::from("."),
        exclude: vec!["test/.*".into(), "lib/.*".into()],
        jobs: 4,
    }
}

#[test]
fn html_arguments_request_detail_report() {
    let args = GcovrTool::arguments(&request(CoverageMode::HtmlDetails {
        output: PathBuf::from("cov/coverage.html"),
    }));
    assert_eq!(&args[..3], ["--html-details", "--html=cov/coverage.html", "--print-summary"]);
    assert!(args.contains(&"--exclude-throw-branches".to_string()));
    assert!(args.contains(&"--exclude-unreachable-branches".to_string()));
    assert!(args.windows(2).any(|w| w == ["--object-directory", ".pio/build/env"]));
    assert!(args.windows(2).any(|w| w == ["-j", "4"]));
    assert!(args.windows(2).any(|w| w == ["--exclude", "test/.*"]));
    assert!(args.windows(2).any(|w| w == ["--exclude", "lib/.*"]));
}

#[test]
fn gate_arguments_carry_thresholds() {
    let args = GcovrTool::arguments(&request(CoverageMode::Gate {
        thresholds: CoverageThresholds { min_line_percent: 80.0, min_branch_percent: 72.5 },
    }));
    assert_eq!(
        args,
        [
            "--fail-under-line",
            "80",
            "--fail-under-branch",
            "72.5",
            "--root",
            ".",
            "--object-directory",
            ".pio/build/env",
            "--exclude",
            "test/.*",
            "--exclude",
            "lib/.*",
        ]
    );
}

#[test]
fn report_runs_exclude_throw_branches_and_set_jobs() {
    let args = GcovrTool::arguments(&request(CoverageMode::Text));
    assert!(args.contains(&"--exclude-throw-branches".to_string()));
    assert!(args.contains(&"--exclude-unreachable-branches".to_string()));
    assert!(args.windows(2).any(|w| w == ["-j", "4"]));
}

#[test]
fn passthrough_defaults_to_inherit() {
    let tool = GcovrTool::new(vec!["gcovr".into()], None);
    assert_eq!(tool.passthrough(), Stdout::Inherit);
    assert_eq!(tool.with_passthrough(Stdout::Stderr).passthrough(), Stdout::Stderr);
}

#[test]
fn text_arguments_request_txt_summary() {
    let args = GcovrTool::arguments(&request(CoverageMode::Text));
    assert_eq!(&args[..2], ["--txt", "--print-summary"]);
    assert!(args.windows(2).any(|w| w == ["--root", "."]));
}

/// Drive the real gcovr adapter through a shell stand-in that mimics its exit codes.
#[cfg(unix)]
#[test]
fn shell_stand_in_drives_full_gate() {
    let temp = tempfile::tempdir().unwrap();
    let script = temp.path().join("fake_gcovr.sh");
    std::fs::write(
        &script,
        r#"for arg in "$@"; do
  case "$arg" in
    --txt) echo "lines: 75.0% (150 out of 200)"; echo "branches: 72.0% (72 out of 100)"; exit 0 ;;
    --fail-under-line) exit 2 ;;
  esac
done
exit 0
"#,
    )
    .unwrap();

    let mut cfg = VerifyConfig::default();
    cfg.tools.gcovr = vec!["sh".into(), script.display().to_string()];
    cfg.tools.timeout_secs = Some(30);
    let tool = GcovrTool::from_settings(&cfg.tools);
    let layout = BuildLayout::for_build_dir(temp.path(), &cfg);

    let outcome = CoverageGate::new(&cfg, &tool).run(&layout).expect("gate");
    assert!(!outcome.verdict.passed());
    assert_eq!(outcome.gate_exit_code, Some(2));
    assert_eq!(outcome.summary.line_percent, Some(75.0));
    let text = std::fs::read_to_string(&layout.text_report).unwrap();
    assert!(text.contains("branches: 72.0%"));
}
