use std::thread;

use crate::config::VerifyConfig;
use crate::layout::BuildLayout;
use crate::services::coverage::{CoverageError, CoverageGate, CoverageOutcome, CoverageTool};
use crate::services::size::{SizeBudgetAnalyzer, SizeError, SizeReport, SymbolLister};

/// How stage failures translate into the caller's exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePolicy {
    /// Warnings only; fatal only when nothing could be measured at all.
    Advisory,
    /// Any stage error or failing coverage gate is fatal.
    Enforcing,
}

impl GatePolicy {
    pub fn from_enforce(enforce: bool) -> Self {
        if enforce {
            GatePolicy::Enforcing
        } else {
            GatePolicy::Advisory
        }
    }
}

/// Both stage results from one pipeline run.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub size: Result<SizeReport, SizeError>,
    /// `None` when coverage was skipped.
    pub coverage: Option<Result<CoverageOutcome, CoverageError>>,
}

impl PipelineOutcome {
    pub fn coverage_passed(&self) -> bool {
        matches!(&self.coverage, Some(Ok(outcome)) if outcome.verdict.passed())
    }

    /// Whether the caller should report failure under `policy`.
    pub fn is_fatal(&self, policy: GatePolicy) -> bool {
        let size_failed = self.size.is_err();
        let coverage_failed = matches!(self.coverage, Some(Err(_)));
        match policy {
            GatePolicy::Advisory => size_failed && (coverage_failed || self.coverage.is_none()),
            GatePolicy::Enforcing => {
                size_failed || coverage_failed || (self.coverage.is_some() && !self.coverage_passed())
            }
        }
    }
}

/// Coordinator that runs the size analyzer and the coverage gate for one build.
pub struct VerificationPipeline<'a> {
    pub config: &'a VerifyConfig,
    pub symbols: &'a dyn SymbolLister,
    pub coverage_tool: &'a dyn CoverageTool,
}

impl<'a> VerificationPipeline<'a> {
    /// Run both stages concurrently. They share only read-only inputs.
    pub fn run(&self, layout: &BuildLayout, with_coverage: bool) -> PipelineOutcome {
        let analyzer = SizeBudgetAnalyzer::new(self.config, self.symbols);
        let gate = CoverageGate::new(self.config, self.coverage_tool);

        thread::scope(|scope| {
            let coverage =
                if with_coverage { Some(scope.spawn(|| gate.run(layout))) } else { None };
            let size = analyzer.analyze(&layout.binary_path);
            let coverage = coverage.map(|handle| match handle.join() {
                Ok(result) => result,
                Err(payload) => std::panic::resume_unwind(payload),
            });
            PipelineOutcome { size, coverage }
        })
    }
}
