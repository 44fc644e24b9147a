use std::path::{Path, PathBuf};

use crate::config::VerifyConfig;

/// Logical layout of one build's artifacts on disk.
///
/// This is derived from the binary path (and optionally an explicit build
/// directory). It does *not* perform any IO itself; the stages create the
/// report directory when they need it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    /// The linked firmware image.
    pub binary_path: PathBuf,
    /// Linker map next to the binary (same stem, map extension).
    pub map_path: PathBuf,
    /// Build output directory; doubles as the coverage object directory.
    pub build_dir: PathBuf,
    /// Directory receiving coverage reports.
    pub coverage_dir: PathBuf,
    /// HTML detail report.
    pub html_report: PathBuf,
    /// Plain-text summary report.
    pub text_report: PathBuf,
}

impl BuildLayout {
    /// Compute the layout for `binary`. The build directory defaults to the
    /// binary's parent directory.
    pub fn new(binary: impl AsRef<Path>, build_dir: Option<&Path>, config: &VerifyConfig) -> Self {
        let binary_path = binary.as_ref().to_path_buf();
        let map_path = map_path_for(&binary_path, &config.map_extension);
        let build_dir = match build_dir {
            Some(dir) => dir.to_path_buf(),
            None => binary_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        Self::assemble(binary_path, map_path, build_dir, config)
    }

    /// Layout for a coverage-only run where no binary is involved.
    pub fn for_build_dir(build_dir: impl AsRef<Path>, config: &VerifyConfig) -> Self {
        let build_dir = build_dir.as_ref().to_path_buf();
        Self::assemble(PathBuf::new(), PathBuf::new(), build_dir, config)
    }

    fn assemble(
        binary_path: PathBuf,
        map_path: PathBuf,
        build_dir: PathBuf,
        config: &VerifyConfig,
    ) -> Self {
        let coverage_dir = build_dir.join(&config.coverage.report_dir);
        let html_report = coverage_dir.join("coverage.html");
        let text_report = coverage_dir.join("coverage.txt");
        Self { binary_path, map_path, build_dir, coverage_dir, html_report, text_report }
    }
}

/// Derive the linker map path from a binary path (`firmware.elf` -> `firmware.map`).
pub fn map_path_for(binary: &Path, extension: &str) -> PathBuf {
    binary.with_extension(extension)
}
