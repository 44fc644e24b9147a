pub mod commands;

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Resolve `path` against the current working directory, canonicalizing when it exists.
///
/// Paths that do not exist yet are joined with the current directory so error
/// messages downstream still show an absolute location.
pub fn absolute_path(path: &str) -> Result<PathBuf> {
    let p = Path::new(path);
    match p.canonicalize() {
        Ok(canon) => Ok(canon),
        Err(_) if p.is_absolute() => Ok(p.to_path_buf()),
        Err(_) => {
            let cwd = env::current_dir().context("Failed to get current directory")?;
            Ok(cwd.join(p))
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins; otherwise `info`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
