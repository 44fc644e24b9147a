//! Core data model for build artifacts under verification.

use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The linked binary under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildArtifact {
    pub path: PathBuf,
    /// Size on disk in bytes; this is what counts against flash.
    pub size: u64,
    /// SHA-256 of the image, hex encoded.
    pub sha256: String,
}

impl BuildArtifact {
    /// Stat and fingerprint the binary at `path`.
    pub fn inspect(path: &Path) -> std::io::Result<Self> {
        let size = fs::metadata(path)?.len();
        let sha256 = sha256_file(path)?;
        Ok(Self { path: path.to_path_buf(), size, sha256 })
    }
}

/// Compute the SHA-256 hash of a file and return it as a hex string.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
