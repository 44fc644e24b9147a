#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Write a fake firmware image of `size` bytes plus an optional map file.
pub fn write_firmware(dir: &Path, size: usize, map: Option<&str>) -> PathBuf {
    let binary = dir.join("firmware.elf");
    fs::write(&binary, vec![0u8; size]).expect("write binary");
    if let Some(body) = map {
        fs::write(dir.join("firmware.map"), body).expect("write map");
    }
    binary
}

/// Shell stand-in for gcovr: prints a summary on every run like gcovr does,
/// and exits `gate_exit` for the gate.
pub fn write_fake_gcovr(dir: &Path, gate_exit: i32) -> PathBuf {
    let script = dir.join("fake_gcovr.sh");
    let body = format!(
        r#"for arg in "$@"; do
  case "$arg" in
    --html-details) echo "lines: 75.0% (150 out of 200)"; echo "branches: 72.0% (72 out of 100)"; exit 0 ;;
    --txt) echo "lines: 75.0% (150 out of 200)"; echo "branches: 72.0% (72 out of 100)"; exit 0 ;;
    --fail-under-line)
      if [ {gate_exit} -ne 0 ]; then echo "failed minimum line coverage (got 75.0%)"; fi
      exit {gate_exit} ;;
  esac
done
exit 0
"#
    );
    fs::write(&script, body).expect("write fake gcovr");
    script
}

/// Config pointing both tools at stand-ins so no real toolchain is needed.
pub fn write_config(dir: &Path, gcovr_script: &Path) -> PathBuf {
    let path = dir.join("fwgate.json");
    let config = serde_json::json!({
        "tools": {
            "nm": ["/nonexistent/arm-none-eabi-nm"],
            "gcovr": ["sh", gcovr_script.display().to_string()],
            "timeout_secs": 30
        }
    });
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).expect("write config");
    path
}
