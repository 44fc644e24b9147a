mod helpers;

use fwgate::absolute_path;
use fwgate::commands::{
    init_config_command, load_verify_config, show_config_command, size_command, verify_command,
    StageJson, VerifyOptions,
};
use tempfile::tempdir;

use helpers::write_firmware;

#[test]
fn size_command_runs_directly() {
    let temp = tempdir().unwrap();
    let binary = write_firmware(temp.path(), 512, Some(".data 10\n"));
    size_command(&binary.to_string_lossy(), None, false, true).unwrap();
    size_command(&binary.to_string_lossy(), None, true, true).unwrap();
}

#[test]
fn size_command_errors_for_missing_binary() {
    let temp = tempdir().unwrap();
    let missing = temp.path().join("nothing.elf");
    let err = size_command(&missing.to_string_lossy(), None, false, true).unwrap_err();
    assert!(err.to_string().contains("Size analysis failed"), "unexpected error: {err}");
}

#[test]
fn verify_command_size_only_succeeds() {
    let temp = tempdir().unwrap();
    let binary = write_firmware(temp.path(), 512, None);
    let opts = VerifyOptions { skip_coverage: true, skip_symbols: true, ..Default::default() };
    verify_command(&binary.to_string_lossy(), &opts).unwrap();
}

#[test]
fn verify_command_enforcing_fails_when_coverage_tool_missing() {
    let temp = tempdir().unwrap();
    let binary = write_firmware(temp.path(), 512, None);
    let config = temp.path().join("fwgate.json");
    std::fs::write(&config, r#"{ "tools": { "gcovr": ["/nonexistent/gcovr"] } }"#).unwrap();
    let opts = VerifyOptions {
        config_path: Some(config.to_string_lossy().to_string()),
        enforce: true,
        skip_symbols: true,
        ..Default::default()
    };
    let err = verify_command(&binary.to_string_lossy(), &opts).unwrap_err();
    assert!(err.to_string().contains("enforcing"));
}

#[test]
fn verify_command_advisory_tolerates_missing_coverage_tool() {
    let temp = tempdir().unwrap();
    let binary = write_firmware(temp.path(), 512, None);
    let config = temp.path().join("fwgate.json");
    std::fs::write(&config, r#"{ "tools": { "gcovr": ["/nonexistent/gcovr"] } }"#).unwrap();
    let opts = VerifyOptions {
        config_path: Some(config.to_string_lossy().to_string()),
        skip_symbols: true,
        ..Default::default()
    };
    verify_command(&binary.to_string_lossy(), &opts).unwrap();
}

#[test]
fn init_config_round_trips_through_loader() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("nested").join("fwgate.json");
    let path_str = path.to_string_lossy().to_string();
    init_config_command(&path_str, false).unwrap();
    let loaded = load_verify_config(Some(path_str.as_str())).unwrap();
    assert_eq!(loaded.budget.ram_capacity, 270_336);

    assert!(init_config_command(&path_str, false).is_err());
    init_config_command(&path_str, true).unwrap();
    show_config_command(Some(path_str.as_str()), false).unwrap();
    show_config_command(None, true).unwrap();
}

#[test]
fn show_config_errors_on_corrupt_file() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("fwgate.json");
    std::fs::write(&path, "not-json").unwrap();
    let err = show_config_command(Some(&*path.to_string_lossy()), false).unwrap_err();
    assert!(err.to_string().contains("Failed to parse JSON config"));
}

#[test]
fn stage_json_maps_errors_to_messages() {
    let ok: Result<u32, String> = Ok(7);
    let err: Result<u32, String> = Err("boom".into());
    let ok_json = serde_json::to_value(StageJson::from_result(&ok)).unwrap();
    let err_json = serde_json::to_value(StageJson::from_result(&err)).unwrap();
    assert_eq!(ok_json, serde_json::json!({ "status": "ok", "report": 7 }));
    assert_eq!(err_json, serde_json::json!({ "status": "error", "message": "boom" }));
}

#[test]
fn absolute_path_resolves_existing_and_missing_paths() {
    let temp = tempdir().unwrap();
    let existing = absolute_path(&temp.path().to_string_lossy()).unwrap();
    assert_eq!(existing, temp.path().canonicalize().unwrap());

    let missing = absolute_path("definitely-missing-dir/firmware.elf").unwrap();
    assert!(missing.is_absolute());
    assert!(missing.ends_with("definitely-missing-dir/firmware.elf"));
}
