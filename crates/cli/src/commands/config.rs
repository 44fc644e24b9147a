use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use fwgate_core::config::VerifyConfig;

use crate::commands::{load_verify_config, print_json};

/// Write the default configuration to `path` (YAML for `.yaml`/`.yml`, JSON otherwise).
pub fn init_config_command(path: &str, force: bool) -> Result<()> {
    let target = Path::new(path);
    if target.exists() && !force {
        return Err(anyhow!("Config already exists at {} (use --force to overwrite)", path));
    }
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir: {}", parent.display()))?;
    }

    let config = VerifyConfig::default();
    let ext = target.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let body = match ext {
        "yaml" | "yml" => serde_yaml::to_string(&config)?,
        _ => serde_json::to_string_pretty(&config)?,
    };
    fs::write(target, body)
        .with_context(|| format!("Failed to write config: {}", target.display()))?;

    println!("Wrote default fwgate config to {}", target.display());
    Ok(())
}

/// Print the effective configuration (file values, defaults, and env overrides).
pub fn show_config_command(config_path: Option<&str>, json: bool) -> Result<()> {
    let config = load_verify_config(config_path)?;
    if json {
        return print_json(&config);
    }

    let b = &config.budget;
    let c = &config.coverage;
    let t = &config.tools;
    println!("fwgate configuration");
    println!("====================");
    println!("Source: {}", config_path.unwrap_or("(built-in defaults)"));
    println!();
    println!("Budget:");
    println!("- Flash capacity: {} bytes (warn above {}%)", b.flash_capacity, b.flash_warn_percent);
    println!("- RAM capacity: {} bytes (warn above {}%)", b.ram_capacity, b.ram_warn_percent);
    println!("- Map extension: .{}", config.map_extension);
    println!();
    println!("Coverage:");
    println!(
        "- Thresholds: {}% line, {}% branch",
        c.thresholds.min_line_percent, c.thresholds.min_branch_percent
    );
    println!("- Jobs: {}", c.jobs);
    println!("- Exclude: {}", c.exclude.join(", "));
    println!("- Source root: {}", c.source_root.display());
    println!("- Report dir: {}", c.report_dir);
    println!("- Policy: {}", if c.enforce { "enforcing" } else { "advisory" });
    println!();
    println!("Tools:");
    println!("- nm: {}", t.nm.join(" "));
    println!("- gcovr: {}", t.gcovr.join(" "));
    match t.timeout_secs {
        Some(secs) => println!("- Timeout: {secs}s"),
        None => println!("- Timeout: none"),
    }
    println!("- Top symbols: {}", t.top_symbols);
    Ok(())
}
