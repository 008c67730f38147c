//! `taskmate doctor` — Diagnose configuration health.

use taskmate_config::AppConfig;

use super::CommandResult;

pub async fn run() -> CommandResult {
    println!("taskmate doctor — System Diagnostics");
    println!("====================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  [ok]   Config file found: {}", config_path.display());
    } else {
        println!("  [warn] No config file, using defaults. Run `taskmate onboard`");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  [ok]   Config valid");
            config
        }
        Err(e) => {
            println!("  [fail] Config invalid: {e}");
            println!("\n  1 blocking issue found.");
            return Ok(());
        }
    };

    let provider = match taskmate_providers::resolve(&config) {
        Ok(provider) => {
            println!("  [ok]   Provider '{}' with model '{}'", provider.name(), config.model());
            Some(provider)
        }
        Err(e) => {
            println!("  [fail] {e}");
            issues += 1;
            None
        }
    };

    if let Some(provider) = provider {
        match provider.health_check().await {
            Ok(true) => println!("  [ok]   Provider reachable"),
            Ok(false) => {
                println!("  [warn] Provider answered but reported unhealthy");
                issues += 1;
            }
            Err(e) => {
                println!("  [warn] Provider unreachable: {e}");
                issues += 1;
            }
        }
    }

    let data_dir = &config.storage.data_dir;
    if data_dir.is_dir() {
        let probe = data_dir.join(".taskmate-doctor");
        match std::fs::write(&probe, b"ok").and_then(|_| std::fs::remove_file(&probe)) {
            Ok(()) => println!("  [ok]   Data directory writable: {}", data_dir.display()),
            Err(e) => {
                println!("  [fail] Data directory not writable: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  [warn] No data directory yet: {} (created on first chat)", data_dir.display());
        issues += 1;
    }

    if config.gateway.allowed_senders.is_empty() {
        println!("  [warn] gateway.allowed_senders is empty; every webhook sender is refused");
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
