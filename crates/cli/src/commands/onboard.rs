//! `taskmate onboard` — First-time setup.

use taskmate_config::AppConfig;

use super::CommandResult;

pub fn run() -> CommandResult {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("taskmate — First-Time Setup");
    println!("===========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("  Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n  Config already exists at: {}", config_path.display());
        println!("  Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("  Created config.toml at: {}", config_path.display());
    }

    // The data directory may be configured elsewhere.
    let config = super::load_config()?;
    let data_dir = &config.storage.data_dir;
    if !data_dir.exists() {
        std::fs::create_dir_all(data_dir)?;
        println!("  Created data directory: {}", data_dir.display());
    }

    println!("\nNext steps:");
    println!("  1. Set TASKMATE_API_KEY (or api_key in config.toml)");
    println!("  2. Adjust [assistant.vocabulary] to your working language");
    println!("  3. Run `taskmate chat`\n");

    Ok(())
}
