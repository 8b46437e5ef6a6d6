use anyhow::Result;
use gunsmith_manifest::{config, Config};

fn masked(key: Option<&str>) -> String {
    match key.filter(|k| !k.trim().is_empty()) {
        Some(key) if key.chars().count() > 4 => format!("{}…", key.chars().take(4).collect::<String>()),
        Some(_) => "<set>".to_string(),
        None => "<not set>".to_string(),
    }
}

/// Show the current effective configuration.
pub fn show_config(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    println!("  discord_key: {}", masked(config.discord_key.as_deref()));
    println!("  bungie_key: {}", masked(config.bungie_key.as_deref()));
    println!("  manifest_dir: {}", config.manifest_dir.display());
    println!("  language: {}", config.language);
    println!("  command_prefix: {}", config.command_prefix);
    println!("  update_interval_hours: {}", config.update_interval_hours);
    println!("  logging.level: {}", config.logging.level);
    println!("  logging.coloured: {}", config.logging.coloured);
    println!("  logging.report_caller: {}", config.logging.report_caller);

    println!(
        "\nPriority: CLI args > DISCORD_KEY/BUNGIE_KEY > ENV vars (GUNSMITH_*) > Config file > Defaults"
    );

    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    println!("{}", config::config_file_path().display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to set your Discord and Bungie keys.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
