
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, get_config_dir};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 Vecadmin Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Search Engine Connection").bold().yellow());
    eprintln!("Configure the search engine's JSON HTTP endpoint.");
    eprintln!();

    let (protocol, host, port) = configure_endpoint(
        "Engine",
        &config.engine.protocol,
        &config.engine.host,
        config.engine.port,
    )?;
    config.engine.protocol = protocol;
    config.engine.host = host;
    config.engine.port = port;

    eprintln!();
    eprintln!("{}", style("Embedding Service Connection").bold().yellow());
    eprintln!("Configure the service used to generate vectors during import.");
    eprintln!();

    let (protocol, host, port) = configure_endpoint(
        "Embedding service",
        &config.embedding.protocol,
        &config.embedding.host,
        config.embedding.port,
    )?;
    config.embedding.protocol = protocol;
    config.embedding.host = host;
    config.embedding.port = port;

    eprintln!();
    eprintln!("{}", style("Import Settings").bold().yellow());

    config.import.batch_size = Input::new()
        .with_prompt("Rows per import batch")
        .default(config.import.batch_size)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if *input == 0 {
                Err("Batch size must be greater than 0")
            } else if *input > 1000 {
                Err("Batch size must be 1000 or less")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    config.import.max_file_size_mib = Input::new()
        .with_prompt("Maximum upload size (MiB)")
        .default(config.import.max_file_size_mib)
        .validate_with(|input: &u64| -> Result<(), &str> {
            if *input == 0 || *input > 1024 {
                Err("Size must be between 1 and 1024 MiB")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    config.validate().context("Configuration is invalid")?;

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());

        let config_dir = get_config_dir().context("Failed to resolve config directory")?;
        eprintln!(
            "Configuration saved to: {}",
            style(config_dir.join("config.toml").display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Search Engine:").bold().yellow());
    match config.engine_url() {
        Ok(url) => eprintln!("  URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  URL: {} ({})", style("Invalid").red(), e),
    }

    eprintln!("{}", style("Embedding Service:").bold().yellow());
    match config.embedding_url() {
        Ok(url) => eprintln!("  URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  URL: {} ({})", style("Invalid").red(), e),
    }

    eprintln!("{}", style("Import:").bold().yellow());
    eprintln!("  Batch Size: {}", style(config.import.batch_size).cyan());
    eprintln!(
        "  Preview Rows: {}",
        style(config.import.preview_rows).cyan()
    );
    eprintln!(
        "  Max Upload Size: {} MiB",
        style(config.import.max_file_size_mib).cyan()
    );

    let config_dir = get_config_dir().context("Failed to resolve config directory")?;
    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config_dir.join("config.toml").display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    Config::load().map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config::default())
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_endpoint(
    label: &str,
    current_protocol: &str,
    current_host: &str,
    current_port: u16,
) -> Result<(String, String, u16)> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == current_protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt(format!("{} protocol", label))
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt(format!("{} host", label))
        .default(current_host.to_string())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Host cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt(format!("{} port", label))
        .default(current_port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    Ok((protocol, host, port))
}
