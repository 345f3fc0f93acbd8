//! Configuration view and validation commands: `taskboard config`.

use anyhow::Result;

use super::super::ConfigCommands;
use taskboard::config::{CONFIG_FILE, TaskboardToml, get_config_dir};

fn print_effective(config: &TaskboardToml) {
    println!("[server]");
    println!("  port = {}", config.server.port);
    println!("  dev = {}", config.server.dev);
    println!();
    println!("[store]");
    println!("  backend = \"{}\"", config.store.backend);
    if let Some(path) = &config.store.sqlite_path {
        println!("  sqlite_path = \"{}\"", path.display());
    }
    if let Some(url) = &config.store.http_base_url {
        println!("  http_base_url = \"{}\"", url);
    }
    if config.store.http_api_key.is_some() {
        println!("  http_api_key = \"********\"");
    }
    println!();
    println!("[identity]");
    println!("  id = \"{}\"", config.identity.id);
    println!("  email = \"{}\"", config.identity.email);
    if let Some(name) = &config.identity.display_name {
        println!("  display_name = \"{}\"", name);
    }
    println!();
    println!("[logging]");
    println!("  filter = \"{}\"", config.logging.filter);
    println!("  json = {}", config.logging.json);
    println!();
}

pub fn cmd_config(
    project_dir: &std::path::Path,
    config: &TaskboardToml,
    command: Option<ConfigCommands>,
) -> Result<()> {
    let config_dir = get_config_dir(project_dir);
    let config_path = config_dir.join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Taskboard Configuration");
            println!("=======================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No taskboard.toml found at {}", config_path.display());
                println!("Run 'taskboard config init' to create one.");
            }
            println!();
            println!("Effective values (with env overrides):");
            println!();
            print_effective(config);
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init { force }) => {
            if config_path.exists() && !force {
                println!("taskboard.toml already exists at {}", config_path.display());
                println!("Pass --force to overwrite it.");
                return Ok(());
            }

            std::fs::create_dir_all(&config_dir)?;
            TaskboardToml::default().save(&config_path)?;

            println!("Created taskboard.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [server] port, dev");
            println!("  - [store] backend (memory, sqlite, http, offline)");
            println!("  - [identity] id, email, display_name");
            println!();
        }
    }

    Ok(())
}
