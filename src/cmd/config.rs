//! Configuration view and validation commands: `stackctl config`.

use anyhow::Result;
use stackctl::config::{CONFIG_FILE, StackConfig, StackToml};

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = project_dir.join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("stackctl Configuration");
            println!("======================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No {} found. Using default configuration.", CONFIG_FILE);
            }
            println!();

            let config = StackConfig::load(project_dir)?;
            println!("Effective values (file, then env, then CLI):");
            println!();
            println!("[compose]");
            println!("  command = \"{}\"", config.compose.command_line());
            println!();
            println!("[services]");
            println!("  backend = \"{}\"", config.services.backend);
            println!("  frontend = \"{}\"", config.services.frontend);
            println!("  db = \"{}\"", config.services.db);
            println!();
            println!("[workdirs]");
            println!("  backend = \"{}\"", config.workdirs.backend);
            println!("  frontend = \"{}\"", config.workdirs.frontend);
            println!();
            let b = &config.bootstrap;
            println!("[bootstrap]");
            println!("  retries = {}", b.retries);
            println!("  sleep_secs = {}", b.sleep_secs);
            println!("  env_file = \"{}\"", b.env_file.display());
            println!("  env_template = \"{}\"", b.env_template.display());
            println!("  db_user = \"{}\"", b.db_user);
            println!("  owner = \"{}\"", b.owner);
            println!("  workspace_dir = \"{}\"", b.workspace_dir);
            println!("  command_timeout_secs = {}", b.command_timeout_secs);
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let (toml, config_file) = StackToml::effective(project_dir, |key| std::env::var(key).ok())?;
            match config_file {
                Some(path) => println!("Config file: {}", path.display()),
                None => println!("No {} found. Checking defaults.", CONFIG_FILE),
            }
            let warnings = toml.validate();

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
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("{} already exists at {}", CONFIG_FILE, config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            StackToml::default().save(&config_path)?;

            println!("Created {} at {}", CONFIG_FILE, config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [compose] command");
            println!("  - [services] backend, frontend, db");
            println!("  - [bootstrap] retries, sleep_secs, env_file, owner");
            println!();
        }
    }

    Ok(())
}
