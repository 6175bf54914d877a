use std::path::PathBuf;

use clap::Subcommand;
use focusledger_core::storage::data_dir;
use focusledger_core::Config;
use serde::Serialize;

use super::print_json;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "insights.default_range", "logging.filter")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Show where the config and focus database live
    Path,
}

#[derive(Serialize)]
struct Paths {
    data_dir: PathBuf,
    config_file: PathBuf,
    database: PathBuf,
    database_exists: bool,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => {
            let config = Config::load()?;
            let data_dir = data_dir()?;
            let database = config.database_path()?;
            print_json(&Paths {
                config_file: data_dir.join("config.toml"),
                data_dir,
                database_exists: database.exists(),
                database,
            })?;
        }
    }
    Ok(())
}
