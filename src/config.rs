// src/config.rs
use crate::error::ConfigError;
use directories::ProjectDirs;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use toml;

const CONFIG_FILE_NAME: &str = "garage_ledger_config.toml";

/// File names of each record kind, relative to `Config::data_dir`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DataFiles {
    pub customers: String,
    pub vehicles: String,
    pub services: String,
    pub discounts: String,
    pub history: String,
}

impl Default for DataFiles {
    fn default() -> Self {
        DataFiles {
            customers: "customers.txt".to_string(),
            vehicles: "vehicles.txt".to_string(),
            services: "services.txt".to_string(),
            discounts: "discounts.txt".to_string(),
            history: "service_history.txt".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub seed_defaults: bool, // write the default services/discounts at startup
    pub files: DataFiles,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: default_data_dir(),
            seed_defaults: true,
            files: DataFiles::default(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "GarageLedger", "GarageLedger")
}

fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn get_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

pub fn save_config(config_path: &Path, config: &Config) -> Result<(), ConfigError> {
    info!("Attempting to save config to {:?}", config_path);
    if let Some(parent_dir) = config_path.parent() {
        if !parent_dir.exists() {
            fs::create_dir_all(parent_dir)?;
            info!("Created config directory: {:?}", parent_dir);
        }
    }

    let toml_string = toml::to_string_pretty(config)?;
    let mut file = fs::File::create(config_path)?;
    file.write_all(toml_string.as_bytes())?;

    info!("Saved configuration to {:?}", config_path);
    Ok(())
}

/// Reads the config at `config_path`.
///
/// A missing file is created with defaults. A file that cannot be read or
/// parsed is left alone and defaults are used.
pub fn load_config_from(config_path: &Path) -> Config {
    if !config_path.exists() {
        info!(
            "Config file not found at {:?}. Creating and using default configuration.",
            config_path
        );
        let default_config = Config::default();
        if let Err(e) = save_config(config_path, &default_config) {
            warn!("Failed to save default configuration: {}", e);
        }
        return default_config;
    }

    info!("Loading configuration from {:?}", config_path);
    match fs::read_to_string(config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(loaded_config) => {
                info!("Configuration loaded successfully.");
                loaded_config
            }
            Err(e) => {
                warn!(
                    "Failed to parse config file at {:?}: {}. Using default configuration.",
                    config_path, e
                );
                Config::default()
            }
        },
        Err(e) => {
            warn!(
                "Failed to read config file at {:?}: {}. Using default configuration.",
                config_path, e
            );
            Config::default()
        }
    }
}

pub fn load_config() -> Config {
    match get_config_path() {
        Some(config_path) => load_config_from(&config_path),
        None => {
            warn!("Could not determine config directory. Using default configuration.");
            Config::default()
        }
    }
}
