//! This module contains various utility modules and helper functions.

pub mod log;
pub mod symbol_utils;

use crate::prelude::*;

/// The standard configuration bundled with the cert_checker.
const DEFAULT_CONFIG: &str = include_str!("../../../config.json");

/// Get the contents of a configuration file
/// located in the configuration directory of the cert_checker.
pub fn read_config_file(filename: &str) -> Result<serde_json::Value, Error> {
    let project_dirs = directories::ProjectDirs::from("", "", "cert_checker")
        .context("Could not discern location of configuration files.")?;
    let config_dir = project_dirs.config_dir();
    let config_path = config_dir.join(filename);
    let config_file =
        std::fs::read_to_string(config_path).context("Could not read configuration file")?;
    Ok(serde_json::from_str(&config_file)?)
}

/// Get the standard configuration bundled with the cert_checker.
pub fn get_default_config() -> Result<serde_json::Value, Error> {
    serde_json::from_str(DEFAULT_CONFIG).context("Parsing of the bundled configuration failed")
}
