//! Server configuration read from the environment.
//!
//! | variable               | default                   |
//! |------------------------|---------------------------|
//! | `TAXFORM_HOST`         | `127.0.0.1`               |
//! | `TAXFORM_PORT`         | `8080`                    |
//! | `TAXFORM_MAPPING_DIR`  | `resources/form_mappings` |
//! | `TAXFORM_TEMPLATE_DIR` | `resources/templates`     |
//! | `TAXFORM_FONT_DIR`     | `fonts`                   |
//! | `TAXFORM_OUTPUT_DIR`   | `output`                  |

use std::path::PathBuf;
use thiserror::Error;

pub const HOST_VAR: &str = "TAXFORM_HOST";
pub const PORT_VAR: &str = "TAXFORM_PORT";
pub const MAPPING_DIR_VAR: &str = "TAXFORM_MAPPING_DIR";
pub const TEMPLATE_DIR_VAR: &str = "TAXFORM_TEMPLATE_DIR";
pub const FONT_DIR_VAR: &str = "TAXFORM_FONT_DIR";
pub const OUTPUT_DIR_VAR: &str = "TAXFORM_OUTPUT_DIR";

#[derive(Debug, Error)]
pub enum ConfigEnvError {
    #[error("{var} must be a port number, got '{value}'")]
    InvalidPort { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mapping_dir: PathBuf,
    pub template_dir: PathBuf,
    pub font_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            mapping_dir: PathBuf::from("resources/form_mappings"),
            template_dir: PathBuf::from("resources/templates"),
            font_dir: PathBuf::from("fonts"),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigEnvError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from any variable source; unset or empty variables keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigEnvError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = AppConfig::default();

        if let Some(host) = get(HOST_VAR) {
            config.host = host;
        }
        if let Some(port) = get(PORT_VAR) {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigEnvError::InvalidPort {
                    var: PORT_VAR,
                    value: port.clone(),
                })?;
        }
        for (var, dir) in [
            (MAPPING_DIR_VAR, &mut config.mapping_dir),
            (TEMPLATE_DIR_VAR, &mut config.template_dir),
            (FONT_DIR_VAR, &mut config.font_dir),
            (OUTPUT_DIR_VAR, &mut config.output_dir),
        ] {
            if let Some(value) = get(var) {
                *dir = PathBuf::from(value);
            }
        }
        Ok(config)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
