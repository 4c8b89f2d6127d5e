use directories::BaseDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct UploaderConfig {
    pub server_url: String,
    pub upload_path: String,
    pub process_path: String,
    pub allowed_extensions: Vec<String>,
    pub progress_tick_ms: u64,
    pub auto_upload: bool,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".to_string(),
            upload_path: "/upload_temp_file/".to_string(),
            process_path: "/process_file/".to_string(),
            allowed_extensions: vec!["csv".to_string()],
            progress_tick_ms: 50,
            auto_upload: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not resolve home directory for config path")]
    HomeDirectoryUnavailable,
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {message}")]
    Validation { message: String },
}

impl UploaderConfig {
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.server_url).map_err(|e| ConfigError::Validation {
            message: format!("server_url '{}' is not a valid url: {}", self.server_url, e),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                message: format!("server_url must use http or https, got '{}'", url.scheme()),
            });
        }
        // Endpoint paths are absolute, so they replace any path on the base.
        if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
            return Err(ConfigError::Validation {
                message: format!(
                    "server_url must be scheme, host and port only, got '{}'",
                    self.server_url
                ),
            });
        }
        Ok(url)
    }

    pub fn upload_url(&self) -> Result<Url, ConfigError> {
        self.endpoint(&self.upload_path)
    }

    pub fn process_url(&self) -> Result<Url, ConfigError> {
        self.endpoint(&self.process_path)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        self.base_url()?
            .join(path)
            .map_err(|e| ConfigError::Validation {
                message: format!("endpoint path '{}' is not valid: {}", path, e),
            })
    }

    /// Lowercased allow-list, the form the validator compares against.
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.allowed_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .collect()
    }
}

pub fn resolve_config_path() -> Result<PathBuf, ConfigError> {
    let base_dirs = BaseDirs::new().ok_or(ConfigError::HomeDirectoryUnavailable)?;
    Ok(base_dirs
        .home_dir()
        .join(".config")
        .join("sheet-uploader")
        .join("config.toml"))
}

pub fn load_config(path: &Path) -> Result<UploaderConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed: UploaderConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_config(&parsed)?;
    Ok(parsed)
}

/// Loads the per-user config when it exists, falling back to defaults otherwise.
pub fn load_default_config() -> Result<UploaderConfig, ConfigError> {
    let path = resolve_config_path()?;
    if !path.exists() {
        return Ok(UploaderConfig::default());
    }
    load_config(&path)
}

pub fn validate_config(config: &UploaderConfig) -> Result<(), ConfigError> {
    config.base_url()?;

    for (key, path) in [
        ("upload_path", &config.upload_path),
        ("process_path", &config.process_path),
    ] {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation {
                message: format!("{key} must start with '/', got '{path}'"),
            });
        }
    }

    let extensions = config.normalized_extensions();
    if extensions.is_empty() || extensions.iter().any(|ext| ext.is_empty()) {
        return Err(ConfigError::Validation {
            message: "allowed_extensions must list at least one non-empty extension".to_string(),
        });
    }

    if config.progress_tick_ms == 0 {
        return Err(ConfigError::Validation {
            message: "progress_tick_ms must be greater than zero".to_string(),
        });
    }

    Ok(())
}
