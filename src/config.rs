use crate::cons::QUOTE_SYMBOL;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const FUNCALL_SYMBOL: &str = "CL:FUNCALL";

/// Settings shared by a session, its handles and its expression builder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    pub quote_symbol: String,
    pub funcall_symbol: String,
    /// Whether dropped handles ask the remote side to free their value.
    pub release_handles: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            quote_symbol: QUOTE_SYMBOL.to_string(),
            funcall_symbol: FUNCALL_SYMBOL.to_string(),
            release_handles: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {error}", .path.display())]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error("Invalid bridge config: {message}")]
    Parse {
        path: Option<PathBuf>,
        message: String,
    },
}

impl BridgeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        Self::parse(&content).map_err(|message| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            message,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content).map_err(|message| ConfigError::Parse {
            path: None,
            message,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        let config: BridgeConfig = toml::from_str(content).map_err(|err| err.to_string())?;
        if config.quote_symbol.trim().is_empty() {
            return Err("`quote_symbol` must not be empty".into());
        }
        if config.funcall_symbol.trim().is_empty() {
            return Err("`funcall_symbol` must not be empty".into());
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = BridgeConfig::from_toml_str("").expect("config");
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.funcall_symbol, "CL:FUNCALL");
        assert!(config.release_handles);
    }

    #[test]
    fn fields_override_defaults() {
        let config = BridgeConfig::from_toml_str(
            "funcall_symbol = \"FUNCALL\"\nrelease_handles = false\n",
        )
        .expect("config");
        assert_eq!(config.funcall_symbol, "FUNCALL");
        assert_eq!(config.quote_symbol, "CL:QUOTE");
        assert!(!config.release_handles);
    }

    #[test]
    fn rejects_unknown_keys_and_blank_symbols() {
        assert!(matches!(
            BridgeConfig::from_toml_str("transport = \"sbcl\""),
            Err(ConfigError::Parse { path: None, .. })
        ));
        assert!(BridgeConfig::from_toml_str("quote_symbol = \"  \"").is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = BridgeConfig::load(Path::new("/nonexistent/bridge.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
