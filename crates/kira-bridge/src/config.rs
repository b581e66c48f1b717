use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use std::{fs, io};

/// Environment variable pointing at a TOML file with a [`BridgeConfig`].
pub const CONFIG_ENV_VAR: &str = "KIRA_BRIDGE_CONFIG";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Substring of the model path that selects the wellness variant.
    pub wellness_marker: String,
    /// Text produced by the placeholder policy.
    pub placeholder_response: String,
    /// Returned by `last_response` when a model is loaded but nothing was generated yet.
    pub greeting_response: String,
    /// Returned by `last_response` when no model is loaded.
    pub not_loaded_response: String,
    /// Reject model paths that do not point to an existing file with a known extension.
    pub validate_model_path: bool,
    pub model_extensions: Vec<String>,
    pub inference_timeout_ms: u64,
    pub max_prompt_bytes: Option<usize>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            wellness_marker: String::from("gemma-wellness"),
            placeholder_response: String::from("Response from Llama model (placeholder)"),
            greeting_response: String::from("Hello! I'm Kira, your wellness assistant."),
            not_loaded_response: String::from("Model not loaded"),
            validate_model_path: false,
            model_extensions: vec![String::from("gguf"), String::from("bin")],
            inference_timeout_ms: 30_000,
            max_prompt_bytes: None,
        }
    }
}

impl BridgeConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Loads the file named by [`CONFIG_ENV_VAR`], or the defaults when it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                log::debug!("Loading bridge config from {}", Path::new(&path).display());
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = BridgeConfig::from_toml_str(
            r#"
            validate_model_path = true
            inference_timeout_ms = 250
            "#,
        )
        .unwrap();

        assert!(config.validate_model_path);
        assert_eq!(config.inference_timeout(), Duration::from_millis(250));
        assert_eq!(config.wellness_marker, "gemma-wellness");
        assert_eq!(config.max_prompt_bytes, None);
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = BridgeConfig::from_toml_str("inference_timeout_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join(format!("kira-missing-{}.toml", uuid::Uuid::new_v4()));
        assert!(matches!(
            BridgeConfig::from_file(path),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let path = std::env::temp_dir().join(format!("kira-config-{}.toml", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            "wellness_marker = \"kira-care\"\nmax_prompt_bytes = 64\n",
        )
        .unwrap();

        let config = BridgeConfig::from_file(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.wellness_marker, "kira-care");
        assert_eq!(config.max_prompt_bytes, Some(64));
    }
}
