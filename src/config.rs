//! Application configuration
//!
//! Settings come from an optional TOML file under the user config
//! directory, overridden by `COURSEFORGE_*` environment variables. A
//! missing or malformed file degrades to defaults; configuration loading
//! never blocks startup.

use std::path::PathBuf;

use serde::Deserialize;

/// Default CORS-bypass proxy used to fetch remote images as raw bytes.
pub const DEFAULT_PROXY_BASE: &str = "https://api.allorigins.win/raw";

const CONFIG_DIR: &str = "courseforge";
const CONFIG_FILE: &str = "config.toml";
const STATE_FILE: &str = "state.json";

/// Resolved configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Generation endpoint. `None` (or empty) means "not configured" and
    /// the loader goes straight to its fallback chain.
    pub endpoint: Option<String>,
    /// Base URL of the image proxy; the target URL is appended as a
    /// `url` query parameter.
    pub proxy_base: String,
    /// Path of the state envelope file.
    pub state_path: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    endpoint: Option<String>,
    proxy_base: Option<String>,
    state_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            proxy_base: DEFAULT_PROXY_BASE.to_string(),
            state_path: default_state_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults ← config file ← environment.
    pub fn load() -> Self {
        let mut config = AppConfig::default();

        if let Some(path) = config_file_path() {
            match std::fs::read_to_string(&path) {
                Ok(raw) => match toml::from_str::<ConfigFile>(&raw) {
                    Ok(file) => {
                        config.endpoint = file.endpoint.or(config.endpoint);
                        config.proxy_base = file.proxy_base.unwrap_or(config.proxy_base);
                        config.state_path = file.state_path.unwrap_or(config.state_path);
                    }
                    Err(e) => {
                        log::warn!("ignoring malformed {}: {}", path.display(), e);
                    }
                },
                Err(_) => {} // no config file, defaults stand
            }
        }

        if let Ok(endpoint) = std::env::var("COURSEFORGE_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }
        if let Ok(proxy) = std::env::var("COURSEFORGE_PROXY") {
            config.proxy_base = proxy;
        }
        if let Ok(state) = std::env::var("COURSEFORGE_STATE") {
            config.state_path = PathBuf::from(state);
        }

        // An empty endpoint string means "not configured".
        if config.endpoint.as_deref() == Some("") {
            config.endpoint = None;
        }

        config
    }
}

fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

fn default_state_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(CONFIG_DIR).join(STATE_FILE))
        .unwrap_or_else(|| PathBuf::from(format!("{}-{}", CONFIG_DIR, STATE_FILE)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.endpoint.is_none());
        assert_eq!(config.proxy_base, DEFAULT_PROXY_BASE);
        assert!(config.state_path.ends_with("state.json"));
    }

    #[test]
    fn test_config_file_shape() {
        let raw = r#"
            endpoint = "https://example.com/generate"
            proxy_base = "https://proxy.example.com/raw"
        "#;
        let file: ConfigFile = toml::from_str(raw).unwrap();
        assert_eq!(file.endpoint.as_deref(), Some("https://example.com/generate"));
        assert_eq!(file.proxy_base.as_deref(), Some("https://proxy.example.com/raw"));
        assert!(file.state_path.is_none());
    }
}
