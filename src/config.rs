use std::{fs, path::Path};

use serde::Deserialize;

use crate::{PageflowError, Result};

fn default_worker_threads() -> u16 {
    4
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_animate_safety_margin_ms() -> u64 {
    50
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// number of async worker threads, range [1, 32768), defaults to 4
    #[serde(default = "default_worker_threads")]
    pub async_worker_thread_number: u16,
    /// timeout for outbound API calls in milliseconds
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    /// extra wait added after an animation's nominal duration before the
    /// branch resumes, in milliseconds
    #[serde(default = "default_animate_safety_margin_ms")]
    pub animate_safety_margin_ms: u64,
    /// endpoint that receives collected lead variables, if any
    #[serde(default)]
    pub lead_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            async_worker_thread_number: default_worker_threads(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            animate_safety_margin_ms: default_animate_safety_margin_ms(),
            lead_endpoint: None,
        }
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())?;
        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        toml::from_str::<Config>(toml_str).map_err(|e| PageflowError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod test {
    use crate::Config;

    #[test]
    fn test_config_deserialize() {
        let toml_str = r#"
        async_worker_thread_number = 10
        fetch_timeout_ms = 3000
        lead_endpoint = "https://example.com/leads"
        "#;
        let config = Config::load_from_str(toml_str).unwrap();
        assert_eq!(config.async_worker_thread_number, 10);
        assert_eq!(config.fetch_timeout_ms, 3000);
        assert_eq!(config.lead_endpoint.as_deref(), Some("https://example.com/leads"));
        // missing keys fall back to defaults
        assert_eq!(config.animate_safety_margin_ms, 50);
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::load_from_str("").unwrap();
        assert_eq!(config.async_worker_thread_number, 4);
        assert!(config.lead_endpoint.is_none());
    }
}
