use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2".to_string()
}

fn default_window_width() -> u32 {
    1200
}

fn default_window_height() -> u32 {
    800
}

fn default_min_width() -> u32 {
    720
}

fn default_min_height() -> u32 {
    480
}

fn default_readiness_poll_ms() -> u64 {
    300
}

fn default_page_transition_ms() -> u64 {
    1000
}

fn default_connect_retry_ms() -> u64 {
    2000
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_host")]
    pub host: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: u32,
    #[serde(default = "default_window_height")]
    pub height: u32,
    #[serde(default = "default_min_width")]
    pub min_width: u32,
    #[serde(default = "default_min_height")]
    pub min_height: u32,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TimingConfig {
    /// How often an open tool checks whether the AI service is reachable yet.
    #[serde(default = "default_readiness_poll_ms")]
    pub readiness_poll_ms: u64,
    /// Length of the loading screen shown on every view change.
    #[serde(default = "default_page_transition_ms")]
    pub page_transition_ms: u64,
    /// Delay between attempts to reach the AI service at startup.
    #[serde(default = "default_connect_retry_ms")]
    pub connect_retry_ms: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        OllamaConfig {
            host: default_ollama_host(),
            model: default_ollama_model(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            width: default_window_width(),
            height: default_window_height(),
            min_width: default_min_width(),
            min_height: default_min_height(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            readiness_poll_ms: default_readiness_poll_ms(),
            page_transition_ms: default_page_transition_ms(),
            connect_retry_ms: default_connect_retry_ms(),
        }
    }
}

impl TimingConfig {
    pub fn readiness_poll(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_ms.max(1))
    }

    pub fn page_transition(&self) -> Duration {
        Duration::from_millis(self.page_transition_ms)
    }

    pub fn connect_retry(&self) -> Duration {
        Duration::from_millis(self.connect_retry_ms.max(1))
    }
}

impl Config {
    pub fn load() -> Self {
        let config_path = Self::get_config_path();

        if config_path.exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match Self::parse(&contents) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!(
                        path = %config_path.display(),
                        error = %e,
                        "error parsing config.toml, using defaults"
                    ),
                },
                Err(e) => tracing::warn!(
                    path = %config_path.display(),
                    error = %e,
                    "error reading config.toml, using defaults"
                ),
            }
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
        }

        Config::default()
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn get_config_path() -> PathBuf {
        Self::get_config_dir().join("config.toml")
    }

    pub fn get_config_dir() -> PathBuf {
        if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home).join(".config/code-assist")
        } else {
            PathBuf::from(".")
        }
    }
}
