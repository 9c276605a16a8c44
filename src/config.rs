//! Runtime configuration for the collaborator services.
//!
//! Credentials and endpoints can come from a YAML config file (passed with
//! `--config`) or from the environment; any field missing from the file
//! falls back to its environment variable. The sanitization pipeline itself
//! is configuration-free.

use std::env;
use std::error::Error;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, instrument};

fn env_or(key: &str, fallback: &str) -> String {
    env::var(key).unwrap_or_else(|_| fallback.to_string())
}

fn default_wp_url() -> String {
    env_or("WP_URL", "https://your-domain.com")
}

fn default_wp_username() -> String {
    env_or("WP_USERNAME", "admin")
}

fn default_wp_app_password() -> String {
    env_or("WP_APP_PASSWORD", "")
}

fn default_gemini_api_key() -> String {
    env_or("GEMINI_API_KEY", "")
}

fn default_text_model() -> String {
    env_or("TEXT_MODEL", "gemini-2.5-flash-preview-09-2025")
}

fn default_naver_client_id() -> String {
    env_or("NAVER_CLIENT_ID", "")
}

fn default_naver_client_secret() -> String {
    env_or("NAVER_CLIENT_SECRET", "")
}

/// Collaborator endpoints and credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// WordPress site root, without the `/wp-json` suffix.
    #[serde(default = "default_wp_url")]
    pub wp_url: String,
    #[serde(default = "default_wp_username")]
    pub wp_username: String,
    /// WordPress application password used for Basic auth.
    #[serde(default = "default_wp_app_password")]
    pub wp_app_password: String,
    #[serde(default = "default_gemini_api_key")]
    pub gemini_api_key: String,
    /// Generation model identifier.
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_naver_client_id")]
    pub naver_client_id: String,
    #[serde(default = "default_naver_client_secret")]
    pub naver_client_secret: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wp_url: default_wp_url(),
            wp_username: default_wp_username(),
            wp_app_password: default_wp_app_password(),
            gemini_api_key: default_gemini_api_key(),
            text_model: default_text_model(),
            naver_client_id: default_naver_client_id(),
            naver_client_secret: default_naver_client_secret(),
        }
    }
}

/// Load configuration from an optional YAML file, with environment
/// variables filling every gap.
#[instrument(level = "info", skip_all)]
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn Error>> {
    let config = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&raw)?;
            info!(path = %path.display(), "Loaded configuration file");
            config
        }
        None => {
            info!("No config file given; using environment");
            Config::default()
        }
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_overrides_defaults() {
        let yaml = r#"
wp_url: "https://pension-blog.example"
wp_username: "editor"
text_model: "gemini-test"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.wp_url, "https://pension-blog.example");
        assert_eq!(config.wp_username, "editor");
        assert_eq!(config.text_model, "gemini-test");
    }

    #[test]
    fn test_missing_yaml_fields_fall_back() {
        let config: Config = serde_yaml::from_str("wp_username: \"editor\"").unwrap();
        assert_eq!(config.wp_username, "editor");
        // Field absent from the YAML takes the env/default value.
        assert!(!config.text_model.is_empty());
    }

    #[test]
    fn test_load_config_without_path_uses_environment() {
        let config = load_config(None).unwrap();
        assert!(!config.wp_url.is_empty());
    }
}
