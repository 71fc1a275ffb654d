use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

use promptforge_contracts::DEFAULT_MAX_PROMPT_CHARS;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub max_prompt_chars: usize,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    gemini: GeminiSection,
    #[serde(default)]
    limits: LimitsSection,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct GeminiSection {
    #[serde(default)]
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LimitsSection {
    #[serde(default = "default_max_prompt_chars")]
    max_prompt_chars: usize,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_prompt_chars: default_max_prompt_chars(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_prompt_chars() -> usize {
    DEFAULT_MAX_PROMPT_CHARS
}

fn api_key_from_env() -> Option<String> {
    env::var("GEMINI_API_KEY")
        .ok()
        .filter(|value| !value.trim().is_empty())
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        if let Some(file_config) = load_from_file()? {
            return Ok(Self {
                host: file_config.server.host,
                port: file_config.server.port,
                // The key may live in the file or the environment.
                gemini_api_key: file_config.gemini.api_key.or_else(api_key_from_env),
                max_prompt_chars: file_config.limits.max_prompt_chars,
            });
        }

        Ok(Self::from_env())
    }

    fn from_env() -> Self {
        let host = env::var("PROMPTFORGE_HOST").unwrap_or_else(|_| default_host());
        let port = env::var("PROMPTFORGE_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or_else(default_port);
        let max_prompt_chars = env::var("PROMPTFORGE_MAX_PROMPT_CHARS")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or_else(default_max_prompt_chars);

        Self {
            host,
            port,
            gemini_api_key: api_key_from_env(),
            max_prompt_chars,
        }
    }
}

fn load_from_file() -> anyhow::Result<Option<FileConfig>> {
    let config_path = env::var("PROMPTFORGE_CONFIG").ok();
    let path = if let Some(path) = config_path {
        Some(path)
    } else if Path::new("promptforge.toml").exists() {
        Some("promptforge.toml".to_string())
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .map_err(|err| anyhow::anyhow!("Failed to read config {}: {}", path, err))?;
    let parsed: FileConfig = toml::from_str(&contents)
        .map_err(|err| anyhow::anyhow!("Failed to parse config {}: {}", path, err))?;
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_fills_defaults() {
        let parsed: FileConfig = toml::from_str("[server]\nport = 9090\n").expect("parse");
        assert_eq!(parsed.server.port, 9090);
        assert_eq!(parsed.server.host, default_host());
        assert_eq!(parsed.limits.max_prompt_chars, DEFAULT_MAX_PROMPT_CHARS);
        assert!(parsed.gemini.api_key.is_none());
    }

    #[test]
    fn file_config_reads_api_key() {
        let parsed: FileConfig =
            toml::from_str("[gemini]\napi_key = \"k\"\n").expect("parse");
        assert_eq!(parsed.gemini.api_key.as_deref(), Some("k"));
    }
}
