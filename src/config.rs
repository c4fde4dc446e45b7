//! Backend address resolution.
//!
//! The base address is established once at startup and immutable
//! afterwards. Precedence: CLI flags > environment > per-user config
//! file > defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

pub const ENV_HOST: &str = "EVODASH_HOST";
pub const ENV_PORT: &str = "EVODASH_PORT";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 8088;

/// Where the backend lives. Constructed once; the API client derives
/// its endpoint set from `base_url` exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Optional per-user config file, `<config-dir>/evodash/config.json`.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
}

fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("evodash").join("config.json"))
}

fn load_config_file(path: Option<PathBuf>) -> Result<ConfigFile> {
    let Some(path) = path else {
        return Ok(ConfigFile::default());
    };
    if !path.is_file() {
        return Ok(ConfigFile::default());
    }
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("malformed config file {}", path.display()))
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Merge the three override layers onto the defaults. A present but
/// unparseable port is a hard error rather than a silent fallback.
fn merge(
    flag_host: Option<&str>,
    flag_port: Option<u16>,
    env_host: Option<&str>,
    env_port: Option<&str>,
    file: &ConfigFile,
) -> Result<ServerConfig> {
    let host = flag_host
        .map(str::to_string)
        .or_else(|| env_host.map(str::to_string))
        .or_else(|| file.host.clone())
        .unwrap_or_else(|| DEFAULT_HOST.to_string());

    let env_port = env_port
        .map(|raw| {
            raw.parse::<u16>()
                .with_context(|| format!("invalid {ENV_PORT} value: {raw:?}"))
        })
        .transpose()?;

    let port = flag_port
        .or(env_port)
        .or(file.port)
        .unwrap_or(DEFAULT_PORT);

    Ok(ServerConfig { host, port })
}

/// Resolve the backend address from flags, process environment, and the
/// per-user config file.
pub fn resolve(flag_host: Option<&str>, flag_port: Option<u16>) -> Result<ServerConfig> {
    let file = load_config_file(config_file_path())?;
    let env_host = env_var(ENV_HOST);
    let env_port = env_var(ENV_PORT);
    merge(
        flag_host,
        flag_port,
        env_host.as_deref(),
        env_port.as_deref(),
        &file,
    )
}
