use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 1;
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8337";

const ROOT_PATHS_ENV: &str = "MUSICLIB_ROOT_PATHS";
const LISTEN_ADDR_ENV: &str = "MUSICLIB_LISTEN_ADDR";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub version: u32,
    pub root_paths: Vec<String>,
    pub listen_addr: String,
    pub watch_music: bool,
    pub watch_debounce_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            root_paths: Vec::new(),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            watch_music: true,
            watch_debounce_secs: 2,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Yaml(err) => write!(f, "yaml error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

pub fn config_path_from_env() -> PathBuf {
    match env::var("MUSICLIB_CONFIG") {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from("config.yaml")),
        Err(_) => PathBuf::from("config.yaml"),
    }
}

pub fn load_or_create_config(path: &Path) -> Result<(ServerConfig, bool), ConfigError> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let mut config: ServerConfig = serde_yaml::from_str(&contents)?;
        if config.version < CONFIG_VERSION {
            config.version = CONFIG_VERSION;
        }
        if config.listen_addr.trim().is_empty() {
            config.listen_addr = DEFAULT_LISTEN_ADDR.to_string();
        }
        if config.watch_debounce_secs == 0 {
            config.watch_debounce_secs = 2;
        }
        return Ok((config, false));
    }

    let config = ServerConfig::default();
    save_config(path, &config)?;
    Ok((config, true))
}

pub fn save_config(path: &Path, config: &ServerConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Applies `MUSICLIB_ROOT_PATHS` and `MUSICLIB_LISTEN_ADDR` on top of the file values.
pub fn apply_env_overrides(config: &mut ServerConfig) {
    apply_overrides(
        config,
        env::var(ROOT_PATHS_ENV).ok(),
        env::var(LISTEN_ADDR_ENV).ok(),
    );
}

fn apply_overrides(config: &mut ServerConfig, roots: Option<String>, listen: Option<String>) {
    if let Some(roots) = roots {
        let roots = split_root_paths(&roots);
        if !roots.is_empty() {
            config.root_paths = roots;
        }
    }
    if let Some(listen) = listen {
        let listen = listen.trim();
        if !listen.is_empty() {
            config.listen_addr = listen.to_string();
        }
    }
}

fn split_root_paths(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn resolve_path(config_path: &Path, value: &str) -> PathBuf {
    let raw = PathBuf::from(value);
    if raw.is_absolute() {
        return raw;
    }
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    base.join(raw)
}

/// Root paths to index. Falls back to `$HOME/Music` when none are configured.
pub fn resolve_root_paths(config_path: &Path, config: &ServerConfig) -> Vec<PathBuf> {
    let roots: Vec<PathBuf> = config
        .root_paths
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(|value| resolve_path(config_path, value))
        .collect();
    if !roots.is_empty() {
        return roots;
    }
    match env::var_os("HOME") {
        Some(home) => vec![PathBuf::from(home).join("Music")],
        None => vec![PathBuf::from("Music")],
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::*;

    #[test]
    fn missing_config_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let (config, created) = load_or_create_config(&path).unwrap();
        assert!(created);
        assert_eq!(config, ServerConfig::default());
        assert!(path.exists());

        let (reloaded, created) = load_or_create_config(&path).unwrap();
        assert!(!created);
        assert_eq!(reloaded, config);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "root_paths:\n  - music\nlisten_addr: \"\"\n").unwrap();
        let (config, _) = load_or_create_config(&path).unwrap();
        assert_eq!(config.root_paths, vec!["music".to_string()]);
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        assert!(config.watch_music);
        assert_eq!(config.watch_debounce_secs, 2);
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "root_paths: [unterminated\n").unwrap();
        let err = load_or_create_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn env_values_override_file_values() {
        let mut config = ServerConfig {
            root_paths: vec!["/srv/music".to_string()],
            ..ServerConfig::default()
        };
        apply_overrides(
            &mut config,
            Some(" /a , ,/b ".to_string()),
            Some("0.0.0.0:9000".to_string()),
        );
        assert_eq!(config.root_paths, vec!["/a".to_string(), "/b".to_string()]);
        assert_eq!(config.listen_addr, "0.0.0.0:9000");

        apply_overrides(&mut config, Some(" , ".to_string()), Some("  ".to_string()));
        assert_eq!(config.root_paths, vec!["/a".to_string(), "/b".to_string()]);
        assert_eq!(config.listen_addr, "0.0.0.0:9000");
    }

    #[test]
    fn relative_roots_resolve_against_config_dir() {
        let config = ServerConfig {
            root_paths: vec!["music".to_string(), "/abs/music".to_string()],
            ..ServerConfig::default()
        };
        let roots = resolve_root_paths(Path::new("/etc/musiclib/config.yaml"), &config);
        assert_eq!(
            roots,
            vec![
                PathBuf::from("/etc/musiclib/music"),
                PathBuf::from("/abs/music"),
            ]
        );
    }

    #[test]
    fn empty_roots_fall_back_to_home_music() {
        let roots = resolve_root_paths(Path::new("config.yaml"), &ServerConfig::default());
        assert_eq!(roots.len(), 1);
        assert!(roots[0].ends_with("Music"));
    }
}
