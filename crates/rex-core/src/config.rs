use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay_secs: 0.25,
            max_delay_secs: 5,
        }
    }
}

/// Global configuration loaded from `~/.config/rex/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RexConfig {
    /// `User-Agent` sent unless the caller supplies one.
    pub user_agent: String,
    /// Connect timeout per request, in seconds.
    pub connect_timeout_secs: u64,
    /// Total timeout per request, in seconds.
    pub timeout_secs: u64,
    /// Maximum concurrent transfers across all checks of a run.
    pub max_in_flight: usize,
    /// Body bytes kept per response for link extraction and probe comparison.
    pub max_body_bytes: usize,
    /// Descend into linked resources unless the command line says otherwise.
    #[serde(default)]
    pub descend: bool,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for RexConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("rex/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout_secs: 10,
            timeout_secs: 30,
            max_in_flight: 8,
            max_body_bytes: 8 * 1024 * 1024,
            descend: false,
            retry: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rex")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RexConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RexConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<RexConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: RexConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = RexConfig::default();
        assert!(cfg.user_agent.starts_with("rex/"));
        assert_eq!(cfg.connect_timeout_secs, 10);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.max_in_flight, 8);
        assert!(!cfg.descend);
        assert!(cfg.retry.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = RexConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: RexConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.user_agent, cfg.user_agent);
        assert_eq!(parsed.max_body_bytes, cfg.max_body_bytes);
        assert_eq!(parsed.max_in_flight, cfg.max_in_flight);
    }

    #[test]
    fn config_toml_retry_section() {
        let toml = r#"
            user_agent = "probe/1"
            connect_timeout_secs = 3
            timeout_secs = 9
            max_in_flight = 2
            max_body_bytes = 65536
            descend = true

            [retry]
            max_attempts = 4
            base_delay_secs = 0.5
            max_delay_secs = 15
        "#;
        let cfg: RexConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.user_agent, "probe/1");
        assert_eq!(cfg.max_body_bytes, 65536);
        assert!(cfg.descend);
        let retry = cfg.retry.as_ref().unwrap();
        assert_eq!(retry.max_attempts, 4);
        assert!((retry.base_delay_secs - 0.5).abs() < 1e-9);
        assert_eq!(retry.max_delay_secs, 15);
    }

    #[test]
    fn load_from_path_reads_file_and_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, toml::to_string_pretty(&RexConfig::default()).unwrap()).unwrap();
        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.timeout_secs, 30);

        fs::write(&path, "max_in_flight = \"many\"").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing config"));
        assert!(load_from_path(&dir.path().join("missing.toml")).is_err());
    }
}
