//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::color::{Rgb, Rgba};
use crate::core::errors::{Result, XsmonError};

/// Full xsmon configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub colors: ColorConfig,
    pub alerts: AlertConfig,
    pub sampling: SamplingConfig,
}

/// Icon colors. `alert` is blended over the normal colors to get the alert pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ColorConfig {
    pub background: Rgb,
    pub cpu: Rgb,
    pub memory: Rgb,
    pub alert: Rgba,
}

/// Alert thresholds, in percent. A sample strictly above the threshold alerts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertConfig {
    pub cpu_threshold: f64,
    pub memory_threshold: f64,
}

/// Tick pacing and initial icon geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SamplingConfig {
    pub interval_ms: u64,
    pub icon_size: u16,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            background: Rgb::new(0x10, 0x11, 0x14),
            cpu: Rgb::new(0x8A, 0xE2, 0x34),
            memory: Rgb::new(0xAD, 0x7F, 0xA8),
            alert: Rgba::new(0xFF, 0x00, 0x00, 0xCC),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cpu_threshold: 95.0,
            memory_threshold: 80.0,
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            icon_size: 48,
        }
    }
}

impl Config {
    /// Default configuration path (`$XDG_CONFIG_HOME/xsmon/config.toml`).
    #[must_use]
    pub fn default_path() -> PathBuf {
        let base = env::var_os("XDG_CONFIG_HOME")
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .unwrap_or_else(|| {
                tracing::warn!("HOME not set, falling back to /tmp for the config path");
                PathBuf::from("/tmp")
            });
        base.join("xsmon").join("config.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf)
                .map_err(|source| XsmonError::io(&path_buf, source))?;
            tracing::debug!(path = %path_buf.display(), "loaded config file");
            toml::from_str::<Self>(&raw)?
        } else if path.is_some() {
            return Err(XsmonError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for startup logging.
    ///
    /// FNV-1a over canonical JSON so the value is stable across releases.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("XSMON_BG_COLOR") {
            self.colors.background = raw.parse()?;
        }
        if let Some(raw) = lookup("XSMON_CPU_COLOR") {
            self.colors.cpu = raw.parse()?;
        }
        if let Some(raw) = lookup("XSMON_MEM_COLOR") {
            self.colors.memory = raw.parse()?;
        }
        if let Some(raw) = lookup("XSMON_ALERT_COLOR") {
            self.colors.alert = raw.parse()?;
        }
        if let Some(raw) = lookup("XSMON_CPU_ALERT") {
            self.alerts.cpu_threshold = parse_env("XSMON_CPU_ALERT", &raw)?;
        }
        if let Some(raw) = lookup("XSMON_MEM_ALERT") {
            self.alerts.memory_threshold = parse_env("XSMON_MEM_ALERT", &raw)?;
        }
        if let Some(raw) = lookup("XSMON_INTERVAL_MS") {
            self.sampling.interval_ms = parse_env("XSMON_INTERVAL_MS", &raw)?;
        }
        Ok(())
    }

    /// Check value ranges. Called by [`Config::load`] and again after CLI overrides.
    pub fn validate(&self) -> Result<()> {
        for (name, val) in [
            ("cpu_threshold", self.alerts.cpu_threshold),
            ("memory_threshold", self.alerts.memory_threshold),
        ] {
            if !(0.0..=100.0).contains(&val) {
                return Err(XsmonError::InvalidConfig {
                    details: format!("alerts.{name} must be in [0, 100], got {val}"),
                });
            }
        }

        if self.sampling.interval_ms == 0 {
            return Err(XsmonError::InvalidConfig {
                details: "sampling.interval_ms must be >= 1".to_string(),
            });
        }
        if self.sampling.icon_size == 0 {
            return Err(XsmonError::InvalidConfig {
                details: "sampling.icon_size must be >= 1".to_string(),
            });
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|error| XsmonError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

#[cfg(test)]
mod tests {
    use super::{Config, XsmonError};
    use crate::core::color::{Rgb, Rgba};
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::Path;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.colors.background.to_string(), "#101114");
        assert_eq!(cfg.colors.cpu.to_string(), "#8AE234");
        assert_eq!(cfg.colors.memory.to_string(), "#AD7FA8");
        assert_eq!(cfg.colors.alert.to_string(), "#FF0000CC");
        assert!((cfg.alerts.cpu_threshold - 95.0).abs() < f64::EPSILON);
        assert!((cfg.alerts.memory_threshold - 80.0).abs() < f64::EPSILON);
        assert_eq!(cfg.sampling.interval_ms, 1_000);
        assert_eq!(cfg.sampling.icon_size, 48);
    }

    #[test]
    fn threshold_out_of_range_rejected() {
        let mut cfg = Config::default();
        cfg.alerts.memory_threshold = 120.0;
        let err = cfg.validate().expect_err("expected threshold error");
        match err {
            XsmonError::InvalidConfig { details } => {
                assert!(details.contains("memory_threshold"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_interval_rejected() {
        let mut cfg = Config::default();
        cfg.sampling.interval_ms = 0;
        let err = cfg.validate().expect_err("expected interval error");
        assert!(err.to_string().contains("interval_ms"));
    }

    #[test]
    fn env_overrides_replace_defaults() {
        let env = vars(&[
            ("XSMON_BG_COLOR", "#000000"),
            ("XSMON_ALERT_COLOR", "#00FF0080"),
            ("XSMON_CPU_ALERT", "50"),
            ("XSMON_INTERVAL_MS", "250"),
        ]);
        let mut cfg = Config::default();
        cfg.apply_env_overrides_from(|name| env.get(name).cloned())
            .expect("overrides should apply");
        assert_eq!(cfg.colors.background, Rgb::new(0, 0, 0));
        assert_eq!(cfg.colors.alert, Rgba::new(0, 0xFF, 0, 0x80));
        assert!((cfg.alerts.cpu_threshold - 50.0).abs() < f64::EPSILON);
        assert_eq!(cfg.sampling.interval_ms, 250);
        assert_eq!(cfg.colors.cpu, Config::default().colors.cpu);
    }

    #[test]
    fn env_invalid_number_rejected() {
        let env = vars(&[("XSMON_MEM_ALERT", "lots")]);
        let mut cfg = Config::default();
        let err = cfg
            .apply_env_overrides_from(|name| env.get(name).cloned())
            .expect_err("expected parse failure");
        assert_eq!(err.code(), "XSM-1003");
        assert!(err.to_string().contains("XSMON_MEM_ALERT"));
    }

    #[test]
    fn env_invalid_color_rejected() {
        let env = vars(&[("XSMON_CPU_COLOR", "green")]);
        let mut cfg = Config::default();
        let err = cfg
            .apply_env_overrides_from(|name| env.get(name).cloned())
            .expect_err("expected color failure");
        assert_eq!(err.code(), "XSM-1004");
    }

    #[test]
    fn load_returns_error_for_explicit_missing_path() {
        let err = Config::load(Some(Path::new("/nonexistent/xsmon/config.toml")))
            .expect_err("expected missing config");
        assert!(matches!(err, XsmonError::MissingConfig { .. }));
    }

    #[test]
    fn unreadable_config_path_reports_io_error_with_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = Config::load(Some(dir.path())).expect_err("a directory is not a file");
        assert_eq!(err.code(), "XSM-3003");
        assert!(err.to_string().contains(&dir.path().display().to_string()));
    }

    #[test]
    fn load_reads_partial_toml_and_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[colors]\ncpu = \"#112233\"\n\n[alerts]\nmemory_threshold = 60"
        )
        .expect("write config");

        let cfg = Config::load(Some(file.path())).expect("config should load");
        assert_eq!(cfg.colors.cpu, Rgb::new(0x11, 0x22, 0x33));
        assert_eq!(cfg.colors.memory, Config::default().colors.memory);
        assert!((cfg.alerts.memory_threshold - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[colors\ncpu = ").expect("write config");
        let err = Config::load(Some(file.path())).expect_err("expected parse failure");
        assert_eq!(err.code(), "XSM-1003");
    }

    #[test]
    fn toml_output_round_trips() {
        let mut cfg = Config::default();
        cfg.alerts.cpu_threshold = 70.0;
        let rendered = cfg.to_toml().expect("render");
        let parsed: Config = toml::from_str(&rendered).expect("parse");
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn stable_hash_tracks_changes() {
        let cfg = Config::default();
        let before = cfg.stable_hash().expect("hash");
        assert_eq!(before, Config::default().stable_hash().expect("hash"));
        let mut modified = Config::default();
        modified.sampling.icon_size += 1;
        assert_ne!(before, modified.stable_hash().expect("hash"));
    }
}
