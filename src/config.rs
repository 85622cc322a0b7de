//! Service configuration
//!
//! Defaults, then an optional `remote-pointer.toml`, then `REMOTE_POINTER_*`
//! environment variables.

use remote_pointer_shared::limits;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Config file read when `REMOTE_POINTER_CONFIG` is not set
pub const DEFAULT_CONFIG_FILE: &str = "remote-pointer.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
}

/// Which pointer backend drives the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceBackend {
    /// In-memory pointer, nothing is injected into the OS
    Simulated,
    /// Real pointer injection and screen capture (requires the `native` feature)
    Native,
}

impl Default for DeviceBackend {
    fn default() -> Self {
        if cfg!(feature = "native") {
            DeviceBackend::Native
        } else {
            DeviceBackend::Simulated
        }
    }
}

impl FromStr for DeviceBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simulated" | "sim" => Ok(DeviceBackend::Simulated),
            "native" => Ok(DeviceBackend::Native),
            _ => Err(()),
        }
    }
}

/// Device and drawing parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    pub backend: DeviceBackend,
    /// Initial pointer speed in pixels per movement step
    pub pointer_speed: f64,
    /// Pause between interpolated movement steps
    pub step_interval_ms: u64,
    /// Speed applied while dragging rectangles and squares
    pub draw_speed: f64,
    /// Side of the square captured by `prnt_scrn`
    pub capture_side: u32,
    /// Points per `draw_circle` path
    pub circle_steps: usize,
    /// Prefix of the per-process capture directory
    pub capture_dir_prefix: String,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            backend: DeviceBackend::default(),
            pointer_speed: 10.0,
            step_interval_ms: 1,
            draw_speed: limits::DRAW_SPEED,
            capture_side: limits::CAPTURE_SIDE,
            circle_steps: limits::CIRCLE_STEPS,
            capture_dir_prefix: "remote-control-images-".into(),
        }
    }
}

impl DeviceSettings {
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }
}

/// Top-level service settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// WebSocket control channel address
    pub ws_bind: String,
    /// Static asset server address
    pub http_bind: String,
    /// Directory holding the front-end files
    pub asset_root: PathBuf,
    /// Capacity of the device command queue
    pub queue_capacity: usize,
    /// Upper bound on concurrent controllers, unlimited when unset
    pub max_sessions: Option<usize>,
    pub device: DeviceSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ws_bind: "0.0.0.0:8001".into(),
            http_bind: "0.0.0.0:8181".into(),
            asset_root: PathBuf::from("front"),
            queue_capacity: 64,
            max_sessions: None,
            device: DeviceSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from the config file (if present) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("REMOTE_POINTER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut settings = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Parse a TOML settings file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override fields from environment variables looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("REMOTE_POINTER_WS_BIND") {
            self.ws_bind = v;
        }
        if let Some(v) = lookup("REMOTE_POINTER_HTTP_BIND") {
            self.http_bind = v;
        }
        if let Some(v) = lookup("REMOTE_POINTER_ASSET_ROOT") {
            self.asset_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("REMOTE_POINTER_DEVICE") {
            self.device.backend = v.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "REMOTE_POINTER_DEVICE",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("REMOTE_POINTER_MAX_SESSIONS") {
            let max = v.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "REMOTE_POINTER_MAX_SESSIONS",
                value: v.clone(),
            })?;
            self.max_sessions = Some(max);
        }
        if let Some(v) = lookup("REMOTE_POINTER_SPEED") {
            self.device.pointer_speed = v.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "REMOTE_POINTER_SPEED",
                value: v.clone(),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_match_protocol_constants() {
        let settings = Settings::default();
        assert_eq!(settings.ws_bind, "0.0.0.0:8001");
        assert_eq!(settings.device.draw_speed, 20.0);
        assert_eq!(settings.device.capture_side, 200);
        assert_eq!(settings.device.circle_steps, 314);
        assert!(settings.max_sessions.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "ws_bind = \"127.0.0.1:9001\"\n\n[device]\nbackend = \"simulated\"\ncircle_steps = 100"
        )
        .unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.ws_bind, "127.0.0.1:9001");
        assert_eq!(settings.http_bind, "0.0.0.0:8181");
        assert_eq!(settings.device.backend, DeviceBackend::Simulated);
        assert_eq!(settings.device.circle_steps, 100);
        assert_eq!(settings.device.capture_side, 200);
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ws_bind = ").unwrap();
        assert!(matches!(
            Settings::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("REMOTE_POINTER_WS_BIND", "127.0.0.1:7000"),
            ("REMOTE_POINTER_DEVICE", "Simulated"),
            ("REMOTE_POINTER_MAX_SESSIONS", "1"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(settings.ws_bind, "127.0.0.1:7000");
        assert_eq!(settings.device.backend, DeviceBackend::Simulated);
        assert_eq!(settings.max_sessions, Some(1));
    }

    #[test]
    fn test_invalid_env_value() {
        let mut settings = Settings::default();
        let result = settings.apply_env(|key| {
            (key == "REMOTE_POINTER_DEVICE").then(|| "joystick".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidEnv { .. })));
    }
}
