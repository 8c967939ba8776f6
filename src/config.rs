// Configuration loaded from ~/.leadboard/rc
//
// The rc file is a list of `key=value` lines. Blank lines and lines starting
// with `#` are ignored, as are unknown keys.

use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

/// Default drag activation distance in pixels
pub const DEFAULT_ACTIVATION_DISTANCE: f64 = 8.0;

/// When to emit ANSI colors in board output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(ColorMode::Auto),
            "on" | "always" => Some(ColorMode::Always),
            "off" | "never" => Some(ColorMode::Never),
            _ => None,
        }
    }

    /// Resolve against whether stdout is a terminal
    pub fn enabled(&self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Database location (`data.location`), already resolved against the rc directory
    pub data_location: Option<PathBuf>,
    /// Minimum pointer travel before a press becomes a drag (`board.activation_distance`)
    pub activation_distance: f64,
    pub color: ColorMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_location: None,
            activation_distance: DEFAULT_ACTIVATION_DISTANCE,
            color: ColorMode::Auto,
        }
    }
}

impl Config {
    /// Directory holding the rc file and the default database
    pub fn home_dir() -> Result<PathBuf> {
        // HOME wins over the platform lookup so tests can point it at a temp dir
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .context("Could not determine home directory")?;
        Ok(home.join(".leadboard"))
    }

    /// Path of the rc file
    pub fn rc_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("rc"))
    }

    /// Load the rc file, falling back to defaults when it does not exist
    pub fn load() -> Result<Self> {
        let path = Self::rc_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content, path.parent())
    }

    /// Parse rc content. Relative `data.location` values resolve against `base_dir`.
    pub fn parse(content: &str, base_dir: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        for (line_no, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::warn!("rc line {} ignored: expected key=value", line_no + 1);
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "data.location" => {
                    let path = PathBuf::from(value);
                    config.data_location = Some(match base_dir {
                        Some(dir) if path.is_relative() => dir.join(path),
                        _ => path,
                    });
                }
                "board.activation_distance" => {
                    let distance: f64 = value.parse().with_context(|| {
                        format!("Invalid board.activation_distance '{}' on line {}", value, line_no + 1)
                    })?;
                    if !distance.is_finite() || distance < 0.0 {
                        anyhow::bail!("board.activation_distance must be a non-negative number, got {}", value);
                    }
                    config.activation_distance = distance;
                }
                "color" => {
                    config.color = ColorMode::from_str(value).with_context(|| {
                        format!("Invalid color mode '{}' (expected on, off or auto)", value)
                    })?;
                }
                other => log::debug!("Unknown rc key '{}' ignored", other),
            }
        }

        Ok(config)
    }
}
