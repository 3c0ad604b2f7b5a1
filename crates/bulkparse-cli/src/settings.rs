use std::fs::{OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SETTINGS_FILE: &str = "bulkparse.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("toml encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[error("{0} already exists (use --force to overwrite)")]
    Exists(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// CLI settings read from `bulkparse.toml`. Flags override every value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Parent directory for run artifacts.
    pub run_dir: PathBuf,
    /// Error examples listed in report.md.
    pub max_examples: usize,
    /// Fail the run when any record is rejected.
    pub strict: bool,
    /// Default stderr filter when RUST_LOG is unset.
    pub log_level: String,
    /// Write clean.json into the run directory.
    pub write_clean: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            run_dir: PathBuf::from("runs"),
            max_examples: 20,
            strict: false,
            log_level: "warn".to_string(),
            write_clean: true,
        }
    }
}

/// Load settings from `path`, falling back to defaults when the file is missing.
pub fn load_settings(path: &Path) -> SettingsResult<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Write default settings to `path`.
pub fn init_settings(path: &Path, force: bool) -> SettingsResult<Settings> {
    if path.exists() && !force {
        return Err(SettingsError::Exists(path.display().to_string()));
    }
    let settings = Settings::default();
    save_settings(path, &settings)?;
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &Settings) -> SettingsResult<()> {
    let encoded = toml::to_string_pretty(settings)?;
    write_bytes_atomic(path, encoded.as_bytes())?;
    Ok(())
}

fn write_bytes_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    std::fs::rename(&tmp_path, path)
}

fn temp_path(path: &Path) -> io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "invalid path for atomic write")
    })?;
    let tmp_name = format!("{}.tmp", file_name.to_string_lossy());
    Ok(path.with_file_name(tmp_name))
}
