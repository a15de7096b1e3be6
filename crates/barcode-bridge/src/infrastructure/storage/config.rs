//! TOML-based configuration for the bridge.
//!
//! The bridge is deployed as a single executable with a `config.toml` beside
//! it.  The file is looked up in this order:
//!
//! 1. a path passed explicitly (`--config` or `BARCODE_BRIDGE_CONFIG`);
//! 2. `config.toml` in the executable's directory;
//! 3. `config.toml` in the current working directory.
//!
//! When no file is found the defaults below are used.
//!
//! ```toml
//! [server]
//! host = "localhost"
//! port = 4000
//! connect_timeout_ms = 5000
//! response_timeout_ms = 5000
//!
//! [scanner]
//! max_key_interval_ms = 100
//! terminator_vk = 13
//! max_length = 256
//!
//! [api]
//! port = 8080
//! export_folder = "exported_zpl"   # C:\DOCUMENTS\Exported_ZPL_Etiketten_Code on Windows
//!
//! [logging]
//! level = "info"
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent, so a file that only sets
//! `server.host` is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use barcode_core::{ScannerConfig, ScannerConfigError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name searched for next to the executable and in the working directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A field holds a value the bridge cannot run with.
    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid scanner settings: {0}")]
    Scanner(#[from] ScannerConfigError),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scanner: ScannerSettings,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the print service listens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub response_timeout_ms: u64,
}

/// Classifier tuning as written in the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScannerSettings {
    /// Largest inter-key gap, in milliseconds, still treated as scanner input.
    #[serde(default = "default_max_key_interval_ms")]
    pub max_key_interval_ms: u64,
    /// Virtual key code that ends a barcode (13 = Enter).
    #[serde(default = "default_terminator_vk")]
    pub terminator_vk: u32,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

/// HTTP export API of the print service (same host as `[server]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Directory export files are written to; created on first export.
    #[serde(default = "default_export_folder")]
    pub export_folder: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `tracing` filter directive: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    4000
}
fn default_timeout_ms() -> u64 {
    5000
}
fn default_max_key_interval_ms() -> u64 {
    barcode_core::scanner::DEFAULT_MAX_KEY_INTERVAL.as_millis() as u64
}
fn default_terminator_vk() -> u32 {
    barcode_core::keymap::VK_RETURN
}
fn default_max_length() -> usize {
    barcode_core::scanner::DEFAULT_MAX_LENGTH
}
fn default_api_port() -> u16 {
    8080
}
fn default_export_folder() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        PathBuf::from(r"C:\DOCUMENTS\Exported_ZPL_Etiketten_Code")
    }

    #[cfg(not(target_os = "windows"))]
    {
        PathBuf::from("exported_zpl")
    }
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_ms: default_timeout_ms(),
            response_timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            max_key_interval_ms: default_max_key_interval_ms(),
            terminator_vk: default_terminator_vk(),
            max_length: default_max_length(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
            export_folder: default_export_folder(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Classifier settings derived from the `[scanner]` section.
    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig {
            max_key_interval: Duration::from_millis(self.scanner.max_key_interval_ms),
            terminator_vk: self.scanner.terminator_vk,
            max_length: self.scanner.max_length,
        }
    }

    /// Rejects values the bridge cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty host, a zero port or a
    /// zero timeout, and [`ConfigError::Scanner`] for bad classifier settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty".into()));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must not be 0".into()));
        }
        if self.api.port == 0 {
            return Err(ConfigError::Invalid("api.port must not be 0".into()));
        }
        if self.server.connect_timeout_ms == 0 || self.server.response_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "server timeouts must be greater than zero".into(),
            ));
        }
        self.scanner_config().validate()?;
        Ok(())
    }

    /// One-line description for the startup log.
    pub fn summary(&self) -> String {
        format!(
            "print service {}:{}, key interval {}ms, terminator VK 0x{:02X}, max length {}",
            self.server.host,
            self.server.port,
            self.scanner.max_key_interval_ms,
            self.scanner.terminator_vk,
            self.scanner.max_length
        )
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// A loaded config and the file it came from (`None` for built-in defaults).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub source: Option<PathBuf>,
}

/// The implicit lookup locations, in priority order.
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        paths.push(dir.join(CONFIG_FILE_NAME));
    }
    if let Ok(cwd) = std::env::current_dir() {
        let path = cwd.join(CONFIG_FILE_NAME);
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    paths
}

/// Returns the first implicit lookup location that holds a file.
pub fn find_config_file() -> Option<PathBuf> {
    candidate_paths().into_iter().find(|p| p.is_file())
}

/// Loads and validates `AppConfig` from `path`, returning
/// `AppConfig::default()` if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed, and a validation error if
/// a value is out of range.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Loads the config using the lookup order described in the module docs.
///
/// An `explicit` path must exist; the implicit locations are optional.
///
/// # Errors
///
/// See [`load_config_from`].  A missing explicit file is a [`ConfigError::Io`].
pub fn load_config(explicit: Option<PathBuf>) -> Result<LoadedConfig, ConfigError> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        return Ok(LoadedConfig {
            config: parse_config(&content)?,
            source: Some(path),
        });
    }

    match find_config_file() {
        Some(path) => Ok(LoadedConfig {
            config: load_config_from(&path)?,
            source: Some(path),
        }),
        None => Ok(LoadedConfig {
            config: AppConfig::default(),
            source: None,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let cfg: AppConfig = toml::from_str(content)?;
    cfg.validate()?;
    Ok(cfg)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("barcode_bridge_test_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_targets_local_print_service() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.server.host, "localhost");
        assert_eq!(cfg.server.port, 4000);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_default_scanner_config_matches_core_defaults() {
        assert_eq!(AppConfig::default().scanner_config(), ScannerConfig::default());
    }

    #[test]
    fn test_api_defaults_to_port_8080() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.api.port, 8080);
        assert!(!cfg.api.export_folder.as_os_str().is_empty());
    }

    #[test]
    fn test_api_section_overrides_port_and_folder() {
        let toml_str = r#"
[api]
port = 9090
export_folder = "/srv/exports"
"#;
        let cfg: AppConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(cfg.api.port, 9090);
        assert_eq!(cfg.api.export_folder, PathBuf::from("/srv/exports"));
    }

    #[test]
    fn test_validate_rejects_zero_api_port() {
        let mut cfg = AppConfig::default();
        cfg.api.port = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("empty file is valid");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_server_section_keeps_other_defaults() {
        // Arrange
        let toml_str = r#"
[server]
host = "192.168.1.20"
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.server.host, "192.168.1.20");
        assert_eq!(cfg.server.port, 4000);
        assert_eq!(cfg.scanner.max_key_interval_ms, 100);
    }

    #[test]
    fn test_scanner_section_maps_to_scanner_config() {
        let toml_str = r#"
[scanner]
max_key_interval_ms = 40
terminator_vk = 9
max_length = 32
"#;
        let cfg: AppConfig = toml::from_str(toml_str).unwrap();

        let scanner = cfg.scanner_config();

        assert_eq!(scanner.max_key_interval, Duration::from_millis(40));
        assert_eq!(scanner.terminator_vk, 0x09);
        assert_eq!(scanner.max_length, 32);
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut cfg = AppConfig::default();
        cfg.server.port = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut cfg = AppConfig::default();
        cfg.scanner.max_key_interval_ms = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Scanner(ScannerConfigError::ZeroInterval))
        ));
    }

    #[test]
    fn test_validate_rejects_character_terminator() {
        let mut cfg = AppConfig::default();
        cfg.scanner.terminator_vk = 0x41;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Scanner(ScannerConfigError::TerminatorIsCharacter(0x41)))
        ));
    }

    #[test]
    fn test_summary_mentions_server_and_timing() {
        let summary = AppConfig::default().summary();
        assert!(summary.contains("localhost:4000"), "got: {summary}");
        assert!(summary.contains("100ms"), "got: {summary}");
        assert!(summary.contains("0x0D"), "got: {summary}");
    }

    // ── Load / save ───────────────────────────────────────────────────────────

    #[test]
    fn test_load_config_from_missing_file_returns_default() {
        let dir = temp_dir();

        let cfg = load_config_from(&dir.join(CONFIG_FILE_NAME)).expect("missing file is ok");

        assert_eq!(cfg, AppConfig::default());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_and_load_config_round_trip_via_temp_dir() {
        // Arrange
        let dir = temp_dir();
        let path = dir.join("nested").join(CONFIG_FILE_NAME);
        let mut cfg = AppConfig::default();
        cfg.server.port = 9100;
        cfg.logging.level = "debug".to_string();

        // Act
        save_config_to(&path, &cfg).expect("save");
        let loaded = load_config_from(&path).expect("load");

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_from_malformed_file_returns_parse_error() {
        let dir = temp_dir();
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        let result = load_config_from(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_with_explicit_path_reports_source() {
        let dir = temp_dir();
        let path = dir.join("bridge.toml");
        std::fs::write(&path, "[server]\nport = 4100\n").unwrap();

        let loaded = load_config(Some(path.clone())).expect("load");

        assert_eq!(loaded.config.server.port, 4100);
        assert_eq!(loaded.source, Some(path));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_with_missing_explicit_path_is_an_error() {
        let dir = temp_dir();

        let result = load_config(Some(dir.join("absent.toml")));

        assert!(matches!(result, Err(ConfigError::Io { .. })));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_candidate_paths_end_with_config_file_name() {
        for path in candidate_paths() {
            assert!(path.ends_with(CONFIG_FILE_NAME), "got {path:?}");
        }
    }
}
