use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::error::{SwitchError, SwitchResult};

/// Key holding the list of directories scanned for environments
pub const KEY_ENVIRONMENT_DIRECTORIES: &str = "environment_directories";
/// Key holding the log verbosity
pub const KEY_LOG_LEVEL: &str = "log_level";
/// Key selecting the language-assistant plugin to notify
pub const KEY_LSP_PLUGIN: &str = "LSP_plugin";
/// Key holding the directory of language-assistant endpoints
pub const KEY_LSP_SOCKET_DIR: &str = "lsp_socket_dir";

/// Contents written when the settings file is created from scratch
pub const DEFAULT_SETTINGS: &str = r#"# vswitch settings

# Directories whose immediate subdirectories are virtual environments.
# A leading "~" is expanded to the home directory.
environment_directories = ["~/.virtualenvs"]

# One of NOTSET, DEBUG, INFO, WARNING, ERROR, CRITICAL.
log_level = "INFO"

# Language-assistant plugin told about the active interpreter:
# "none", "LSP-pyright" or "LSP-basedpyright".
LSP_plugin = "none"

# Directory holding "<plugin>.sock" endpoints. Defaults to the runtime directory.
# lsp_socket_dir = "/run/user/1000"
"#;

/// Log verbosity accepted in the settings file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    NotSet,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Parse a level name, trimmed and case-insensitive. `WARN` and `FATAL`
    /// are accepted as synonyms.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "NOTSET" => Some(LogLevel::NotSet),
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARNING" | "WARN" => Some(LogLevel::Warning),
            "ERROR" => Some(LogLevel::Error),
            "CRITICAL" | "FATAL" => Some(LogLevel::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::NotSet => "NOTSET",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = SwitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::parse(s).ok_or_else(|| SwitchError::config(format!("Unknown log level: {}", s)))
    }
}

/// Language-assistant plugins that can be told about the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LspPlugin {
    #[default]
    None,
    LspPyright,
    LspBasedpyright,
}

impl LspPlugin {
    pub const ALL: [LspPlugin; 3] = [LspPlugin::None, LspPlugin::LspPyright, LspPlugin::LspBasedpyright];

    /// Identifier used in settings and endpoint names
    pub fn id(&self) -> &'static str {
        match self {
            LspPlugin::None => "none",
            LspPlugin::LspPyright => "LSP-pyright",
            LspPlugin::LspBasedpyright => "LSP-basedpyright",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|plugin| plugin.id().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for LspPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Outcome of re-validating one settings key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsEvent {
    LogLevelChanged(LogLevel),
    LspPluginChanged(LspPlugin),
    /// A value was refused; the previous valid value stays in effect
    Rejected { key: String, message: String },
}

/// Configured search roots after validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRoots {
    pub roots: Vec<PathBuf>,
    /// One message per skipped entry
    pub warnings: Vec<String>,
}

/// Live settings for the switcher.
///
/// The raw table is kept as loaded so that `environment_directories` is read
/// fresh on every listing; the scalar options are validated on every
/// [`Settings::apply`] and only replaced by valid values.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    path: Option<PathBuf>,
    raw: toml::Table,
    log_level: LogLevel,
    lsp_plugin: LspPlugin,
}

impl Settings {
    /// Empty settings not backed by a file
    pub fn new() -> Self {
        Self::default()
    }

    /// Default settings backed by `path`, not yet read
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Load settings from a TOML file. A missing file behaves like an empty one.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SwitchResult<(Self, Vec<SettingsEvent>)> {
        let mut settings = Self::with_path(path.as_ref());
        let events = settings.reload()?;
        Ok((settings, events))
    }

    /// Parse settings from a TOML string
    pub fn from_toml(content: &str) -> SwitchResult<(Self, Vec<SettingsEvent>)> {
        let table: toml::Table = toml::from_str(content)?;
        let mut settings = Self::default();
        let events = settings.apply(table);
        Ok((settings, events))
    }

    /// Re-read the backing file and apply it
    pub fn reload(&mut self) -> SwitchResult<Vec<SettingsEvent>> {
        let Some(path) = self.path.clone() else {
            return Ok(Vec::new());
        };

        let table = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            toml::from_str::<toml::Table>(&contents).map_err(|e| {
                SwitchError::config(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            debug!("Settings file {} does not exist, using defaults", path.display());
            toml::Table::new()
        };

        Ok(self.apply(table))
    }

    /// Replace the raw table and re-validate the observed options
    pub fn apply(&mut self, table: toml::Table) -> Vec<SettingsEvent> {
        self.raw = table;
        let mut events = Vec::new();

        // a missing key falls back to the default, an invalid one is ignored
        let level = match self.raw.get(KEY_LOG_LEVEL) {
            None => Some(LogLevel::default()),
            Some(toml::Value::String(value)) => LogLevel::parse(value).or_else(|| {
                events.push(rejected(KEY_LOG_LEVEL, format!("unknown log level '{}'", value)));
                None
            }),
            Some(other) => {
                events.push(rejected(KEY_LOG_LEVEL, format!("expected a string, got {}", other.type_str())));
                None
            }
        };
        if let Some(level) = level.filter(|level| *level != self.log_level) {
            self.log_level = level;
            events.push(SettingsEvent::LogLevelChanged(level));
        }

        let plugin = match self.raw.get(KEY_LSP_PLUGIN) {
            None => Some(LspPlugin::default()),
            Some(toml::Value::String(value)) => LspPlugin::parse(value).or_else(|| {
                events.push(rejected(KEY_LSP_PLUGIN, format!("unsupported plugin '{}'", value)));
                None
            }),
            Some(other) => {
                events.push(rejected(KEY_LSP_PLUGIN, format!("expected a string, got {}", other.type_str())));
                None
            }
        };
        if let Some(plugin) = plugin.filter(|plugin| *plugin != self.lsp_plugin) {
            self.lsp_plugin = plugin;
            events.push(SettingsEvent::LspPluginChanged(plugin));
        }

        events
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn lsp_plugin(&self) -> LspPlugin {
        self.lsp_plugin
    }

    /// Directory holding language-assistant endpoints
    pub fn lsp_socket_dir(&self) -> PathBuf {
        match self.raw.get(KEY_LSP_SOCKET_DIR) {
            Some(toml::Value::String(dir)) => expand_tilde(dir),
            _ => dirs::runtime_dir().unwrap_or_else(std::env::temp_dir),
        }
    }

    /// Validated `environment_directories`, with `~` expanded
    pub fn environment_directories(&self) -> SearchRoots {
        let mut result = SearchRoots::default();

        let entries = match self.raw.get(KEY_ENVIRONMENT_DIRECTORIES) {
            None => return result,
            Some(toml::Value::Array(entries)) => entries,
            Some(other) => {
                result.warnings.push(format!(
                    "'{}' should be a list, but got {}.",
                    KEY_ENVIRONMENT_DIRECTORIES,
                    other.type_str()
                ));
                return result;
            }
        };

        for entry in entries {
            match entry {
                toml::Value::String(dir) => result.roots.push(expand_tilde(dir)),
                other => result.warnings.push(format!(
                    "Ignored invalid entry in '{}': {}",
                    KEY_ENVIRONMENT_DIRECTORIES, other
                )),
            }
        }

        result
    }
}

fn rejected(key: &str, message: String) -> SettingsEvent {
    SettingsEvent::Rejected {
        key: key.to_string(),
        message,
    }
}

/// Platform name used in the settings file name
pub fn platform_name() -> &'static str {
    if cfg!(target_os = "macos") {
        "osx"
    } else if cfg!(windows) {
        "windows"
    } else {
        "linux"
    }
}

/// Default per-platform settings file location
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("vswitch"))
        .unwrap_or_else(|| PathBuf::from(".vswitch"))
        .join(format!("settings ({}).toml", platform_name()))
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    let home = match dirs::home_dir() {
        Some(home) => home,
        None => return PathBuf::from(path),
    };

    if path == "~" {
        return home;
    }

    match path.strip_prefix("~/").or_else(|| {
        if cfg!(windows) {
            path.strip_prefix("~\\")
        } else {
            None
        }
    }) {
        Some(rest) => home.join(rest),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse(" debug "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("Warn"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse("fatal"), Some(LogLevel::Critical));
        assert_eq!(LogLevel::parse("loud"), None);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_invalid_values_keep_previous() {
        let (mut settings, events) = Settings::from_toml(
            r#"
            log_level = "debug"
            LSP_plugin = "LSP-pyright"
            "#,
        )
        .unwrap();
        assert_eq!(
            events,
            vec![
                SettingsEvent::LogLevelChanged(LogLevel::Debug),
                SettingsEvent::LspPluginChanged(LspPlugin::LspPyright),
            ]
        );

        let table: toml::Table = toml::from_str(
            r#"
            log_level = "chatty"
            LSP_plugin = 3
            "#,
        )
        .unwrap();
        let events = settings.apply(table);
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|e| matches!(e, SettingsEvent::Rejected { .. })));
        assert_eq!(settings.log_level(), LogLevel::Debug);
        assert_eq!(settings.lsp_plugin(), LspPlugin::LspPyright);
    }

    #[test]
    fn test_unchanged_values_emit_nothing() {
        let (mut settings, _) = Settings::from_toml(r#"log_level = "INFO""#).unwrap();
        let table: toml::Table = toml::from_str(r#"log_level = "info""#).unwrap();
        assert!(settings.apply(table).is_empty());
    }

    #[test]
    fn test_removed_keys_fall_back_to_defaults() {
        let (mut settings, _) = Settings::from_toml(
            r#"
            log_level = "DEBUG"
            LSP_plugin = "LSP-basedpyright"
            "#,
        )
        .unwrap();

        let events = settings.apply(toml::Table::new());
        assert_eq!(
            events,
            vec![
                SettingsEvent::LogLevelChanged(LogLevel::Info),
                SettingsEvent::LspPluginChanged(LspPlugin::None),
            ]
        );
        assert_eq!(settings.log_level(), LogLevel::Info);
        assert_eq!(settings.lsp_plugin(), LspPlugin::None);
        assert!(settings.apply(toml::Table::new()).is_empty());
    }

    #[test]
    fn test_environment_directories_skip_invalid_entries() {
        let (settings, _) =
            Settings::from_toml(r#"environment_directories = ["/envs", 42, "/more"]"#).unwrap();
        let roots = settings.environment_directories();
        assert_eq!(roots.roots, vec![PathBuf::from("/envs"), PathBuf::from("/more")]);
        assert_eq!(roots.warnings.len(), 1);
        assert!(roots.warnings[0].contains("42"));
    }

    #[test]
    fn test_environment_directories_not_a_list() {
        let (settings, _) = Settings::from_toml(r#"environment_directories = "/envs""#).unwrap();
        let roots = settings.environment_directories();
        assert!(roots.roots.is_empty());
        assert_eq!(roots.warnings.len(), 1);
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~"), home);
            assert_eq!(expand_tilde("~/.virtualenvs"), home.join(".virtualenvs"));
        }
        assert_eq!(expand_tilde("/abs/~x"), PathBuf::from("/abs/~x"));
    }

    #[test]
    fn test_default_settings_parse() {
        let (settings, events) = Settings::from_toml(DEFAULT_SETTINGS).unwrap();
        assert!(events.is_empty());
        assert_eq!(settings.environment_directories().roots.len(), 1);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let (settings, events) = Settings::from_file(temp.path().join("absent.toml")).unwrap();
        assert!(events.is_empty());
        assert_eq!(settings.log_level(), LogLevel::Info);
        assert_eq!(settings.lsp_plugin(), LspPlugin::None);
    }
}
