//! Environment variables owned by the activation stack.
//!
//! Every mutation of `PATH` and `VIRTUAL_ENV` goes through an
//! [`EnvironmentContext`], so the entry one activation prepends is exactly
//! the entry the matching deactivation removes. [`ProcessEnvironment`] writes
//! through to the real process; [`MemoryEnvironment`] keeps a private copy.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{SwitchError, SwitchResult};

/// Variable naming the active virtual environment root
pub const VIRTUAL_ENV: &str = "VIRTUAL_ENV";

/// Executable search path variable
pub const PATH: &str = "PATH";

/// Activation records carried between separate invocations
pub const STACK_STATE: &str = "VSWITCH_STACK";

/// Read/write access to a set of environment variables
pub trait EnvironmentContext {
    /// Get a variable, `None` when unset
    fn var(&self, key: &str) -> Option<String>;

    /// Set a variable
    fn set_var(&mut self, key: &str, value: &str);

    /// Unset a variable
    fn remove_var(&mut self, key: &str);

    /// Current search path entries, in order
    fn search_path(&self) -> Vec<PathBuf> {
        self.var(PATH)
            .map(|value| std::env::split_paths(&value).collect())
            .unwrap_or_default()
    }

    /// Replace the search path. An empty list unsets the variable.
    fn set_search_path(&mut self, entries: &[PathBuf]) -> SwitchResult<()> {
        if entries.is_empty() {
            self.remove_var(PATH);
            return Ok(());
        }

        let joined = std::env::join_paths(entries)
            .map_err(|e| SwitchError::environment(format!("Cannot build {}: {}", PATH, e)))?;
        self.set_var(PATH, &joined.to_string_lossy());
        Ok(())
    }

    /// Put `entry` at the front of the search path unless it is already the
    /// first entry. Returns whether the path changed.
    fn prepend_path_entry(&mut self, entry: &Path) -> SwitchResult<bool> {
        let mut entries = self.search_path();
        if entries.first().map(PathBuf::as_path) == Some(entry) {
            return Ok(false);
        }

        entries.insert(0, entry.to_path_buf());
        self.set_search_path(&entries)?;
        Ok(true)
    }

    /// Remove the first occurrence of `entry`. Returns whether it was found.
    fn remove_path_entry(&mut self, entry: &Path) -> SwitchResult<bool> {
        let mut entries = self.search_path();
        match entries.iter().position(|existing| existing == entry) {
            Some(index) => {
                entries.remove(index);
                self.set_search_path(&entries)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// The real process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl EnvironmentContext for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set_var(&mut self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }

    fn remove_var(&mut self, key: &str) {
        std::env::remove_var(key);
    }
}

/// An in-memory environment, detached from the process
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryEnvironment {
    vars: BTreeMap<String, String>,
}

impl MemoryEnvironment {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current process environment
    pub fn from_process() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    /// Build from raw variables. Entries that are not valid Unicode are
    /// left out.
    pub fn from_os_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let vars = vars
            .into_iter()
            .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                (key, _) => {
                    debug!("Skipping non-Unicode environment variable {:?}", key);
                    None
                }
            })
            .collect();
        Self { vars }
    }

    /// Builder-style setter
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// All variables, sorted by name
    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl EnvironmentContext for MemoryEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn set_var(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    fn remove_var(&mut self, key: &str) {
        self.vars.remove(key);
    }
}
