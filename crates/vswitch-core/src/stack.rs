//! The activation stack and its search-path bookkeeping.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::{EnvironmentContext, STACK_STATE, VIRTUAL_ENV};
use crate::discovery::EnvironmentDescriptor;
use crate::error::{SwitchError, SwitchResult};

/// Executable subdirectory of an environment on this platform
pub fn bin_dir_name() -> &'static str {
    if cfg!(windows) {
        "Scripts"
    } else {
        "bin"
    }
}

/// Executable directory of the environment rooted at `venv_path`
pub fn bin_path(venv_path: &Path) -> PathBuf {
    venv_path.join(bin_dir_name())
}

/// Interpreter of the environment rooted at `venv_path`
pub fn interpreter_path(venv_path: &Path) -> PathBuf {
    bin_path(venv_path).join("python")
}

/// One entry on the activation stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRecord {
    /// Chosen environment name; `None` for one adopted at startup
    pub name: Option<String>,
    /// Value of `VIRTUAL_ENV` while this record is on top
    pub virtual_env_path: PathBuf,
    /// Exact entry this activation put at the head of `PATH`
    pub added_path_entry: Option<PathBuf>,
}

impl ActivationRecord {
    /// Display name, falling back to the directory name for adopted records
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .virtual_env_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.virtual_env_path.display().to_string()),
        }
    }

    pub fn interpreter_path(&self) -> PathBuf {
        interpreter_path(&self.virtual_env_path)
    }
}

/// Result of popping the stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deactivation {
    /// Record that was removed
    pub popped: ActivationRecord,
    /// Interpreter of the new top, `None` when the stack is now empty
    pub interpreter: Option<PathBuf>,
}

/// History of activated environments. The last record is the active one.
#[derive(Debug)]
pub struct ActivationStack<E: EnvironmentContext> {
    context: E,
    records: Vec<ActivationRecord>,
}

impl<E: EnvironmentContext> ActivationStack<E> {
    /// Create a stack over `context`.
    ///
    /// Records saved in [`STACK_STATE`] are resumed when their top matches
    /// `VIRTUAL_ENV`. Otherwise an environment that is already active is
    /// adopted as an unnamed bottom record.
    pub fn new(context: E) -> Self {
        let records = match context.var(VIRTUAL_ENV).filter(|v| !v.is_empty()) {
            Some(active) => match saved_records(&context, Path::new(&active)) {
                Some(records) => {
                    debug!("Resuming {} saved activation(s)", records.len());
                    records
                }
                None => vec![adopted_record(&context, active)],
            },
            None => Vec::new(),
        };

        Self { context, records }
    }

    /// Serialized records for [`STACK_STATE`], `None` when the stack is empty
    pub fn saved_state(&self) -> SwitchResult<Option<String>> {
        if self.records.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::to_string(&self.records)?))
    }

    pub fn context(&self) -> &E {
        &self.context
    }

    pub fn into_context(self) -> E {
        self.context
    }

    pub fn records(&self) -> &[ActivationRecord] {
        &self.records
    }

    /// Currently active record
    pub fn current(&self) -> Option<&ActivationRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Activate `descriptor` and return its interpreter path.
    ///
    /// Fails with [`SwitchError::NotFound`] without touching any state when
    /// the environment directory is gone.
    pub fn activate(&mut self, descriptor: &EnvironmentDescriptor) -> SwitchResult<PathBuf> {
        let venv_path = descriptor.venv_path();
        if !venv_path.exists() {
            return Err(SwitchError::not_found(venv_path));
        }

        let bin = bin_path(&venv_path);
        std::env::join_paths([&bin]).map_err(|e| {
            SwitchError::environment(format!("Cannot add {} to the search path: {}", bin.display(), e))
        })?;

        if let Some(previous) = self.current().and_then(|r| r.added_path_entry.clone()) {
            if previous != bin {
                debug!("Removing previous entry from search path: {}", previous.display());
                self.context.remove_path_entry(&previous)?;
            }
        }

        let added = self.context.prepend_path_entry(&bin)?;
        if !added {
            debug!("{} already heads the search path", bin.display());
        }

        self.context.set_var(VIRTUAL_ENV, &venv_path.to_string_lossy());
        self.records.push(ActivationRecord {
            name: Some(descriptor.name.clone()),
            virtual_env_path: venv_path,
            added_path_entry: added.then_some(bin.clone()),
        });

        Ok(bin.join("python"))
    }

    /// Pop the active record and restore the one below it. Returns `None`
    /// when nothing was active.
    pub fn deactivate(&mut self) -> Option<Deactivation> {
        let popped = self.records.pop()?;

        if let Some(entry) = &popped.added_path_entry {
            if let Err(e) = self.context.remove_path_entry(entry) {
                warn!("Failed to remove {} from search path: {}", entry.display(), e);
            }
        }

        let interpreter = match self.records.last_mut() {
            Some(top) => {
                self.context
                    .set_var(VIRTUAL_ENV, &top.virtual_env_path.to_string_lossy());

                if let Some(entry) = top.added_path_entry.clone() {
                    match self.context.prepend_path_entry(&entry) {
                        Ok(true) => {}
                        Ok(false) => {
                            // Someone else owns the head entry now
                            debug!("{} already heads the search path, releasing it", entry.display());
                            top.added_path_entry = None;
                        }
                        Err(e) => {
                            warn!("Failed to restore {} in search path: {}", entry.display(), e);
                            top.added_path_entry = None;
                        }
                    }
                }

                Some(top.interpreter_path())
            }
            None => {
                self.context.remove_var(VIRTUAL_ENV);
                None
            }
        };

        Some(Deactivation { popped, interpreter })
    }
}

fn saved_records<E: EnvironmentContext>(context: &E, active: &Path) -> Option<Vec<ActivationRecord>> {
    let raw = context.var(STACK_STATE)?;
    let records: Vec<ActivationRecord> = match serde_json::from_str(&raw) {
        Ok(records) => records,
        Err(e) => {
            warn!("Ignoring unreadable {}: {}", STACK_STATE, e);
            return None;
        }
    };

    match records.last() {
        Some(top) if top.virtual_env_path.as_path() == active => Some(records),
        _ => {
            debug!("Saved activations do not end at {}, ignoring them", active.display());
            None
        }
    }
}

fn adopted_record<E: EnvironmentContext>(context: &E, active: String) -> ActivationRecord {
    debug!("Adopting already active environment: {}", active);
    let virtual_env_path = PathBuf::from(active);

    // the environment's own activate script leaves its bin directory first
    let bin = bin_path(&virtual_env_path);
    let owns_head = context.search_path().first() == Some(&bin);

    ActivationRecord {
        name: None,
        virtual_env_path,
        added_path_entry: owns_head.then_some(bin),
    }
}
