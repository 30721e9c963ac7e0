use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::config::{Settings, SettingsEvent};
use crate::context::EnvironmentContext;
use crate::discovery::{list_environments, EnvironmentDescriptor};
use crate::error::{SwitchError, SwitchResult};
use crate::host::Reporter;
use crate::logging::LogHandle;
use crate::notify::{InterpreterNotifier, PluginRegistry, SocketRegistry};
use crate::stack::{ActivationRecord, ActivationStack};

/// Owns the settings, the activation stack and the plugin notifier for the
/// lifetime of the host process. All methods run on the command thread.
pub struct EnvironmentManager<E: EnvironmentContext> {
    settings: Settings,
    stack: ActivationStack<E>,
    notifier: InterpreterNotifier,
    reporter: Box<dyn Reporter>,
    log_handle: LogHandle,
    project_folders: Vec<PathBuf>,
}

impl<E: EnvironmentContext> EnvironmentManager<E> {
    /// Create a manager. Plugins are looked up as sockets in the configured
    /// `lsp_socket_dir` unless another registry is supplied.
    pub fn new(settings: Settings, context: E, reporter: Box<dyn Reporter>) -> Self {
        let registry = SocketRegistry::new(settings.lsp_socket_dir());
        let notifier = InterpreterNotifier::new(settings.lsp_plugin(), Box::new(registry));

        Self {
            settings,
            stack: ActivationStack::new(context),
            notifier,
            reporter,
            log_handle: LogHandle::disabled(),
            project_folders: Vec::new(),
        }
    }

    pub fn with_registry(mut self, registry: Box<dyn PluginRegistry>) -> Self {
        self.notifier.set_registry(registry);
        self
    }

    pub fn with_log_handle(mut self, handle: LogHandle) -> Self {
        if let Err(e) = handle.set_level(self.settings.log_level()) {
            warn!("{}", e);
        }
        self.log_handle = handle;
        self
    }

    /// Folders checked for a `.venv` environment
    pub fn with_project_folders(mut self, folders: Vec<PathBuf>) -> Self {
        self.project_folders = folders;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stack(&self) -> &ActivationStack<E> {
        &self.stack
    }

    pub fn context(&self) -> &E {
        self.stack.context()
    }

    pub fn current(&self) -> Option<&ActivationRecord> {
        self.stack.current()
    }

    pub fn project_folders(&self) -> &[PathBuf] {
        &self.project_folders
    }

    /// Discover environments from the configured roots and project folders.
    /// Invalid configured roots are reported and skipped.
    pub fn list_environments(&self) -> Vec<EnvironmentDescriptor> {
        let roots = self.settings.environment_directories();
        for warning in &roots.warnings {
            warn!("{}", warning);
            self.reporter.warning(warning);
        }

        let environments = list_environments(&roots.roots, &self.project_folders);
        debug!("Discovered {} environment(s)", environments.len());
        environments
    }

    /// Activate an environment and tell the language assistant about it
    pub fn activate(&mut self, descriptor: &EnvironmentDescriptor) -> SwitchResult<()> {
        let interpreter = match self.stack.activate(descriptor) {
            Ok(interpreter) => interpreter,
            Err(e) => {
                error!("{}", e);
                self.reporter.error(&e.to_string());
                return Err(e);
            }
        };

        self.notify(Some(&interpreter));

        let msg = format!("Activated virtualenv: {}", descriptor.name);
        self.reporter.status(&msg);
        info!("{}", msg);
        Ok(())
    }

    /// Activate the `index`-th environment of a fresh listing
    pub fn activate_index(&mut self, index: usize) -> SwitchResult<()> {
        let environments = self.list_environments();
        let descriptor = environments.get(index).ok_or_else(|| {
            SwitchError::invalid_selection(format!(
                "No environment #{} ({} available)",
                index,
                environments.len()
            ))
        })?;
        self.activate(descriptor)
    }

    /// Activate the first discovered environment named `name`
    pub fn activate_named(&mut self, name: &str) -> SwitchResult<()> {
        let descriptor = self
            .list_environments()
            .into_iter()
            .find(|d| d.name == name)
            .ok_or_else(|| SwitchError::invalid_selection(format!("No environment named '{}'", name)))?;
        self.activate(&descriptor)
    }

    /// Return to the previous environment. Does nothing when none is active.
    pub fn deactivate(&mut self) {
        let Some(deactivation) = self.stack.deactivate() else {
            info!("No virtualenv to deactivate");
            self.reporter.status("No virtualenv to deactivate.");
            return;
        };

        self.notify(deactivation.interpreter.as_deref());

        let msg = match self.stack.current() {
            Some(current) => format!(
                "Deactivated virtualenv: {} (now {})",
                deactivation.popped.display_name(),
                current.display_name()
            ),
            None => format!("Deactivated virtualenv: {}", deactivation.popped.display_name()),
        };
        self.reporter.status(&msg);
        info!("{}", msg);
    }

    /// Re-read the settings file. A file that fails to parse is reported and
    /// the current settings stay in effect.
    pub fn reload_settings(&mut self) {
        let mut reloaded = self.settings.clone();
        match reloaded.reload() {
            Ok(events) => {
                self.settings = reloaded;
                self.apply_settings_events(events);
            }
            Err(e) => {
                warn!("Keeping previous settings: {}", e);
                self.reporter.warning(&e.to_string());
            }
        }
    }

    /// Replace the settings table, as an editor pushing new values would
    pub fn update_settings(&mut self, table: toml::Table) {
        let events = self.settings.apply(table);
        self.apply_settings_events(events);
    }

    /// React to re-validated settings
    pub fn apply_settings_events(&mut self, events: Vec<SettingsEvent>) {
        for event in events {
            match event {
                SettingsEvent::LogLevelChanged(level) => {
                    match self.log_handle.set_level(level) {
                        Ok(()) => info!("Log level changed to: {}", level),
                        Err(e) => warn!("{}", e),
                    }
                }
                SettingsEvent::LspPluginChanged(plugin) => {
                    self.notifier.set_plugin(plugin);
                }
                SettingsEvent::Rejected { key, message } => {
                    let msg = format!("Ignored invalid '{}' setting: {}", key, message);
                    warn!("{}", msg);
                    self.reporter.warning(&msg);
                }
            }
        }
    }

    fn notify(&mut self, interpreter: Option<&Path>) {
        if !self.notifier.notify(interpreter) {
            debug!("No language assistant notified ({})", self.notifier.plugin());
        }
    }

    /// Give back the environment context
    pub fn into_context(self) -> E {
        self.stack.into_context()
    }
}
