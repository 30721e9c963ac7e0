//! CLI command implementations

use std::path::PathBuf;

use anyhow::{bail, Result};
use console::Term;
use dialoguer::Select;
use vswitch_core::{
    config::Settings, context::EnvironmentContext, discovery::EnvironmentDescriptor,
    logging::LogHandle, EnvironmentManager, SettingsEvent,
};

use crate::output::{selection_label, Logger};
use crate::shell::Shell;

pub mod activate;
pub mod deactivate;
pub mod list;
pub mod session;
pub mod settings;

// Export command functions with clear names
pub use activate::execute as execute_activate;
pub use deactivate::execute as execute_deactivate;
pub use list::execute as execute_list;
pub use session::execute as execute_session;
pub use settings::execute as execute_settings;

/// Everything a command needs besides its own arguments
pub struct CommandContext {
    pub settings: Settings,
    /// Events from the initial settings load, replayed into each manager
    pub events: Vec<SettingsEvent>,
    pub project_folders: Vec<PathBuf>,
    pub log_handle: LogHandle,
    pub logger: Logger,
    pub shell: Shell,
}

impl CommandContext {
    /// Build a manager over `context`
    pub fn manager<E: EnvironmentContext>(&self, context: E) -> EnvironmentManager<E> {
        let mut manager =
            EnvironmentManager::new(self.settings.clone(), context, Box::new(self.logger.clone()))
                .with_log_handle(self.log_handle.clone())
                .with_project_folders(self.project_folders.clone());
        manager.apply_settings_events(self.events.clone());
        manager
    }
}

/// Print the script that moves the calling shell to the manager's state
pub fn print_activation_script<E: EnvironmentContext>(manager: &EnvironmentManager<E>, shell: Shell) -> Result<()> {
    let state = manager.stack().saved_state()?;
    println!("{}", shell.activation_script(manager.context(), state.as_deref()));
    Ok(())
}

/// Let the user pick an environment. `None` when cancelled.
pub fn select_environment(environments: &[EnvironmentDescriptor]) -> Result<Option<usize>> {
    let term = Term::stderr();
    if !term.is_term() {
        bail!("No environment given and no terminal to choose one on");
    }

    let labels: Vec<String> = environments.iter().map(selection_label).collect();
    let choice = Select::new()
        .with_prompt("Select a virtualenv to activate")
        .items(&labels)
        .default(0)
        .interact_on_opt(&term)?;
    Ok(choice)
}
