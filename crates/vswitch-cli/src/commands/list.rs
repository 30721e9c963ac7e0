use anyhow::Result;
use tracing::debug;
use vswitch_core::{context::EnvironmentContext, EnvironmentManager, MemoryEnvironment};

use super::CommandContext;
use crate::output::format_environment;

/// Execute the list command
pub fn execute(ctx: &CommandContext) -> Result<()> {
    debug!("Scanning for environments");
    let manager = ctx.manager(MemoryEnvironment::from_process());
    print_environments(&manager, ctx);
    Ok(())
}

/// Print the current listing, marking the active environment
pub fn print_environments<E: EnvironmentContext>(manager: &EnvironmentManager<E>, ctx: &CommandContext) {
    let environments = manager.list_environments();
    if environments.is_empty() {
        ctx.logger
            .warning("No virtual environments found. Run 'vswitch settings' to configure environment_directories.");
        return;
    }

    let active = manager.current().map(|r| r.virtual_env_path.clone());
    println!("Available environments:");
    for (index, env) in environments.iter().enumerate() {
        let is_active = active.as_ref() == Some(&env.venv_path());
        println!("{}", format_environment(index, env, is_active));
    }
    debug!("Found {} environment(s)", environments.len());
}
