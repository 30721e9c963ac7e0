use anyhow::Result;
use tracing::debug;
use vswitch_core::MemoryEnvironment;

use super::{print_activation_script, CommandContext};

/// Execute the deactivate command: print a script for `eval`
pub fn execute(ctx: &CommandContext) -> Result<()> {
    debug!("Deactivating environment");

    let mut manager = ctx.manager(MemoryEnvironment::from_process());
    manager.deactivate();

    print_activation_script(&manager, ctx.shell)
}
