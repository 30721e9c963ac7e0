use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tracing::debug;
use vswitch_core::{discovery::EnvironmentDescriptor, MemoryEnvironment};

use super::{print_activation_script, select_environment, settings, CommandContext};
use crate::Reported;

/// Execute the activate command: print a script for `eval`
pub fn execute(name: Option<String>, root: Option<PathBuf>, ctx: &CommandContext) -> Result<()> {
    let mut manager = ctx.manager(MemoryEnvironment::from_process());
    let environments = manager.list_environments();

    if environments.is_empty() {
        ctx.logger.warning("No virtual environments found.");
        // stdout may be captured by eval, so never start an editor here
        return settings::open(ctx, false);
    }

    let descriptor = match name {
        Some(name) => find_environment(&environments, &name, root.as_deref())?.clone(),
        None => match select_environment(&environments)? {
            Some(index) => environments[index].clone(),
            None => {
                debug!("Selection cancelled");
                return Ok(());
            }
        },
    };

    manager.activate(&descriptor).map_err(|_| Reported)?;
    print_activation_script(&manager, ctx.shell)
}

/// First environment called `name`, optionally restricted to one root
pub fn find_environment<'a>(
    environments: &'a [EnvironmentDescriptor],
    name: &str,
    root: Option<&std::path::Path>,
) -> Result<&'a EnvironmentDescriptor> {
    environments
        .iter()
        .find(|env| env.name == name && root.map_or(true, |r| env.root_directory == r))
        .ok_or_else(|| anyhow!("No environment named '{}'", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_find_environment_by_root() {
        let environments = vec![
            EnvironmentDescriptor::new("dev", "/a"),
            EnvironmentDescriptor::new("dev", "/b"),
        ];

        assert_eq!(find_environment(&environments, "dev", None).unwrap().root_directory, Path::new("/a"));
        assert_eq!(
            find_environment(&environments, "dev", Some(Path::new("/b"))).unwrap().root_directory,
            Path::new("/b")
        );
        assert!(find_environment(&environments, "prod", None).is_err());
    }
}
