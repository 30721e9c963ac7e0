use std::io::{self, BufRead, Write};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use vswitch_core::{EnvironmentManager, MemoryEnvironment, SwitchError, STACK_STATE};

use super::{list::print_environments, select_environment, settings, CommandContext};
use crate::output::format_record;
use crate::watcher::SettingsWatcher;

const HELP: &str = "\
Commands:
  list                 list discovered environments
  activate [N|NAME]    activate by index, by name, or pick interactively
  deactivate           return to the previous environment
  status               show the activation stack
  run CMD [ARGS...]    run a command inside the active environment
  reload               re-read the settings file
  settings             open the settings file
  help                 show this help
  quit                 leave the session";

/// Which environment `activate` refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Index(usize),
    Name(String),
}

/// One line typed into the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Empty,
    List,
    Activate(Option<Selector>),
    Deactivate,
    Status,
    Run(Vec<String>),
    Reload,
    Settings,
    Help,
    Quit,
}

impl SessionCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(SessionCommand::Empty);
        };
        let rest: Vec<String> = words.map(str::to_string).collect();

        let command = match command {
            "list" | "ls" => SessionCommand::List,
            "activate" | "a" => match rest.as_slice() {
                [] => SessionCommand::Activate(None),
                [arg] => SessionCommand::Activate(Some(match arg.parse::<usize>() {
                    Ok(index) => Selector::Index(index),
                    Err(_) => Selector::Name(arg.clone()),
                })),
                _ => return Err("activate takes at most one argument".to_string()),
            },
            "deactivate" | "d" => SessionCommand::Deactivate,
            "status" => SessionCommand::Status,
            "run" => {
                if rest.is_empty() {
                    return Err("run needs a command".to_string());
                }
                return Ok(SessionCommand::Run(rest));
            }
            "reload" => SessionCommand::Reload,
            "settings" => SessionCommand::Settings,
            "help" | "?" => SessionCommand::Help,
            "quit" | "exit" | "q" => SessionCommand::Quit,
            other => return Err(format!("Unknown command '{}', try 'help'", other)),
        };

        if !rest.is_empty() && !matches!(command, SessionCommand::Activate(_)) {
            return Err(format!("'{}' takes no arguments", line.trim()));
        }
        Ok(command)
    }
}

/// Execute the session command: one manager for the whole process, driven
/// by commands read from stdin
pub fn execute(ctx: &CommandContext) -> Result<()> {
    let mut manager = ctx.manager(MemoryEnvironment::from_process());

    let watcher = ctx.settings.path().and_then(|path| match SettingsWatcher::new(path) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            warn!("Settings changes will need 'reload': {:#}", e);
            None
        }
    });

    ctx.logger.header("vswitch session, type 'help' for commands");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        eprint!("vswitch> ");
        io::stderr().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        if watcher.as_ref().is_some_and(SettingsWatcher::changed) {
            debug!("Settings file changed");
            manager.reload_settings();
        }

        match SessionCommand::parse(&line) {
            Ok(SessionCommand::Quit) => break,
            Ok(command) => {
                // only reading stdin may end the session
                if let Err(e) = dispatch(&mut manager, command, ctx) {
                    ctx.logger.error(format!("{:#}", e));
                }
            }
            Err(msg) => ctx.logger.error(msg),
        }
    }

    Ok(())
}

fn dispatch(
    manager: &mut EnvironmentManager<MemoryEnvironment>,
    command: SessionCommand,
    ctx: &CommandContext,
) -> Result<()> {
    match command {
        SessionCommand::Empty | SessionCommand::Quit => {}
        SessionCommand::List => print_environments(manager, ctx),
        SessionCommand::Activate(selector) => {
            let result = match selector {
                Some(Selector::Index(index)) => manager.activate_index(index),
                Some(Selector::Name(name)) => manager.activate_named(&name),
                None => {
                    let environments = manager.list_environments();
                    if environments.is_empty() {
                        ctx.logger.warning("No virtual environments found.");
                        return settings::open(ctx, true);
                    }
                    match select_environment(&environments)? {
                        Some(index) => manager.activate(&environments[index]),
                        None => Ok(()),
                    }
                }
            };
            match result {
                // already shown by the manager
                Err(SwitchError::NotFound(_)) => {}
                Err(e) => ctx.logger.error(e),
                Ok(()) => {}
            }
        }
        SessionCommand::Deactivate => manager.deactivate(),
        SessionCommand::Status => print_status(manager, ctx),
        SessionCommand::Run(argv) => run_command(manager, &argv, ctx)?,
        SessionCommand::Reload => {
            manager.reload_settings();
            ctx.logger.success("Settings reloaded");
        }
        SessionCommand::Settings => settings::open(ctx, true)?,
        SessionCommand::Help => eprintln!("{}", HELP),
    }
    Ok(())
}

fn print_status(manager: &EnvironmentManager<MemoryEnvironment>, ctx: &CommandContext) {
    let records = manager.stack().records();
    if records.is_empty() {
        ctx.logger.info("Active", "none");
        return;
    }

    for (depth, record) in records.iter().rev().enumerate() {
        eprintln!("{}", format_record(depth, record));
    }
    if let Some(current) = manager.current() {
        ctx.logger.info("Interpreter", current.interpreter_path().display());
    }
    ctx.logger.info("Language assistant", manager.settings().lsp_plugin());
}

fn run_command(
    manager: &EnvironmentManager<MemoryEnvironment>,
    argv: &[String],
    ctx: &CommandContext,
) -> Result<()> {
    let (program, args) = argv.split_first().context("empty command")?;
    debug!("Running {:?} in managed environment", argv);

    let mut command = Command::new(program);
    command.args(args).env_clear().envs(manager.context().vars());
    match manager.stack().saved_state()? {
        Some(state) => command.env(STACK_STATE, state),
        None => command.env_remove(STACK_STATE),
    };

    let status = command.status();

    match status {
        Ok(status) if status.success() => {}
        Ok(status) => ctx.logger.warning(format!("'{}' exited with {}", program, status)),
        Err(e) => ctx.logger.error(format!("Failed to run '{}': {}", program, e)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(SessionCommand::parse("  "), Ok(SessionCommand::Empty));
        assert_eq!(SessionCommand::parse("list\n"), Ok(SessionCommand::List));
        assert_eq!(SessionCommand::parse("activate"), Ok(SessionCommand::Activate(None)));
        assert_eq!(
            SessionCommand::parse("activate 2"),
            Ok(SessionCommand::Activate(Some(Selector::Index(2))))
        );
        assert_eq!(
            SessionCommand::parse("a myenv"),
            Ok(SessionCommand::Activate(Some(Selector::Name("myenv".to_string()))))
        );
        assert_eq!(
            SessionCommand::parse("run python -V"),
            Ok(SessionCommand::Run(vec!["python".to_string(), "-V".to_string()]))
        );
        assert_eq!(SessionCommand::parse("exit"), Ok(SessionCommand::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(SessionCommand::parse("run").is_err());
        assert!(SessionCommand::parse("activate a b").is_err());
        assert!(SessionCommand::parse("deactivate now").is_err());
        assert!(SessionCommand::parse("frobnicate").is_err());
    }
}
