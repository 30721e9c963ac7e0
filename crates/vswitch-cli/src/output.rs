//! Output formatting utilities for CLI

use console::style;
use vswitch_core::discovery::EnvironmentDescriptor;
use vswitch_core::stack::ActivationRecord;

mod logger;

pub use logger::Logger;

/// Format a discovered environment for a listing
pub fn format_environment(index: usize, env: &EnvironmentDescriptor, active: bool) -> String {
    let marker = if active { "*" } else { " " };
    format!(
        "{} {:>2}  {}  {}",
        marker,
        index,
        style(&env.name).green(),
        style(env.root_directory.display()).dim()
    )
}

/// Label shown in the interactive picker
pub fn selection_label(env: &EnvironmentDescriptor) -> String {
    format!("{}  ({})", env.name, env.root_directory.display())
}

/// Format one activation stack entry, top first
pub fn format_record(depth: usize, record: &ActivationRecord) -> String {
    let name = match &record.name {
        Some(name) => style(name.clone()).green().to_string(),
        None => style(format!("{} (adopted)", record.display_name())).yellow().to_string(),
    };
    format!("{:>2}  {}  {}", depth, name, style(record.virtual_env_path.display()).dim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_environment() {
        let env = EnvironmentDescriptor::new("myenv", "/envs");
        let line = format_environment(3, &env, true);
        assert!(line.starts_with('*'));
        assert!(line.contains("myenv"));
        assert!(line.contains("/envs"));
    }

    #[test]
    fn test_format_adopted_record() {
        let record = ActivationRecord {
            name: None,
            virtual_env_path: PathBuf::from("/opt/outer"),
            added_path_entry: None,
        };
        assert!(format_record(0, &record).contains("outer (adopted)"));
    }
}
