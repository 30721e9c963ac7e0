use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};
use vswitch_core::config::DEFAULT_SETTINGS;

use super::CommandContext;

/// Execute the settings command
pub fn execute(ctx: &CommandContext) -> Result<()> {
    open(ctx, true)
}

/// Create the settings file if needed, then open it in the user's editor
/// (or just point at it)
pub fn open(ctx: &CommandContext, launch_editor: bool) -> Result<()> {
    let Some(path) = ctx.settings.path() else {
        bail!("No settings file configured");
    };

    if ensure_settings_file(path)? {
        ctx.logger.success(format!("Created {}", path.display()));
    }

    match editor().filter(|_| launch_editor) {
        Some(editor) => {
            let mut parts = editor.split_whitespace();
            let program = parts.next().unwrap_or_default();
            debug!("Opening settings with {}", program);
            let status = Command::new(program)
                .args(parts)
                .arg(path)
                .status()
                .with_context(|| format!("Failed to start editor '{}'", program))?;
            if !status.success() {
                warn!("Editor exited with {}", status);
            }
        }
        None => ctx.logger.info("Settings file", path.display()),
    }

    Ok(())
}

/// Write the default settings unless the file exists. Returns whether it
/// was created.
pub fn ensure_settings_file(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, DEFAULT_SETTINGS)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

fn editor() -> Option<String> {
    ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_settings_file_only_once() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested").join("settings (linux).toml");

        assert!(ensure_settings_file(&path).unwrap());
        std::fs::write(&path, "log_level = \"DEBUG\"\n").unwrap();
        assert!(!ensure_settings_file(&path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "log_level = \"DEBUG\"\n");
    }
}
