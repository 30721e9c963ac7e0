use std::env;

use clap::ValueEnum;
use vswitch_core::context::{EnvironmentContext, PATH, STACK_STATE, VIRTUAL_ENV};

/// Shell dialect used for generated scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}

impl Shell {
    /// Guess from `$SHELL`, defaulting to bash
    pub fn detect() -> Self {
        let shell_path = env::var("SHELL").unwrap_or_default();
        Self::from_program(&shell_path).unwrap_or(Shell::Bash)
    }

    pub fn from_program(program: &str) -> Option<Self> {
        let name = program.rsplit(['/', '\\']).next().unwrap_or("");
        match name.trim_end_matches(".exe") {
            "bash" | "sh" => Some(Shell::Bash),
            "zsh" => Some(Shell::Zsh),
            "fish" => Some(Shell::Fish),
            "pwsh" | "powershell" => Some(Shell::PowerShell),
            _ => None,
        }
    }

    fn quote(&self, value: &str) -> String {
        match self {
            Shell::Bash | Shell::Zsh => format!("'{}'", value.replace('\'', r"'\''")),
            Shell::Fish => format!("'{}'", value.replace('\\', r"\\").replace('\'', r"\'")),
            Shell::PowerShell => format!("'{}'", value.replace('\'', "''")),
        }
    }

    fn export(&self, key: &str, value: Option<&str>) -> String {
        match (self, value) {
            (Shell::Bash | Shell::Zsh, Some(value)) => format!("export {}={}", key, self.quote(value)),
            (Shell::Bash | Shell::Zsh, None) => format!("unset {}", key),
            (Shell::Fish, Some(value)) => format!("set -gx {} {}", key, self.quote(value)),
            (Shell::Fish, None) => format!("set -e {}", key),
            (Shell::PowerShell, Some(value)) => format!("$env:{} = {}", key, self.quote(value)),
            (Shell::PowerShell, None) => {
                format!("Remove-Item Env:{} -ErrorAction SilentlyContinue", key)
            }
        }
    }

    /// Script that makes the calling shell match `context` for the managed
    /// variables and carries `stack_state` to the next invocation.
    pub fn activation_script<E: EnvironmentContext>(&self, context: &E, stack_state: Option<&str>) -> String {
        let mut lines = vec![
            self.export(VIRTUAL_ENV, context.var(VIRTUAL_ENV).as_deref()),
            self.path_export(context),
            self.export(STACK_STATE, stack_state),
        ];

        // bash and zsh cache command lookups; forget them so the new PATH wins
        if matches!(self, Shell::Bash | Shell::Zsh) {
            lines.push("hash -r 2>/dev/null".to_string());
        }

        lines.join("\n")
    }

    fn path_export<E: EnvironmentContext>(&self, context: &E) -> String {
        match (self, context.var(PATH)) {
            (Shell::Fish, Some(_)) => {
                let entries: Vec<String> = context
                    .search_path()
                    .iter()
                    .map(|p| self.quote(&p.to_string_lossy()))
                    .collect();
                format!("set -gx {} {}", PATH, entries.join(" "))
            }
            (_, value) => self.export(PATH, value.as_deref()),
        }
    }
}
