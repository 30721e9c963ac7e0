use console::style;
use std::fmt::Display;

use vswitch_core::host::Reporter;

/// Console output for humans. Everything goes to stderr so stdout stays
/// free for shell scripts meant for `eval`.
#[derive(Debug, Clone)]
pub struct Logger {
    no_color: bool,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    pub fn new() -> Self {
        Self {
            no_color: std::env::var("NO_COLOR").is_ok()
                || std::env::var("CLICOLOR").map(|v| v == "0").unwrap_or(false)
                || std::env::var("CLICOLOR_FORCE").map(|v| v == "0").unwrap_or(false),
        }
    }

    /// Logger that never emits escape codes
    pub fn plain() -> Self {
        Self { no_color: true }
    }

    fn style_bold(&self, text: impl Display) -> String {
        if self.no_color {
            text.to_string()
        } else {
            style(text.to_string()).bold().to_string()
        }
    }

    pub fn header(&self, text: &str) {
        eprintln!("\n{}\n", self.style_bold(text));
    }

    pub fn info(&self, label: &str, value: impl Display) {
        eprintln!("{}: {}", self.style_bold(label), value);
    }

    pub fn success(&self, text: impl Display) {
        if self.no_color {
            eprintln!("✓ {}", text);
        } else {
            eprintln!("{} {}", style("✓").green().bold(), text);
        }
    }

    pub fn warning(&self, text: impl Display) {
        if self.no_color {
            eprintln!("WARNING: {}", text);
        } else {
            eprintln!("{} {}", style("WARNING:").yellow().bold(), text);
        }
    }

    pub fn error(&self, text: impl Display) {
        if self.no_color {
            eprintln!("ERROR: {}", text);
        } else {
            eprintln!("{} {}", style("ERROR:").red().bold(), text);
        }
    }
}

impl Reporter for Logger {
    fn status(&self, message: &str) {
        self.success(message);
    }

    fn warning(&self, message: &str) {
        Logger::warning(self, message);
    }

    fn error(&self, message: &str) {
        Logger::error(self, message);
    }
}
