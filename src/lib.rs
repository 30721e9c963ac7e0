//! vswitch: switch the active Python virtual environment.
//!
//! Keeps a stack of activated environments, edits `PATH` and `VIRTUAL_ENV`
//! to match, and tells an optional language server about the interpreter.

pub use vswitch_cli as cli;
pub use vswitch_core as core;

/// Version of vswitch
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
