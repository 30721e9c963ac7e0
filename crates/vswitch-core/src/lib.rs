//! Core types for the vswitch Python environment switcher.
//!
//! The [`EnvironmentManager`] keeps a stack of activated virtual
//! environments, edits `PATH` and `VIRTUAL_ENV` through an
//! [`EnvironmentContext`], and tells an optional language-assistant plugin
//! which interpreter is now active.

pub mod config;
pub mod context;
pub mod discovery;
pub mod error;
pub mod host;
pub mod logging;
pub mod manager;
pub mod notify;
pub mod stack;

// Re-export commonly used types
pub use crate::config::{LogLevel, LspPlugin, Settings, SettingsEvent};
pub use crate::context::{
    EnvironmentContext, MemoryEnvironment, ProcessEnvironment, PATH, STACK_STATE, VIRTUAL_ENV,
};
pub use crate::discovery::{list_environments, EnvironmentDescriptor};
pub use crate::error::{SwitchError, SwitchResult};
pub use crate::host::{NullReporter, Reporter};
pub use crate::manager::EnvironmentManager;
pub use crate::notify::{Capability, ConfigurationUpdate, InterpreterNotifier, NotificationSink, PluginRegistry};
pub use crate::stack::{ActivationRecord, ActivationStack, Deactivation};
