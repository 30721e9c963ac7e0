//! Optional notification of a language-assistant plugin.
//!
//! Whether the configured plugin is reachable is probed through a
//! [`PluginRegistry`] the first time a notification is due and cached as a
//! [`Capability`] until the plugin selection changes. Delivery is best
//! effort: failures are logged and never reach the caller.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::LspPlugin;
use crate::error::SwitchResult;

/// LSP method carrying configuration changes
pub const DID_CHANGE_CONFIGURATION: &str = "workspace/didChangeConfiguration";

/// `python` section of the configuration update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PythonSettings {
    /// Interpreter path; `None` when no environment is active
    #[serde(rename = "pythonPath")]
    pub python_path: Option<String>,
}

/// Settings pushed to the language server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationUpdate {
    pub python: PythonSettings,
}

impl ConfigurationUpdate {
    pub fn new(interpreter: Option<&Path>) -> Self {
        Self {
            python: PythonSettings {
                python_path: interpreter.map(|p| p.to_string_lossy().into_owned()),
            },
        }
    }

    /// JSON-RPC notification wrapping this update
    pub fn to_notification(&self) -> SwitchResult<serde_json::Value> {
        Ok(json!({
            "jsonrpc": "2.0",
            "method": DID_CHANGE_CONFIGURATION,
            "params": { "settings": serde_json::to_value(self)? },
        }))
    }

    /// Notification framed with the LSP base-protocol header
    pub fn encode_frame(&self) -> SwitchResult<Vec<u8>> {
        let body = serde_json::to_vec(&self.to_notification()?)?;
        let mut frame = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
        frame.extend_from_slice(&body);
        Ok(frame)
    }
}

/// Delivers configuration updates to a loaded plugin
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink {
    fn send(&mut self, update: &ConfigurationUpdate) -> SwitchResult<()>;
}

/// Finds a loaded plugin, if any
#[cfg_attr(test, mockall::automock)]
pub trait PluginRegistry {
    fn lookup(&self, plugin: LspPlugin) -> Option<Box<dyn NotificationSink>>;
}

/// Whether a plugin can be notified
pub enum Capability {
    Unavailable,
    Available(Box<dyn NotificationSink>),
}

impl Capability {
    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }
}

/// Registry that never finds anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPlugins;

impl PluginRegistry for NoPlugins {
    fn lookup(&self, _plugin: LspPlugin) -> Option<Box<dyn NotificationSink>> {
        None
    }
}

/// Writes base-protocol frames to any byte stream
pub struct FramedSink<W: Write> {
    writer: W,
}

impl<W: Write> FramedSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> NotificationSink for FramedSink<W> {
    fn send(&mut self, update: &ConfigurationUpdate) -> SwitchResult<()> {
        let frame = update.encode_frame()?;
        self.writer.write_all(&frame)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Plugins listening on `<dir>/<plugin-id>.sock`
#[derive(Debug, Clone)]
pub struct SocketRegistry {
    dir: PathBuf,
}

impl SocketRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn socket_path(&self, plugin: LspPlugin) -> PathBuf {
        self.dir.join(format!("{}.sock", plugin.id()))
    }
}

impl PluginRegistry for SocketRegistry {
    #[cfg(unix)]
    fn lookup(&self, plugin: LspPlugin) -> Option<Box<dyn NotificationSink>> {
        use std::os::unix::net::UnixStream;

        if plugin == LspPlugin::None {
            return None;
        }

        let path = self.socket_path(plugin);
        match UnixStream::connect(&path) {
            Ok(stream) => Some(Box::new(FramedSink::new(stream))),
            Err(e) => {
                debug!("Plugin {} not reachable at {}: {}", plugin, path.display(), e);
                None
            }
        }
    }

    #[cfg(not(unix))]
    fn lookup(&self, plugin: LspPlugin) -> Option<Box<dyn NotificationSink>> {
        debug!("Socket endpoints are not supported here, skipping {}", plugin);
        None
    }
}

/// Tells the selected plugin about interpreter changes
pub struct InterpreterNotifier {
    plugin: LspPlugin,
    registry: Box<dyn PluginRegistry>,
    capability: Option<Capability>,
}

impl InterpreterNotifier {
    pub fn new(plugin: LspPlugin, registry: Box<dyn PluginRegistry>) -> Self {
        Self {
            plugin,
            registry,
            capability: None,
        }
    }

    /// Notifier with no plugin selected
    pub fn disabled() -> Self {
        Self::new(LspPlugin::None, Box::new(NoPlugins))
    }

    pub fn plugin(&self) -> LspPlugin {
        self.plugin
    }

    /// Select another plugin; it is probed again on next use
    pub fn set_plugin(&mut self, plugin: LspPlugin) {
        if plugin != self.plugin {
            info!("Language-assistant plugin changed to {}", plugin);
            self.plugin = plugin;
            self.capability = None;
        }
    }

    /// Swap the registry, dropping any cached capability
    pub fn set_registry(&mut self, registry: Box<dyn PluginRegistry>) {
        self.registry = registry;
        self.capability = None;
    }

    fn capability(&mut self) -> &mut Capability {
        let plugin = self.plugin;
        let registry = &self.registry;
        self.capability.get_or_insert_with(|| {
            if plugin == LspPlugin::None {
                return Capability::Unavailable;
            }
            match registry.lookup(plugin) {
                Some(sink) => {
                    debug!("Plugin {} is available", plugin);
                    Capability::Available(sink)
                }
                None => {
                    debug!("Plugin {} is not loaded", plugin);
                    Capability::Unavailable
                }
            }
        })
    }

    /// Probe (once) whether the plugin can be notified
    pub fn is_available(&mut self) -> bool {
        self.capability().is_available()
    }

    /// Send the interpreter path. Returns whether anything was delivered.
    pub fn notify(&mut self, interpreter: Option<&Path>) -> bool {
        let plugin = self.plugin;
        let update = ConfigurationUpdate::new(interpreter);

        let result = match self.capability() {
            Capability::Unavailable => return false,
            Capability::Available(sink) => sink.send(&update),
        };

        match result {
            Ok(()) => {
                debug!("Sent {} to {}: {:?}", DID_CHANGE_CONFIGURATION, plugin, update);
                true
            }
            Err(e) => {
                warn!("Failed to notify {}: {}", plugin, e);
                // A broken endpoint cannot recover; probe again next time
                self.capability = None;
                false
            }
        }
    }
}

impl std::fmt::Debug for InterpreterNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterpreterNotifier")
            .field("plugin", &self.plugin)
            .field(
                "capability",
                &self.capability.as_ref().map(Capability::is_available),
            )
            .finish()
    }
}
