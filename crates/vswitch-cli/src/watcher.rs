use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

/// Watches the settings file. Events are queued by the watcher thread and
/// only inspected when [`SettingsWatcher::changed`] is called, so settings
/// are re-applied on the command thread.
pub struct SettingsWatcher {
    _watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
    path: PathBuf,
}

impl SettingsWatcher {
    /// Watch `path`. Its parent directory is watched so the file may be
    /// created later or replaced by an editor.
    pub fn new(path: &Path) -> Result<Self> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let (tx, events) = channel();
        let mut watcher = notify::recommended_watcher(tx).context("Failed to create watcher")?;
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;

        debug!("Watching settings file {}", path.display());
        Ok(Self {
            _watcher: watcher,
            events,
            path: path.to_path_buf(),
        })
    }

    /// Drain queued events; true if any touched the settings file
    pub fn changed(&self) -> bool {
        let mut changed = false;
        while let Ok(result) = self.events.try_recv() {
            match result {
                Ok(event) if is_relevant(&event, &self.path) => changed = true,
                Ok(_) => {}
                Err(e) => warn!("Settings watch error: {}", e),
            }
        }
        changed
    }
}

fn is_relevant(event: &Event, path: &Path) -> bool {
    let touches_file = event
        .paths
        .iter()
        .any(|p| p.file_name().is_some() && p.file_name() == path.file_name());
    touches_file
        && matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};

    #[test]
    fn test_only_settings_file_is_relevant() {
        let settings = Path::new("/cfg/vswitch/settings (linux).toml");

        let hit = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/cfg/vswitch/settings (linux).toml"));
        assert!(is_relevant(&hit, settings));

        let other = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/cfg/vswitch/notes.txt"));
        assert!(!is_relevant(&other, settings));

        let access = Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("/cfg/vswitch/settings (linux).toml"));
        assert!(!is_relevant(&access, settings));
    }
}
