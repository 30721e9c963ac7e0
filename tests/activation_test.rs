#![cfg(unix)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use proptest::prelude::*;
use tempfile::{tempdir, TempDir};
use vswitch::core::{
    ActivationStack, ConfigurationUpdate, EnvironmentContext, EnvironmentDescriptor,
    EnvironmentManager, LspPlugin, MemoryEnvironment, NotificationSink, NullReporter,
    PluginRegistry, Settings, SwitchResult, PATH, VIRTUAL_ENV,
};

type Sent = Rc<RefCell<Vec<ConfigurationUpdate>>>;

struct RecordingSink(Sent);

impl NotificationSink for RecordingSink {
    fn send(&mut self, update: &ConfigurationUpdate) -> SwitchResult<()> {
        self.0.borrow_mut().push(update.clone());
        Ok(())
    }
}

struct RecordingRegistry(Sent);

impl PluginRegistry for RecordingRegistry {
    fn lookup(&self, _plugin: LspPlugin) -> Option<Box<dyn NotificationSink>> {
        Some(Box::new(RecordingSink(self.0.clone())))
    }
}

fn make_envs(names: &[&str]) -> TempDir {
    let temp = tempdir().unwrap();
    for name in names {
        fs::create_dir_all(temp.path().join(name).join("bin")).unwrap();
    }
    temp
}

fn build_manager(root: &Path, plugin: &str, sent: &Sent) -> EnvironmentManager<MemoryEnvironment> {
    let (settings, _) = Settings::from_toml(&format!(
        "environment_directories = [{:?}]\nLSP_plugin = {:?}",
        root.display().to_string(),
        plugin
    ))
    .unwrap();
    EnvironmentManager::new(
        settings,
        MemoryEnvironment::new().with_var(PATH, "/usr/local/bin:/usr/bin"),
        Box::new(NullReporter),
    )
    .with_registry(Box::new(RecordingRegistry(sent.clone())))
}

fn python_paths(sent: &Sent) -> Vec<Option<String>> {
    sent.borrow().iter().map(|u| u.python.python_path.clone()).collect()
}

#[test]
fn test_activate_example() {
    let envs = make_envs(&["myenv"]);
    let sent = Sent::default();
    let mut manager = build_manager(envs.path(), "LSP-pyright", &sent);

    manager
        .activate(&EnvironmentDescriptor::new("myenv", envs.path()))
        .unwrap();

    let venv = envs.path().join("myenv");
    assert_eq!(manager.context().var(VIRTUAL_ENV), Some(venv.to_string_lossy().into_owned()));
    assert_eq!(manager.context().search_path()[0], venv.join("bin"));
    assert_eq!(
        python_paths(&sent),
        vec![Some(venv.join("bin").join("python").to_string_lossy().into_owned())]
    );
}

#[test]
fn test_switch_and_back_notifies_each_step() {
    let envs = make_envs(&["a", "b"]);
    let sent = Sent::default();
    let mut manager = build_manager(envs.path(), "LSP-basedpyright", &sent);

    manager.activate_named("a").unwrap();
    manager.activate_named("b").unwrap();
    manager.deactivate();

    let a_bin = envs.path().join("a").join("bin");
    let b_bin = envs.path().join("b").join("bin");
    let path = manager.context().search_path();
    assert_eq!(path[0], a_bin);
    assert!(!path.contains(&b_bin));
    assert_eq!(
        manager.context().var(VIRTUAL_ENV),
        Some(envs.path().join("a").to_string_lossy().into_owned())
    );

    manager.deactivate();
    assert_eq!(manager.context().var(VIRTUAL_ENV), None);

    let python = |bin: &PathBuf| Some(bin.join("python").to_string_lossy().into_owned());
    assert_eq!(
        python_paths(&sent),
        vec![python(&a_bin), python(&b_bin), python(&a_bin), None]
    );
}

#[test]
fn test_no_plugin_configured_sends_nothing() {
    let envs = make_envs(&["a"]);
    let sent = Sent::default();
    let mut manager = build_manager(envs.path(), "none", &sent);

    manager.activate_named("a").unwrap();
    manager.deactivate();

    assert!(sent.borrow().is_empty());
}

#[test]
fn test_plugin_selected_later_is_notified() {
    let envs = make_envs(&["a"]);
    let sent = Sent::default();
    let mut manager = build_manager(envs.path(), "none", &sent);

    manager.activate_named("a").unwrap();
    manager.update_settings(toml::from_str(r#"LSP_plugin = "LSP-pyright""#).unwrap());
    manager.deactivate();

    assert_eq!(python_paths(&sent), vec![None]);
}

#[test]
fn test_repeated_activation_keeps_single_path_entry() {
    let envs = make_envs(&["a"]);
    let sent = Sent::default();
    let mut manager = build_manager(envs.path(), "none", &sent);

    manager.activate_named("a").unwrap();
    manager.activate_named("a").unwrap();

    let bin = envs.path().join("a").join("bin");
    let path = manager.context().search_path();
    assert_eq!(path.iter().filter(|p| **p == bin).count(), 1);
    assert_eq!(manager.stack().len(), 2);
}

proptest! {
    #[test]
    fn prop_activations_unwind_to_start(
        picks in prop::collection::vec(0usize..4, 1..8),
        adopted in any::<bool>(),
    ) {
        let mut picks = picks;
        // re-activating the current environment releases its entry, so only
        // sequences without immediate repeats unwind exactly
        picks.dedup();

        let names = ["w", "x", "y", "z"];
        let envs = make_envs(&names);
        let mut start = MemoryEnvironment::new().with_var(PATH, "/usr/bin:/bin");
        if adopted {
            start = start.with_var(VIRTUAL_ENV, "/opt/outer");
        }

        let mut stack = ActivationStack::new(start.clone());
        for &pick in &picks {
            stack
                .activate(&EnvironmentDescriptor::new(names[pick], envs.path()))
                .unwrap();
            let top = stack.current().unwrap().virtual_env_path.to_string_lossy().into_owned();
            prop_assert_eq!(stack.context().var(VIRTUAL_ENV), Some(top));
        }
        for _ in &picks {
            prop_assert!(stack.deactivate().is_some());
        }

        prop_assert_eq!(stack.context(), &start);
    }
}
