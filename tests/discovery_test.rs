use std::fs;
use std::path::PathBuf;

use tempfile::tempdir;
use vswitch::core::{list_environments, EnvironmentDescriptor, Settings};

#[test]
fn test_discovery_order() {
    let temp = tempdir().unwrap();
    let r1 = temp.path().join("r1");
    let r2 = temp.path().join("r2");
    let folder = temp.path().join("project");
    fs::create_dir_all(r1.join("a")).unwrap();
    fs::create_dir_all(r1.join("b")).unwrap();
    fs::create_dir_all(folder.join(".venv")).unwrap();

    let found = list_environments([&r1, &r2], [&folder]);

    assert_eq!(
        found,
        vec![
            EnvironmentDescriptor::new("a", &r1),
            EnvironmentDescriptor::new("b", &r1),
            EnvironmentDescriptor::new(".venv", &folder),
        ]
    );
}

#[test]
fn test_discovery_from_settings() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("envs");
    fs::create_dir_all(root.join("tools")).unwrap();

    let settings_path = temp.path().join("settings (linux).toml");
    fs::write(
        &settings_path,
        format!(
            "environment_directories = [{:?}, false, {:?}]\n",
            root.display().to_string(),
            temp.path().join("nowhere").display().to_string()
        ),
    )
    .unwrap();

    let (settings, _) = Settings::from_file(&settings_path).unwrap();
    let roots = settings.environment_directories();
    assert_eq!(roots.roots.len(), 2);
    assert_eq!(roots.warnings.len(), 1);

    let found = list_environments(&roots.roots, Vec::<PathBuf>::new());
    assert_eq!(found, vec![EnvironmentDescriptor::new("tools", &root)]);
}
