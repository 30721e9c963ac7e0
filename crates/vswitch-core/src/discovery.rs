//! Environment discovery over configured roots and project folders.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Name of the per-project environment directory
pub const PROJECT_VENV: &str = ".venv";

/// A discovered environment: `root_directory/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentDescriptor {
    pub name: String,
    pub root_directory: PathBuf,
}

impl EnvironmentDescriptor {
    pub fn new(name: impl Into<String>, root_directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root_directory: root_directory.into(),
        }
    }

    /// Root of the environment itself
    pub fn venv_path(&self) -> PathBuf {
        self.root_directory.join(&self.name)
    }
}

impl fmt::Display for EnvironmentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.root_directory.display())
    }
}

/// List environments.
///
/// Every immediate subdirectory of each search root comes first, in root
/// order and then by name; afterwards one `.venv` entry per project folder
/// that has one, in folder order. Missing roots contribute nothing. No
/// de-duplication is done.
pub fn list_environments<R, F>(search_roots: R, project_folders: F) -> Vec<EnvironmentDescriptor>
where
    R: IntoIterator,
    R::Item: AsRef<Path>,
    F: IntoIterator,
    F::Item: AsRef<Path>,
{
    let mut environments = Vec::new();

    for root in search_roots {
        let root = root.as_ref();
        match subdirectories(root) {
            Ok(names) => {
                debug!("Found {} environment(s) in {}", names.len(), root.display());
                environments.extend(
                    names
                        .into_iter()
                        .map(|name| EnvironmentDescriptor::new(name, root)),
                );
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Skipping missing directory: {}", root.display());
            }
            Err(e) => {
                warn!("Cannot list {}: {}", root.display(), e);
            }
        }
    }

    for folder in project_folders {
        let folder = folder.as_ref();
        if folder.join(PROJECT_VENV).is_dir() {
            debug!("Found project environment in {}", folder.display());
            environments.push(EnvironmentDescriptor::new(PROJECT_VENV, folder));
        }
    }

    environments
}

fn subdirectories(root: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        // is_dir follows symlinks, so linked environments count
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_roots_then_project_folders() {
        let temp = tempdir().unwrap();
        let r1 = temp.path().join("r1");
        fs::create_dir_all(r1.join("b")).unwrap();
        fs::create_dir_all(r1.join("a")).unwrap();
        fs::write(r1.join("notes.txt"), "not an env").unwrap();
        let r2 = temp.path().join("missing");
        let project = temp.path().join("project");
        fs::create_dir_all(project.join(".venv")).unwrap();

        let found = list_environments([&r1, &r2], [&project]);
        assert_eq!(
            found,
            vec![
                EnvironmentDescriptor::new("a", &r1),
                EnvironmentDescriptor::new("b", &r1),
                EnvironmentDescriptor::new(".venv", &project),
            ]
        );
    }

    #[test]
    fn test_no_deduplication() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("env")).unwrap();

        let found = list_environments([temp.path(), temp.path()], Vec::<PathBuf>::new());
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], found[1]);
    }

    #[test]
    fn test_project_without_venv() {
        let temp = tempdir().unwrap();
        let found = list_environments(Vec::<PathBuf>::new(), [temp.path()]);
        assert!(found.is_empty());
    }

    #[test]
    fn test_descriptor_paths() {
        let descriptor = EnvironmentDescriptor::new("myenv", "/envs");
        assert_eq!(descriptor.venv_path(), PathBuf::from("/envs/myenv"));
        assert_eq!(descriptor.to_string(), "myenv@/envs");
    }
}
