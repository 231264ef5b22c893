use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("no file matching '{key}' under {}", root.display())]
    NotFound { key: String, root: PathBuf },
    #[error(
        "'{key}' matches {} files under {}: {}",
        candidates.len(),
        root.display(),
        candidates.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
    )]
    Ambiguous {
        key: String,
        root: PathBuf,
        candidates: Vec<PathBuf>,
    },
}

/// Splits an analyzer path on both separator styles into a relative path.
fn key_to_relative(key: &str) -> PathBuf {
    key.split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .collect()
}

/// Directories never searched when matching a path suffix.
fn is_skipped_dir(name: &str) -> bool {
    name.starts_with('.') || name == "build"
}

/// Finds the file on disk that a [`LocationIndex`](crate::e_locations::LocationIndex)
/// key refers to.
///
/// The key is tried relative to `package_root`, then with a leading package
/// folder name removed (the analyzer reports `my_app/lib/a.dart` when run from
/// the parent directory). Otherwise the package is searched for files whose
/// trailing components equal the key; exactly one must match.
pub fn resolve_document(package_root: &Path, key: &str) -> Result<PathBuf, WorkspaceError> {
    let relative = key_to_relative(key);
    if relative.as_os_str().is_empty() {
        return Err(WorkspaceError::NotFound {
            key: key.to_string(),
            root: package_root.to_path_buf(),
        });
    }

    let direct = package_root.join(&relative);
    if direct.is_file() {
        return Ok(direct);
    }
    if let Some(folder) = package_root.file_name() {
        if let Ok(inside) = relative.strip_prefix(folder) {
            let direct = package_root.join(inside);
            if !inside.as_os_str().is_empty() && direct.is_file() {
                return Ok(direct);
            }
        }
    }

    let mut candidates: Vec<PathBuf> = WalkDir::new(package_root)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !is_skipped_dir(&entry.file_name().to_string_lossy())
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.path().ends_with(&relative))
        .map(|entry| entry.into_path())
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => Err(WorkspaceError::NotFound {
            key: key.to_string(),
            root: package_root.to_path_buf(),
        }),
        1 => {
            let found = candidates.remove(0);
            debug!("resolved '{}' to {}", key, found.display());
            Ok(found)
        }
        _ => Err(WorkspaceError::Ambiguous {
            key: key.to_string(),
            root: package_root.to_path_buf(),
            candidates,
        }),
    }
}
