use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub const PUBSPEC_FILE_NAME: &str = "pubspec.yaml";

/// The Dart package that owns the files being fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub project_root: PathBuf,
    pub project_name: String,
}

#[derive(Debug, Error)]
pub enum PubspecError {
    #[error("no pubspec.yaml found in {} or any parent directory", start.display())]
    NotFound { start: PathBuf },
    #[error(
        "expected to find a single pubspec.yaml file above {}, {} found",
        start.display(),
        found
    )]
    NotUnique { start: PathBuf, found: usize },
    #[error(
        "expected to find a single line starting with 'name:' in {}, {} found",
        path.display(),
        found
    )]
    NameLine { path: PathBuf, found: usize },
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Returns every directory from `start` upward that holds a `pubspec.yaml`,
/// nearest first. `start` may be a file or a directory.
pub fn find_pubspecs_above(start: &Path) -> Result<Vec<PathBuf>, PubspecError> {
    let mut dir = fs::canonicalize(start).map_err(|source| PubspecError::Io {
        path: start.to_path_buf(),
        source,
    })?;
    if dir.is_file() {
        dir.pop();
    }

    let mut found = Vec::new();
    loop {
        let candidate = dir.join(PUBSPEC_FILE_NAME);
        if candidate.is_file() {
            debug!("found {}", candidate.display());
            found.push(candidate);
        }
        // Stop if we cannot go any higher.
        if !dir.pop() {
            break;
        }
    }
    Ok(found)
}

/// Locates the single package that contains `start`.
///
/// Nested packages (a package inside another package's directory) are
/// ambiguous and rejected.
pub fn locate_package(start: &Path) -> Result<PackageInfo, PubspecError> {
    let pubspecs = find_pubspecs_above(start)?;
    match pubspecs.as_slice() {
        [] => Err(PubspecError::NotFound {
            start: start.to_path_buf(),
        }),
        [pubspec] => read_package_info(pubspec),
        _ => Err(PubspecError::NotUnique {
            start: start.to_path_buf(),
            found: pubspecs.len(),
        }),
    }
}

/// Reads the package name from a `pubspec.yaml`.
pub fn read_package_info(pubspec: &Path) -> Result<PackageInfo, PubspecError> {
    let contents = fs::read_to_string(pubspec).map_err(|source| PubspecError::Io {
        path: pubspec.to_path_buf(),
        source,
    })?;
    let project_name = package_name(&contents).map_err(|found| PubspecError::NameLine {
        path: pubspec.to_path_buf(),
        found,
    })?;
    let project_root = pubspec
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    Ok(PackageInfo {
        project_root,
        project_name,
    })
}

/// Extracts the value of the one top-level `name:` line.
/// On failure returns how many `name:` lines were found.
fn package_name(contents: &str) -> Result<String, usize> {
    let name_lines: Vec<&str> = contents
        .lines()
        .filter(|line| line.starts_with("name:"))
        .collect();
    match name_lines.as_slice() {
        [line] => Ok(line["name:".len()..].trim().to_string()),
        _ => Err(name_lines.len()),
    }
}
