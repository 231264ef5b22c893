#![allow(dead_code)]
use std::fs;
use std::io::Result as IoResult;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// A wrapper around a temporary Dart package directory.
pub struct TestProject {
    /// The temporary directory. When this is dropped, the directory and its contents are removed.
    pub temp_dir: TempDir,
    /// The package root (the directory holding `pubspec.yaml`).
    pub root: PathBuf,
}

impl TestProject {
    /// Create a new package with the given name and an empty `lib/` folder.
    pub fn new(project_name: &str) -> IoResult<Self> {
        let temp_dir = tempdir()?;
        let root = temp_dir.path().join(project_name);
        fs::create_dir_all(root.join("lib"))?;
        fs::write(
            root.join("pubspec.yaml"),
            format!(
                "name: {}\ndescription: test package\n\nenvironment:\n  sdk: '>=3.0.0 <4.0.0'\n",
                project_name
            ),
        )?;
        Ok(TestProject { temp_dir, root })
    }

    /// Returns a reference to the package root.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Writes `contents` to `relative` inside the package, creating folders as needed.
    pub fn write(&self, relative: &str, contents: &str) -> IoResult<PathBuf> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read(&self, relative: &str) -> IoResult<String> {
        fs::read_to_string(self.root.join(relative))
    }

    /// Saves fake analyzer output next to the package and returns its path.
    pub fn analyzer_output(&self, lines: &[String]) -> IoResult<PathBuf> {
        let path = self.temp_dir.path().join("analyze.txt");
        fs::write(&path, analyzer_report(lines))?;
        Ok(path)
    }
}

/// Wraps diagnostic lines in the header and footer `dart analyze` prints.
pub fn analyzer_report(lines: &[String]) -> String {
    let mut contents = String::from("Analyzing my_app...\n\n");
    for line in lines {
        contents.push_str(line);
        contents.push('\n');
    }
    contents.push_str(&format!("\n{} issues found.\n", lines.len()));
    contents
}

/// One diagnostic line in the shape `dart analyze` prints.
pub fn diagnostic(path: &str, line: usize, column: usize, message: &str, rule: &str) -> String {
    format!("   info - {}:{}:{} - {} - {}", path, line, column, message, rule)
}

pub fn trailing_comma(path: &str, line: usize, column: usize) -> String {
    diagnostic(
        path,
        line,
        column,
        "Missing a required trailing comma. Try adding a trailing comma.",
        "require_trailing_commas",
    )
}

pub fn unnecessary_import(path: &str, line: usize, column: usize) -> String {
    diagnostic(
        path,
        line,
        column,
        "The import of 'package:flutter/widgets.dart' is unnecessary. Try removing the import directive.",
        "unnecessary_import",
    )
}
