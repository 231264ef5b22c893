#![doc = include_str!("../README.md")]

// Re-export std common modules
pub mod prelude {
    pub use std::env;
    pub use std::fs;
    pub use std::io;
    pub use std::path::{Path, PathBuf};
    pub use std::process::exit;
    pub use tracing::{debug, error, info, warn};
}

pub mod e_cli;
pub use e_cli::Cli;
pub mod e_config;
pub use e_config::{Config, Messages};
pub mod e_editor;
pub use e_editor::{EditorHost, FsEditor};
pub mod e_fix;
pub use e_fix::{apply_fixes, FixMode, FixOptions, FixSummary};
pub mod e_locations;
pub use e_locations::{aggregate, aggregate_with_report, EditTarget, LocationIndex};
pub mod e_parser;
pub use e_parser::{filter_lints, normalize_path, parse_location, ParsedLocation};
pub mod e_pubspec;
pub use e_pubspec::{locate_package, PackageInfo};
pub mod e_runner;
pub use e_runner::DartTool;
pub mod e_workspace;
