use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::e_fix::FixMode;

#[derive(Parser, Debug)]
#[command(author, version, about = "dart-e fixes what dart analyze reports.", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Print version and feature flags in JSON format.
    #[arg(
        long,
        short = 'v',
        help = "Print version and feature flags in JSON format."
    )]
    pub version: bool,

    #[arg(
        long,
        short = 'C',
        global = true,
        default_value = ".",
        help = "Directory (or file) inside the Dart package to operate on."
    )]
    pub project_dir: PathBuf,

    #[arg(
        long,
        short = 'r',
        global = true,
        help = "Lint rule to act on instead of the command's default."
    )]
    pub rule: Option<String>,

    #[arg(
        long,
        short = 'i',
        global = true,
        help = "Read analyzer output from a file ('-' for stdin) instead of running the analyzer."
    )]
    pub input: Option<String>,

    #[arg(long, global = true, help = "Program used to run analyze/format/fix.")]
    pub dart: Option<String>,

    #[arg(long, global = true, help = "Do not format edited files.")]
    pub no_format: bool,

    #[arg(
        long,
        short = 'n',
        global = true,
        help = "Print the planned edits without touching any file."
    )]
    pub dry_run: bool,

    #[arg(long, short = 'q', global = true, help = "Hide informational messages.")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Insert the trailing commas reported by `require_trailing_commas`.
    Commas,
    /// Blank out the import lines reported by `unnecessary_import`.
    Imports,
    /// Let `dart fix --apply` handle the rule, then format the reported files.
    Auto,
    /// Print the grouped edit targets for a rule without editing anything.
    Locations {
        #[arg(long, help = "Print the locations as JSON.")]
        json: bool,
    },
}

impl Command {
    /// The fix mode behind a command. `locations` has none.
    pub fn fix_mode(&self) -> Option<FixMode> {
        match self {
            Command::Commas => Some(FixMode::Commas),
            Command::Imports => Some(FixMode::Imports),
            Command::Auto => Some(FixMode::Auto),
            Command::Locations { .. } => None,
        }
    }

    /// Rule filtered when `--rule` is not given.
    pub fn default_rule(&self) -> &'static str {
        self.fix_mode()
            .map(FixMode::default_rule)
            .unwrap_or(FixMode::Commas.default_rule())
    }
}

/// Print the version and the JSON array of feature flags.
pub fn print_version_and_features() {
    let version = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown");
    let json_features = format!(
        "[{}]",
        get_feature_flags()
            .iter()
            .map(|f| format!("\"{}\"", f))
            .collect::<Vec<String>>()
            .join(", ")
    );
    println!("dart-e {}", version);
    println!("{}", json_features);
}

/// Returns a vector of feature flag strings.
/// Enabled features are listed as-is while disabled ones are prefixed with "!".
pub fn get_feature_flags() -> Vec<&'static str> {
    let mut flags = Vec::new();
    if cfg!(feature = "uses_serde_json") {
        flags.push("uses_serde_json");
    } else {
        flags.push("!uses_serde_json");
    }
    flags
}
