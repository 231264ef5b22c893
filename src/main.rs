//! # dart-e
//!
//! `dart-e` runs `dart analyze` on a Dart/Flutter package and applies the
//! fixes for one lint rule directly in the files: trailing commas for
//! `require_trailing_commas`, blanked lines for `unnecessary_import`.
//!
//! ## Quick Start
//! ```sh
//! cargo install dart-e
//! cd my_flutter_app
//! dart-e commas
//! dart-e imports
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use dart_e::e_cli::{print_version_and_features, Command};
use dart_e::e_fix::run_auto_fix;
use dart_e::e_runner::{read_analyzer_output, register_ctrlc_handler};
use dart_e::prelude::*;
use dart_e::{
    aggregate_with_report, apply_fixes, filter_lints, locate_package, Cli, Config, DartTool,
    FixMode, FixOptions, FsEditor, LocationIndex, Messages, PackageInfo,
};

pub fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.version {
        print_version_and_features();
        exit(0);
    }
    let Some(command) = cli.command.clone() else {
        if let Err(err) = Cli::command().print_help() {
            warn!("could not print help: {}", err);
        }
        exit(2);
    };

    if let Err(err) = register_ctrlc_handler() {
        warn!("could not register Ctrl+C handler: {}", err);
    }

    let package = match locate_package(&cli.project_dir) {
        Ok(package) => package,
        Err(err) => {
            Messages::default().error(err.to_string());
            exit(1);
        }
    };
    let mut config = match Config::load(&package.project_root) {
        Ok(config) => config,
        Err(err) => {
            Messages::default().error(format!("{:#}", anyhow::Error::from(err)));
            exit(1);
        }
    };
    config.apply_cli(&cli);
    if matches!(command, Command::Locations { json: true }) {
        // Keep stdout parseable.
        config.show_info_messages = false;
    }
    let messages = Messages::from_config(&config);

    if let Err(err) = run(&cli, &command, &package, &config, &messages) {
        messages.error(format!("{:#}", err));
        exit(1);
    }
}

fn run(
    cli: &Cli,
    command: &Command,
    package: &PackageInfo,
    config: &Config,
    messages: &Messages,
) -> Result<()> {
    let rule = cli
        .rule
        .clone()
        .unwrap_or_else(|| command.default_rule().to_string());
    messages.info(format!(
        "Package {} at {}",
        package.project_name,
        package.project_root.display()
    ));

    let mut tool = None;
    let output = match &cli.input {
        Some(input) => {
            messages.info(format!("Reading analyzer output from {}", input));
            read_analyzer_output(input)?
        }
        None => {
            let dart = DartTool::locate(&config.dart)?;
            messages.info("Running dart analyze...");
            let output = dart
                .analyze(&package.project_root, &config.analyze_args)
                .context("running the analyzer")?;
            tool = Some(dart);
            output
        }
    };

    let lints = filter_lints(output.lines(), &rule);
    debug!("{} line(s) mention {}", lints.len(), rule);
    let (index, skipped) = aggregate_with_report(lints);
    for line in &skipped {
        messages.info(format!("Skipped ({}): {}", line.reason, line.line.trim()));
    }

    let mode = match command.fix_mode() {
        Some(mode) => mode,
        None => {
            let json = matches!(command, Command::Locations { json: true });
            return print_locations(&index, json);
        }
    };
    if index.is_empty() {
        messages.info(format!("No {} diagnostics found.", rule));
        return Ok(());
    }

    let options = FixOptions {
        dry_run: cli.dry_run,
        format: config.format,
    };
    let needs_tool = !options.dry_run && (options.format || mode == FixMode::Auto);
    let tool = match tool {
        Some(tool) if needs_tool => Some(tool),
        None if needs_tool => Some(DartTool::locate(&config.dart)?),
        _ => None,
    };

    let summary = match mode {
        FixMode::Auto => {
            run_auto_fix(tool.as_ref(), &package.project_root, &index, &rule, options, messages)?
        }
        FixMode::Commas | FixMode::Imports => {
            let mut editor = FsEditor::new(tool);
            apply_fixes(&mut editor, &package.project_root, &index, mode, options, messages)?
        }
    };
    messages.info(format!("Done: {}", summary));
    Ok(())
}

fn print_locations(index: &LocationIndex, json: bool) -> Result<()> {
    if json {
        #[cfg(feature = "uses_serde_json")]
        {
            println!("{}", serde_json::to_string(index)?);
            return Ok(());
        }
        #[cfg(not(feature = "uses_serde_json"))]
        anyhow::bail!("JSON output requires the uses_serde_json feature");
    }
    for (path, targets) in index.iter() {
        println!("{}", path);
        for target in targets {
            println!("  line {} index {}", target.line, target.index);
        }
    }
    Ok(())
}
