use std::ffi::OsStr;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{exit, Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::debug;
use which::which;

// Global shared container for the running analyzer processes.
pub static GLOBAL_CHILDREN: Lazy<Arc<Mutex<Vec<Child>>>> = Lazy::new(|| Arc::new(Mutex::new(Vec::new())));

/// Registers a global Ctrl+C handler once.
/// The handler kills every child in GLOBAL_CHILDREN, or exits when there is none.
pub fn register_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        let mut children = GLOBAL_CHILDREN.lock().unwrap_or_else(PoisonError::into_inner);
        if children.is_empty() {
            eprintln!("Ctrl+C pressed, no child process running. Exiting nicely.");
            exit(130);
        }
        eprintln!("Ctrl+C pressed, terminating running child process...");
        for child in children.iter_mut() {
            let _ = child.kill();
        }
    })
}

fn take_child(pid: u32) -> Option<Child> {
    let mut children = GLOBAL_CHILDREN.lock().unwrap_or_else(PoisonError::into_inner);
    let pos = children.iter().position(|child| child.id() == pid)?;
    Some(children.swap_remove(pos))
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("'{program}' was not found in PATH")]
    NotFound {
        program: String,
        #[source]
        source: which::Error,
    },
    #[error("failed to run {command}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("failed to read analyzer output from {input}")]
    Input {
        input: String,
        #[source]
        source: io::Error,
    },
}

/// The Dart SDK entry point used to analyze, fix and format a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DartTool {
    program: PathBuf,
}

impl DartTool {
    /// Resolves `program` through PATH (or as a direct path).
    pub fn locate(program: &str) -> Result<Self, RunnerError> {
        let program = which(program).map_err(|source| RunnerError::NotFound {
            program: program.to_string(),
            source,
        })?;
        debug!("using {}", program.display());
        Ok(DartTool { program })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Runs the analyzer on `package_root` and returns its stdout.
    ///
    /// The analyzer is started in the parent of `package_root` with the package
    /// folder as its last argument, so every reported path begins with the
    /// package folder name.
    ///
    /// The analyzer exits non-zero whenever it reports issues, so the status
    /// only matters when nothing was printed.
    pub fn analyze(&self, package_root: &Path, args: &[String]) -> Result<String, RunnerError> {
        let (working_dir, target) = analyze_target(package_root);
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .arg(target)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let command = describe(&cmd);
        debug!("running: {}", command);

        let mut child = cmd.spawn().map_err(|source| RunnerError::Spawn {
            command: command.clone(),
            source,
        })?;
        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        GLOBAL_CHILDREN
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(child);

        let stderr_reader = thread::spawn(move || {
            let mut buf = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut buf);
            }
            buf
        });
        let mut output = String::new();
        let read_result = match stdout {
            Some(mut stdout) => stdout.read_to_string(&mut output).map(|_| ()),
            None => Ok(()),
        };
        let stderr_output = stderr_reader.join().unwrap_or_default();

        let status = match take_child(pid) {
            Some(mut child) => child.wait().map_err(|source| RunnerError::Spawn {
                command: command.clone(),
                source,
            })?,
            None => {
                return Err(RunnerError::Spawn {
                    command,
                    source: io::Error::other("child process missing"),
                })
            }
        };
        read_result.map_err(|source| RunnerError::Spawn {
            command: command.clone(),
            source,
        })?;

        debug!("{} exited with {:?}", command, status.code());
        if !status.success() && output.trim().is_empty() {
            return Err(RunnerError::Failed {
                command,
                status,
                stderr: stderr_output.trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Runs `dart format <path>`.
    pub fn format(&self, path: &Path) -> Result<(), RunnerError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("format").arg(path);
        run_to_completion(cmd)
    }

    /// Runs `dart fix --apply --code=<rule>` in `package_root`.
    pub fn fix(&self, package_root: &Path, rule: &str) -> Result<(), RunnerError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["fix", "--apply"])
            .arg(format!("--code={}", rule))
            .current_dir(package_root);
        run_to_completion(cmd)
    }
}

/// The directory the analyzer runs in and the path it is asked to analyze.
fn analyze_target(package_root: &Path) -> (&Path, &OsStr) {
    match (package_root.parent(), package_root.file_name()) {
        (Some(parent), Some(name)) => (parent, name),
        _ => (package_root, OsStr::new(".")),
    }
}

fn run_to_completion(mut cmd: Command) -> Result<(), RunnerError> {
    let command = describe(&cmd);
    debug!("running: {}", command);
    let output = cmd.output().map_err(|source| RunnerError::Spawn {
        command: command.clone(),
        source,
    })?;
    if !output.status.success() {
        return Err(RunnerError::Failed {
            command,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

fn describe(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().to_string()];
    parts.extend(cmd.get_args().map(|arg| arg.to_string_lossy().to_string()));
    parts.join(" ")
}

/// Reads previously captured analyzer output from a file, or from stdin when
/// `input` is `-`.
pub fn read_analyzer_output(input: &str) -> Result<String, RunnerError> {
    let result = if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map(|_| buf)
    } else {
        fs::read_to_string(input)
    };
    result.map_err(|source| RunnerError::Input {
        input: input.to_string(),
        source,
    })
}
