use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::e_config::Messages;
use crate::e_editor::EditorHost;
use crate::e_locations::{EditTarget, LocationIndex};
use crate::e_runner::DartTool;
use crate::e_workspace::resolve_document;

/// Which edit a fix command applies at every target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixMode {
    /// Insert a trailing comma at the reported column.
    Commas,
    /// Blank out the reported import line.
    Imports,
    /// Delegate to `dart fix --apply`, then format.
    Auto,
}

impl FixMode {
    pub fn default_rule(self) -> &'static str {
        match self {
            FixMode::Commas | FixMode::Auto => "require_trailing_commas",
            FixMode::Imports => "unnecessary_import",
        }
    }

    /// The new text for `line` with this mode's edit applied at `index`.
    /// `Auto` does not edit lines itself.
    pub fn edit_line(self, line: &str, index: usize) -> Option<String> {
        match self {
            FixMode::Commas => Some(insert_comma(line, index)),
            FixMode::Imports => Some(blank_line(line)),
            FixMode::Auto => None,
        }
    }
}

/// Inserts a comma at `index`. When the character just before `index` is a
/// closing brace the comma goes in front of it instead.
///
/// `index` counts UTF-16 code units, the unit of analyzer columns.
///
/// ```
/// use dart_e::e_fix::insert_comma;
///
/// assert_eq!(insert_comma("  foo(a, b)", 10), "  foo(a, b,)");
/// assert_eq!(insert_comma("  child: Text('x')}", 19), "  child: Text('x'),}");
/// ```
pub fn insert_comma(line: &str, index: usize) -> String {
    let mut at = utf16_to_byte_offset(line, index);
    if line[..at].ends_with('}') {
        at -= 1;
    }
    let mut out = String::with_capacity(line.len() + 1);
    out.push_str(&line[..at]);
    out.push(',');
    out.push_str(&line[at..]);
    out
}

/// Byte offset of the first char boundary at or after `index` UTF-16 units,
/// clamped to the end of `line`.
fn utf16_to_byte_offset(line: &str, index: usize) -> usize {
    let mut units = 0;
    for (offset, ch) in line.char_indices() {
        if units >= index {
            return offset;
        }
        units += ch.len_utf16();
    }
    line.len()
}

/// Import lines are emptied rather than removed so the line numbers of the
/// remaining targets in the file stay valid.
pub fn blank_line(_line: &str) -> String {
    String::new()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixOptions {
    pub dry_run: bool,
    pub format: bool,
}

/// Counts reported after a fix command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixSummary {
    pub files: usize,
    pub edits: usize,
    pub skipped: usize,
}

impl fmt::Display for FixSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} edit(s) in {} file(s), {} skipped",
            self.edits, self.files, self.skipped
        )
    }
}

/// Targets of one file in the order they are applied: bottom-most first, so an
/// insertion never moves a target that is still pending.
fn application_order(targets: &[EditTarget]) -> Vec<EditTarget> {
    let mut ordered = targets.to_vec();
    ordered.sort_by(|a, b| b.cmp(a));
    ordered
}

/// Applies `mode`'s edit at every target of `index`, then formats and saves
/// each touched document through `host`.
pub fn apply_fixes<H: EditorHost>(
    host: &mut H,
    package_root: &Path,
    index: &LocationIndex,
    mode: FixMode,
    options: FixOptions,
    messages: &Messages,
) -> Result<FixSummary> {
    let mut summary = FixSummary::default();

    for (key, targets) in index.iter() {
        let path = resolve_document(package_root, key)?;
        if options.dry_run {
            for target in targets {
                println!("{}:{}:{}", path.display(), target.line + 1, target.index + 1);
            }
            summary.files += 1;
            summary.edits += targets.len();
            continue;
        }

        let doc = host
            .open_document(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        let line_count = host.line_count(doc)?;
        let mut edited = 0;
        for target in application_order(targets) {
            if target.line >= line_count {
                warn!(
                    "{}: line {} is past the end of the file ({} lines)",
                    path.display(),
                    target.line + 1,
                    line_count
                );
                summary.skipped += 1;
                continue;
            }
            let current = host.line_at(doc, target.line)?;
            let Some(replacement) = mode.edit_line(current, target.index) else {
                continue;
            };
            debug!("{}:{} -> {:?}", path.display(), target.line + 1, replacement);
            host.apply_edit(doc, target.line, replacement)?;
            edited += 1;
        }

        if options.format {
            host.format(doc)?;
        }
        host.save(doc)?;
        messages.info(format!("Fixed {} issue(s) in {}", edited, path.display()));
        summary.files += 1;
        summary.edits += edited;
    }

    Ok(summary)
}

/// Runs `dart fix --apply` for `rule` and then formats every file that had a
/// diagnostic. `tool` may only be absent for a dry run.
pub fn run_auto_fix(
    tool: Option<&DartTool>,
    package_root: &Path,
    index: &LocationIndex,
    rule: &str,
    options: FixOptions,
    messages: &Messages,
) -> Result<FixSummary> {
    let paths = index
        .paths()
        .map(|key| resolve_document(package_root, key))
        .collect::<Result<Vec<PathBuf>, _>>()?;

    if options.dry_run {
        for path in &paths {
            println!("{}", path.display());
        }
        return Ok(FixSummary {
            files: paths.len(),
            edits: index.target_count(),
            skipped: 0,
        });
    }

    let tool = tool.context("dart is required to apply fixes")?;
    messages.info(format!("Running dart fix for {}...", rule));
    tool.fix(package_root, rule)
        .with_context(|| format!("dart fix for {}", rule))?;
    if options.format {
        for path in &paths {
            tool.format(path)
                .with_context(|| format!("formatting {}", path.display()))?;
        }
    }
    Ok(FixSummary {
        files: paths.len(),
        edits: index.target_count(),
        skipped: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::e_editor::FsEditor;
    use crate::e_locations::aggregate;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_insert_comma() {
        assert_eq!(insert_comma("  1", 3), "  1,");
        assert_eq!(insert_comma("abc", 1), "a,bc");
        assert_eq!(insert_comma("})", 1), ",})");
        assert_eq!(insert_comma("x", 0), ",x");
        // Past the end clamps to the end.
        assert_eq!(insert_comma("ab", 10), "ab,");
        assert_eq!(insert_comma("", 0), ",");
        assert_eq!(insert_comma("é}", 2), "é,}");
    }

    #[test]
    fn test_insert_comma_counts_utf16_units() {
        // The emoji is two UTF-16 units, so column 5 is right after `b`.
        assert_eq!(insert_comma("a🎉b)c", 4), "a🎉b,)c");
        assert_eq!(insert_comma("  Text('🎉')}", 12), "  Text('🎉'),}");
        assert_eq!(insert_comma("🎉", 2), "🎉,");
        assert_eq!(utf16_to_byte_offset("a🎉b", 3), 5);
        assert_eq!(utf16_to_byte_offset("a🎉b", 9), 6);
    }

    #[test]
    fn test_edit_line_per_mode() {
        assert_eq!(FixMode::Commas.edit_line("f(a)", 3), Some("f(a,)".to_string()));
        assert_eq!(FixMode::Imports.edit_line("import 'x.dart';", 7), Some(String::new()));
        assert_eq!(FixMode::Auto.edit_line("f(a)", 3), None);
    }

    #[test]
    fn test_application_order_is_descending() {
        let targets = [
            EditTarget::new(1, 2),
            EditTarget::new(3, 0),
            EditTarget::new(1, 9),
        ];
        assert_eq!(
            application_order(&targets),
            vec![
                EditTarget::new(3, 0),
                EditTarget::new(1, 9),
                EditTarget::new(1, 2)
            ]
        );
    }

    #[test]
    fn test_apply_commas_bottom_up() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        let file = dir.path().join("lib/a.dart");
        fs::write(&file, "f(g(1\n), 2\n);\n").unwrap();

        let index = aggregate([
            "info - lib/a.dart:1:6 - Missing a required trailing comma. - require_trailing_commas",
            "info - lib/a.dart:2:5 - Missing a required trailing comma. - require_trailing_commas",
        ]);
        let mut editor = FsEditor::new(None);
        let summary = apply_fixes(
            &mut editor,
            dir.path(),
            &index,
            FixMode::Commas,
            FixOptions::default(),
            &Messages::default(),
        )
        .unwrap();

        assert_eq!(
            summary,
            FixSummary {
                files: 1,
                edits: 2,
                skipped: 0
            }
        );
        assert_eq!(fs::read_to_string(&file).unwrap(), "f(g(1,\n), 2,\n);\n");
    }

    #[test]
    fn test_apply_imports_keeps_line_numbers() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        let file = dir.path().join("lib/c.dart");
        fs::write(
            &file,
            "import 'a.dart';\nimport 'b.dart';\nimport 'c.dart';\n\nvoid main() {}\n",
        )
        .unwrap();

        let index = aggregate([
            "info - lib/c.dart:1:8 - The import of 'a.dart' is unnecessary. - unnecessary_import",
            "info - lib/c.dart:3:8 - The import of 'c.dart' is unnecessary. - unnecessary_import",
            "info - lib/c.dart:40:8 - stale diagnostic - unnecessary_import",
        ]);
        let mut editor = FsEditor::new(None);
        let summary = apply_fixes(
            &mut editor,
            dir.path(),
            &index,
            FixMode::Imports,
            FixOptions::default(),
            &Messages::default(),
        )
        .unwrap();

        assert_eq!(summary.edits, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "\nimport 'b.dart';\n\n\nvoid main() {}\n"
        );
    }

    #[test]
    fn test_dry_run_leaves_files_alone() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        let file = dir.path().join("lib/a.dart");
        fs::write(&file, "f(1\n);\n").unwrap();

        let index = aggregate(["info - lib/a.dart:1:4 - m - require_trailing_commas"]);
        let mut editor = FsEditor::new(None);
        let options = FixOptions {
            dry_run: true,
            format: true,
        };
        let summary = apply_fixes(
            &mut editor,
            dir.path(),
            &index,
            FixMode::Commas,
            options,
            &Messages::default(),
        )
        .unwrap();

        assert_eq!(summary.edits, 1);
        assert_eq!(fs::read_to_string(&file).unwrap(), "f(1\n);\n");
    }

    #[test]
    fn test_auto_fix_dry_run_without_tool() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/a.dart"), "f(1\n);\n").unwrap();
        let index = aggregate([
            "info - lib/a.dart:1:4 - m - require_trailing_commas",
            "info - lib/a.dart:3:1 - m - require_trailing_commas",
        ]);
        let dry_run = FixOptions {
            dry_run: true,
            format: true,
        };

        let summary = run_auto_fix(
            None,
            dir.path(),
            &index,
            "require_trailing_commas",
            dry_run,
            &Messages::default(),
        )
        .unwrap();
        assert_eq!(summary.files, 1);
        assert_eq!(summary.edits, 2);

        let err = run_auto_fix(
            None,
            dir.path(),
            &index,
            "require_trailing_commas",
            FixOptions::default(),
            &Messages::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("dart is required"));
    }

    #[test]
    fn test_unresolvable_file_is_an_error() {
        let dir = tempdir().unwrap();
        let index = aggregate(["info - lib/missing.dart:1:1 - m - require_trailing_commas"]);
        let mut editor = FsEditor::new(None);
        let err = apply_fixes(
            &mut editor,
            dir.path(),
            &index,
            FixMode::Commas,
            FixOptions::default(),
            &Messages::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing.dart"));
    }
}
