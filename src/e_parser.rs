use once_cell::sync::Lazy;
use regex::Regex;

/// Matches `- <path>:<line>:<column>`. The path is lazy so it stops at the
/// first `:<digits>:<digits>` after the hyphen, which keeps the drive colon
/// of a Windows path inside the capture.
static LOCATION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-\s(.*?):([0-9]+):([0-9]+)").unwrap());

/// A location exactly as `dart analyze` printed it: 1-based and unconverted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLocation {
    pub file_path: String,
    pub line: String,
    pub column: String,
}

/// Extracts the `path:line:column` triple from one analyzer line.
///
/// When several triples appear in the line the last one is returned.
/// Returns `None` when the line carries no location at all.
///
/// # Example
/// ```
/// use dart_e::e_parser::parse_location;
///
/// let line = "  info - lib/main.dart:12:27 - Missing a required trailing comma. - require_trailing_commas";
/// let location = parse_location(line).unwrap();
/// assert_eq!(location.file_path, "lib/main.dart");
/// assert_eq!(location.line, "12");
/// assert_eq!(location.column, "27");
/// ```
pub fn parse_location(line: &str) -> Option<ParsedLocation> {
    let mut last = None;
    for caps in LOCATION_REGEX.captures_iter(line) {
        last = Some(ParsedLocation {
            file_path: caps.get(1).map_or("", |m| m.as_str()).to_string(),
            line: caps[2].to_string(),
            column: caps[3].to_string(),
        });
    }
    last
}

/// Drops everything up to and including the first backslash.
///
/// The analyzer runs one directory above the package (see
/// [`DartTool::analyze`](crate::e_runner::DartTool::analyze)), so on Windows
/// its paths start with the package folder (`my_app\lib\main.dart`). Paths with
/// no backslash are returned unchanged.
pub fn normalize_path(path: &str) -> &str {
    match path.find('\\') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Keeps only the analyzer lines that mention `rule_name`.
///
/// This is plain substring containment, so a rule whose name contains another
/// rule's name matches both.
pub fn filter_lints<'a, I>(all_lines: I, rule_name: &str) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    all_lines
        .into_iter()
        .filter(|line| line.contains(rule_name))
        .collect()
}
