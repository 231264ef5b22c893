use std::collections::HashMap;
use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::{debug, warn};

use crate::e_parser::{normalize_path, parse_location, ParsedLocation};

/// A zero-based position at which one edit is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EditTarget {
    pub line: usize,
    pub index: usize,
}

impl EditTarget {
    pub fn new(line: usize, index: usize) -> Self {
        EditTarget { line, index }
    }

    /// Converts a 1-based analyzer location into a zero-based target.
    pub fn from_location(location: &ParsedLocation) -> Result<Self, SkipReason> {
        let line = parse_position(&location.line)?;
        let column = parse_position(&location.column)?;
        Ok(EditTarget {
            line: line - 1,
            index: column - 1,
        })
    }
}

fn parse_position(raw: &str) -> Result<usize, SkipReason> {
    match raw.parse::<usize>() {
        Ok(0) => Err(SkipReason::ZeroPosition),
        Ok(value) => Ok(value),
        Err(_) => Err(SkipReason::InvalidNumber(raw.to_string())),
    }
}

/// Why a filtered diagnostic line produced no edit target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The line has no `- path:line:column` triple.
    NoLocation,
    /// The line or column digits do not fit in a `usize`.
    InvalidNumber(String),
    /// The analyzer reported line or column 0.
    ZeroPosition,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoLocation => write!(f, "no file location found"),
            SkipReason::InvalidNumber(raw) => write!(f, "position '{}' is not a valid number", raw),
            SkipReason::ZeroPosition => write!(f, "line and column must start at 1"),
        }
    }
}

/// A diagnostic line that was left out of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line: String,
    pub reason: SkipReason,
}

/// Edit targets grouped by file path.
///
/// Paths iterate in the order they were first seen and each path's targets
/// keep the order in which they were pushed. Duplicate targets are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationIndex {
    entries: Vec<(String, Vec<EditTarget>)>,
    positions: HashMap<String, usize>,
}

impl LocationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `target` to the list for `path`, creating the list when the path is new.
    pub fn push(&mut self, path: &str, target: EditTarget) {
        match self.positions.get(path) {
            Some(&pos) => self.entries[pos].1.push(target),
            None => {
                self.positions.insert(path.to_string(), self.entries.len());
                self.entries.push((path.to_string(), vec![target]));
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&[EditTarget]> {
        self.positions
            .get(path)
            .map(|&pos| self.entries[pos].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[EditTarget])> {
        self.entries
            .iter()
            .map(|(path, targets)| (path.as_str(), targets.as_slice()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(path, _)| path.as_str())
    }

    /// Number of distinct paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn target_count(&self) -> usize {
        self.entries.iter().map(|(_, targets)| targets.len()).sum()
    }
}

impl Serialize for LocationIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, targets) in &self.entries {
            map.serialize_entry(path, targets)?;
        }
        map.end()
    }
}

/// Groups diagnostic lines into a [`LocationIndex`], returning the lines that
/// could not be turned into an edit target alongside it.
pub fn aggregate_with_report<'a, I>(lines: I) -> (LocationIndex, Vec<SkippedLine>)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index = LocationIndex::new();
    let mut skipped = Vec::new();

    for line in lines {
        let result = parse_location(line)
            .ok_or(SkipReason::NoLocation)
            .and_then(|location| {
                EditTarget::from_location(&location).map(|target| (location, target))
            });

        match result {
            Ok((location, target)) => {
                let path = normalize_path(&location.file_path);
                debug!("{} -> {}:{}", path, target.line, target.index);
                index.push(path, target);
            }
            Err(reason) => {
                warn!("skipping diagnostic ({}): {}", reason, line);
                skipped.push(SkippedLine {
                    line: line.to_string(),
                    reason,
                });
            }
        }
    }

    (index, skipped)
}

/// Groups diagnostic lines into a [`LocationIndex`].
///
/// # Example
/// ```
/// use dart_e::e_locations::{aggregate, EditTarget};
///
/// let index = aggregate(["INFO - lib/a.dart:5:3 • require_trailing_commas"]);
/// assert_eq!(index.get("lib/a.dart"), Some(&[EditTarget::new(4, 2)][..]));
/// ```
pub fn aggregate<'a, I>(lines: I) -> LocationIndex
where
    I: IntoIterator<Item = &'a str>,
{
    aggregate_with_report(lines).0
}
