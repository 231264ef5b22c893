use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::e_runner::{DartTool, RunnerError};

/// Identifies a document opened through an [`EditorHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(usize);

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unknown document handle {0:?}")]
    UnknownDocument(DocumentHandle),
    #[error("line {line} is out of range for {} ({count} lines)", path.display())]
    LineOutOfRange {
        path: PathBuf,
        line: usize,
        count: usize,
    },
    #[error("failed to format {}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: RunnerError,
    },
}

/// The capabilities the fix commands need from whatever holds the documents.
///
/// Edits always replace one whole line, mirroring how the fixes are expressed:
/// read the line, compute the new text, write it back.
pub trait EditorHost {
    fn open_document(&mut self, path: &Path) -> Result<DocumentHandle, EditorError>;
    fn line_count(&self, doc: DocumentHandle) -> Result<usize, EditorError>;
    fn line_at(&self, doc: DocumentHandle, line: usize) -> Result<&str, EditorError>;
    fn apply_edit(
        &mut self,
        doc: DocumentHandle,
        line: usize,
        replacement: String,
    ) -> Result<(), EditorError>;
    fn format(&mut self, doc: DocumentHandle) -> Result<(), EditorError>;
    fn save(&mut self, doc: DocumentHandle) -> Result<(), EditorError>;
}

#[derive(Debug, Clone)]
struct Document {
    path: PathBuf,
    lines: Vec<String>,
    /// The terminator of each line as read: `"\r\n"`, `"\n"`, or `""` for a
    /// last line without one.
    endings: Vec<&'static str>,
    dirty: bool,
}

impl Document {
    fn load(path: &Path) -> Result<Self, EditorError> {
        let contents = fs::read_to_string(path).map_err(|source| EditorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (lines, endings) = split_lines(&contents);
        Ok(Document {
            path: path.to_path_buf(),
            lines,
            endings,
            dirty: false,
        })
    }

    fn contents(&self) -> String {
        let mut out = String::new();
        for (line, ending) in self.lines.iter().zip(&self.endings) {
            out.push_str(line);
            out.push_str(ending);
        }
        out
    }

    fn write(&mut self) -> Result<(), EditorError> {
        fs::write(&self.path, self.contents()).map_err(|source| EditorError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.dirty = false;
        Ok(())
    }
}

/// Splits `contents` into lines the way `str::lines` does, keeping each
/// line's own terminator.
fn split_lines(contents: &str) -> (Vec<String>, Vec<&'static str>) {
    let mut lines = Vec::new();
    let mut endings = Vec::new();
    for piece in contents.split_inclusive('\n') {
        let (line, ending) = if let Some(line) = piece.strip_suffix("\r\n") {
            (line, "\r\n")
        } else if let Some(line) = piece.strip_suffix('\n') {
            (line, "\n")
        } else {
            (piece, "")
        };
        lines.push(line.to_string());
        endings.push(ending);
    }
    (lines, endings)
}

/// An [`EditorHost`] over files on disk. Formatting goes through `dart format`
/// when a [`DartTool`] is configured and is skipped otherwise.
#[derive(Debug, Default)]
pub struct FsEditor {
    documents: Vec<Document>,
    formatter: Option<DartTool>,
}

impl FsEditor {
    pub fn new(formatter: Option<DartTool>) -> Self {
        FsEditor {
            documents: Vec::new(),
            formatter,
        }
    }

    fn document(&self, doc: DocumentHandle) -> Result<&Document, EditorError> {
        self.documents
            .get(doc.0)
            .ok_or(EditorError::UnknownDocument(doc))
    }

    fn document_mut(&mut self, doc: DocumentHandle) -> Result<&mut Document, EditorError> {
        self.documents
            .get_mut(doc.0)
            .ok_or(EditorError::UnknownDocument(doc))
    }

    pub fn path(&self, doc: DocumentHandle) -> Result<&Path, EditorError> {
        Ok(&self.document(doc)?.path)
    }
}

impl EditorHost for FsEditor {
    fn open_document(&mut self, path: &Path) -> Result<DocumentHandle, EditorError> {
        if let Some(pos) = self.documents.iter().position(|d| d.path == path) {
            return Ok(DocumentHandle(pos));
        }
        let document = Document::load(path)?;
        debug!("opened {} ({} lines)", path.display(), document.lines.len());
        self.documents.push(document);
        Ok(DocumentHandle(self.documents.len() - 1))
    }

    fn line_count(&self, doc: DocumentHandle) -> Result<usize, EditorError> {
        Ok(self.document(doc)?.lines.len())
    }

    fn line_at(&self, doc: DocumentHandle, line: usize) -> Result<&str, EditorError> {
        let document = self.document(doc)?;
        document
            .lines
            .get(line)
            .map(String::as_str)
            .ok_or_else(|| EditorError::LineOutOfRange {
                path: document.path.clone(),
                line,
                count: document.lines.len(),
            })
    }

    fn apply_edit(
        &mut self,
        doc: DocumentHandle,
        line: usize,
        replacement: String,
    ) -> Result<(), EditorError> {
        let document = self.document_mut(doc)?;
        let count = document.lines.len();
        match document.lines.get_mut(line) {
            Some(slot) => {
                if *slot != replacement {
                    *slot = replacement;
                    document.dirty = true;
                }
                Ok(())
            }
            None => Err(EditorError::LineOutOfRange {
                path: document.path.clone(),
                line,
                count,
            }),
        }
    }

    fn format(&mut self, doc: DocumentHandle) -> Result<(), EditorError> {
        let Some(formatter) = self.formatter.clone() else {
            return Ok(());
        };
        let document = self.document_mut(doc)?;
        if document.dirty {
            document.write()?;
        }
        formatter
            .format(&document.path)
            .map_err(|source| EditorError::Format {
                path: document.path.clone(),
                source,
            })?;
        *document = Document::load(&document.path)?;
        Ok(())
    }

    fn save(&mut self, doc: DocumentHandle) -> Result<(), EditorError> {
        let document = self.document_mut(doc)?;
        if document.dirty {
            debug!("saving {}", document.path.display());
            document.write()?;
        }
        Ok(())
    }
}
