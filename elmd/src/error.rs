use std::fmt;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

use codespan_reporting::diagnostic::{Diagnostic, Label};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while converting or highlighting a document.
#[derive(Debug, Error)]
pub enum Error {
    /// Opening, reading or writing a file or a subprocess failed.
    #[error("{}", display_io(.path.as_deref(), .source))]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: io::Error,
    },
    /// The input (or the highlighter's output) has the wrong shape.
    #[error(transparent)]
    Format(#[from] FormatError),
}

fn display_io(path: Option<&Path>, source: &io::Error) -> String {
    match path {
        Some(path) => format!("{}: {}", path.display(), source),
        None => source.to_string(),
    }
}

impl Error {
    pub fn io_at(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: Some(path.into()),
            source,
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Error::Format(FormatError::new(message))
    }

    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format(_))
    }
}

impl From<io::Error> for Error {
    fn from(source: io::Error) -> Self {
        Error::Io { path: None, source }
    }
}

/// Where in a source file a format error was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub path: PathBuf,
    /// 1-based line number.
    pub line: usize,
    /// Byte span of the offending line (without its line terminator).
    pub span: Range<usize>,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// Malformed input, with an optional location for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl FormatError {
    pub fn new(message: impl Into<String>) -> Self {
        FormatError {
            message: message.into(),
            location: None,
        }
    }

    pub fn at(message: impl Into<String>, location: SourceLocation) -> Self {
        FormatError {
            message: message.into(),
            location: Some(location),
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    ///
    /// `file_id` must refer to the file named by `self.location`; without
    /// a location the diagnostic carries no label.
    pub fn to_diagnostic<FileId: Copy>(&self, file_id: FileId) -> Diagnostic<FileId> {
        let diagnostic = Diagnostic::error().with_message(&self.message);
        match &self.location {
            Some(location) => diagnostic.with_labels(vec![
                Label::primary(file_id, location.span.clone())
                    .with_message(format!("line {}", location.line)),
            ]),
            None => diagnostic,
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}", location, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for FormatError {}
