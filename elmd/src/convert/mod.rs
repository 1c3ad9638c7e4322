//! Literate source to Markdown.
//!
//! Lines starting with the prose marker are copied through without it;
//! every other run of lines becomes a fenced code block. Blank lines are
//! held back until the next non-blank line so that a fence closed by a
//! prose line ends before the blank run, not after it.

mod line;

pub use line::{Line, TAB_WIDTH, untabify};

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, FormatError, Result, SourceLocation};

pub const DEFAULT_MARKER: &str = ";;;";
pub const DEFAULT_LANGUAGE: &str = "emacs-lisp";

const FENCE: &str = "```";

/// Converts annotated source files into Markdown.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Converter {
    /// Prefix that marks a prose line.
    pub marker: String,
    /// Tag written after the opening fence of each code run.
    pub language: String,
}

impl Default for Converter {
    fn default() -> Self {
        Converter {
            marker: DEFAULT_MARKER.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl Converter {
    pub fn classify<'a>(&self, line: &'a [u8]) -> Line<'a> {
        line::classify(line, self.marker.as_bytes())
    }

    /// Convert the file at `path` into `out`, preceded by `header` if one is
    /// given. Included files are written into the same `out`; wrap file
    /// handles in a `BufWriter` before passing them in.
    ///
    /// Source bytes are copied through as they are, whatever their encoding.
    pub fn convert<W: Write>(
        &self,
        out: &mut W,
        path: impl AsRef<Path>,
        header: Option<&[u8]>,
    ) -> Result<()> {
        write_header(out, header)?;
        let mut open = Vec::new();
        self.convert_nested(out, path.as_ref(), &mut open)?;
        out.flush()?;
        Ok(())
    }

    /// Convert already-open source. `origin` names the source in errors and
    /// is the directory anchor for its inclusions.
    pub fn convert_reader<R: BufRead, W: Write>(
        &self,
        out: &mut W,
        reader: R,
        origin: impl AsRef<Path>,
    ) -> Result<()> {
        let origin = origin.as_ref();
        let mut open = Vec::new();
        if let Ok(canonical) = fs::canonicalize(origin) {
            open.push(canonical);
        }
        self.emit_lines(out, reader, origin, &mut open)?;
        out.flush()?;
        Ok(())
    }

    /// Convert the file at `path` into an in-memory string. Fails with an
    /// `InvalidData` I/O error if the result is not UTF-8.
    pub fn convert_to_string(&self, path: impl AsRef<Path>) -> Result<String> {
        let mut buf = Vec::new();
        self.convert(&mut buf, path, None)?;
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
    }

    fn convert_nested<W: Write>(
        &self,
        out: &mut W,
        path: &Path,
        open: &mut Vec<PathBuf>,
    ) -> Result<()> {
        let file = File::open(path).map_err(|e| Error::io_at(path, e))?;
        let canonical = fs::canonicalize(path).map_err(|e| Error::io_at(path, e))?;
        log::debug!("converting {}", path.display());

        open.push(canonical);
        let result = self.emit_lines(out, BufReader::new(file), path, open);
        open.pop();
        result
    }

    fn emit_lines<R: BufRead, W: Write>(
        &self,
        out: &mut W,
        mut reader: R,
        path: &Path,
        open: &mut Vec<PathBuf>,
    ) -> Result<()> {
        let mut emitter = Emitter::new(out, &self.language);
        let mut buf = Vec::new();
        let mut offset = 0;
        let mut line_no = 0;

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| Error::io_at(path, e))?;
            if read == 0 {
                break;
            }
            line_no += 1;
            let text = buf.strip_suffix(b"\n").unwrap_or(&buf);
            let text = text.strip_suffix(b"\r").unwrap_or(text);
            let start = offset;
            offset += read;
            let location = || SourceLocation {
                path: path.to_path_buf(),
                line: line_no,
                span: start..start + text.len(),
            };

            match self.classify(text) {
                Line::Blank => emitter.pending_blanks += 1,
                Line::Include(name) => {
                    emitter.close_fence()?;
                    emitter.flush_blanks()?;
                    let Ok(name) = std::str::from_utf8(name) else {
                        return Err(FormatError::at(
                            format!(
                                "file name {} is not valid UTF-8",
                                String::from_utf8_lossy(name)
                            ),
                            location(),
                        )
                        .into());
                    };
                    if !line::is_base_name(name) {
                        return Err(FormatError::at(
                            format!("file {name} should be just base name"),
                            location(),
                        )
                        .into());
                    }
                    let included = path.parent().unwrap_or(Path::new("")).join(name);
                    if let Ok(canonical) = fs::canonicalize(&included)
                        && open.contains(&canonical)
                    {
                        return Err(FormatError::at(
                            format!("inclusion cycle: {} is already being converted", name),
                            location(),
                        )
                        .into());
                    }
                    log::debug!("including {} from {}", included.display(), path.display());
                    self.convert_nested(&mut *emitter.out, &included, open)?;
                }
                Line::Prose(payload) => {
                    emitter.close_fence()?;
                    emitter.flush_blanks()?;
                    emitter.write_line(payload)?;
                }
                Line::Code(code) => {
                    emitter.flush_blanks()?;
                    emitter.open_fence()?;
                    emitter.write_line(code)?;
                }
            }
        }

        // Trailing blank lines are dropped.
        emitter.close_fence()?;
        Ok(())
    }
}

/// Convert `path` with the default marker and language.
pub fn convert_file<W: Write>(
    out: &mut W,
    path: impl AsRef<Path>,
    header: Option<&[u8]>,
) -> Result<()> {
    Converter::default().convert(out, path, header)
}

fn write_header<W: Write>(out: &mut W, header: Option<&[u8]>) -> io::Result<()> {
    match header {
        Some(header) if !header.is_empty() => out.write_all(header),
        _ => Ok(()),
    }
}

/// Per-file fence and blank-line state.
struct Emitter<'a, W: Write> {
    out: &'a mut W,
    language: &'a str,
    in_fence: bool,
    pending_blanks: usize,
}

impl<'a, W: Write> Emitter<'a, W> {
    fn new(out: &'a mut W, language: &'a str) -> Self {
        Emitter {
            out,
            language,
            in_fence: false,
            pending_blanks: 0,
        }
    }

    fn open_fence(&mut self) -> io::Result<()> {
        if !self.in_fence {
            log::trace!("open fence");
            writeln!(self.out, "{FENCE}{}", self.language)?;
            self.in_fence = true;
        }
        Ok(())
    }

    fn close_fence(&mut self) -> io::Result<()> {
        if self.in_fence {
            log::trace!("close fence");
            writeln!(self.out, "{FENCE}")?;
            self.in_fence = false;
        }
        Ok(())
    }

    fn flush_blanks(&mut self) -> io::Result<()> {
        for _ in 0..self.pending_blanks {
            self.out.write_all(b"\n")?;
        }
        self.pending_blanks = 0;
        Ok(())
    }

    fn write_line(&mut self, text: &[u8]) -> io::Result<()> {
        self.out.write_all(&untabify(text))?;
        self.out.write_all(b"\n")
    }
}
