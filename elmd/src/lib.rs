pub mod convert;
pub mod error;
pub mod splice;

pub use convert::{Converter, Line, convert_file, untabify};
pub use error::{Error, FormatError, Result, SourceLocation};
pub use splice::{CodeBlock, Document, Highlighter, extract_pre, highlight_code_blocks};
