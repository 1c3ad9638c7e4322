use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use elmd::{Error, Result};

const DELIMITER: &[u8] = b"+++";

/// Read the `+++`-delimited header at the top of an existing output file.
///
/// The header must start on the first line. The returned bytes end with the
/// closing delimiter followed by one blank line.
pub fn read_header(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|e| Error::io_at(path, e))?;
    let mut reader = BufReader::new(file);
    let mut header = Vec::new();
    let mut line = Vec::new();
    let mut delimiters = 0;

    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| Error::io_at(path, e))?;
        if read == 0 {
            break;
        }
        let text = line.strip_suffix(b"\n").unwrap_or(&line);
        let text = text.strip_suffix(b"\r").unwrap_or(text);
        if text.trim_ascii() == DELIMITER {
            delimiters += 1;
        }
        if delimiters == 0 {
            break;
        }
        header.extend_from_slice(text);
        header.push(b'\n');
        if delimiters == 2 {
            header.push(b'\n');
            return Ok(header);
        }
    }

    let message = if delimiters == 0 {
        format!("file {} does not start with a header", path.display())
    } else {
        format!("header of {} is not closed by +++", path.display())
    };
    Err(Error::format(message))
}
