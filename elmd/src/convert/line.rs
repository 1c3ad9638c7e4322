use std::borrow::Cow;

/// Width a single leading tab expands to.
pub const TAB_WIDTH: usize = 8;

/// A source line after classification. Lines are bytes: only the marker
/// and the inclusion braces have to be ASCII.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// An empty line. Whitespace-only lines are code.
    Blank,
    /// Prose payload with the marker and one following space removed.
    Prose(&'a [u8]),
    /// `{{name}}` inclusion directive; holds the raw name between the braces.
    Include(&'a [u8]),
    Code(&'a [u8]),
}

pub(crate) fn classify<'a>(line: &'a [u8], marker: &[u8]) -> Line<'a> {
    if line.is_empty() {
        return Line::Blank;
    }
    let Some(rest) = line.strip_prefix(marker) else {
        return Line::Code(line);
    };
    if let Some(name) = rest
        .strip_prefix(b" {{")
        .and_then(|inner| inner.strip_suffix(b"}}"))
    {
        return Line::Include(name);
    }
    Line::Prose(rest.strip_prefix(b" ").unwrap_or(rest))
}

/// Expand the strictly leading run of tabs, [`TAB_WIDTH`] spaces each.
pub fn untabify(line: &[u8]) -> Cow<'_, [u8]> {
    let tabs = line.iter().take_while(|&&b| b == b'\t').count();
    if tabs == 0 {
        return Cow::Borrowed(line);
    }
    let mut expanded = vec![b' '; tabs * TAB_WIDTH];
    expanded.extend_from_slice(&line[tabs..]);
    Cow::Owned(expanded)
}

/// An included file must be named by its base name alone.
pub(crate) fn is_base_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.chars().any(std::path::is_separator)
}
