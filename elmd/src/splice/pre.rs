use crate::error::{Error, Result};

const START_PRE: &[u8] = b"<pre>";
const END_PRE: &[u8] = b"</pre>\n";

/// The region from the first `<pre>` through the last `</pre>\n`, inclusive.
pub fn extract_pre(html: &[u8]) -> Result<&[u8]> {
    let start = find(html, START_PRE);
    let end = rfind(html, END_PRE);
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&html[start..end + END_PRE.len()]),
        _ => Err(Error::format("could not find <pre> and </pre> pair")),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .rposition(|window| window == needle)
}
