//! Replace the fenced code blocks of a Markdown document with highlighted
//! HTML.
//!
//! The document is split into text segments and code blocks, the blocks
//! are handed to a [`Highlighter`] in one batch, and the results are
//! written back between the untouched segments.

mod code_block;
mod pre;

pub use code_block::CodeBlock;
pub use pre::extract_pre;

use std::io::{BufRead, Write};

use crate::error::{Error, Result};

const FENCE: &[u8] = b"```";

/// A batch syntax highlighter.
pub trait Highlighter {
    /// Return one raw HTML page per block, in the order given. The page
    /// must contain the highlighted text inside a `<pre>` element.
    fn highlight(&self, blocks: &[CodeBlock]) -> Result<Vec<Vec<u8>>>;
}

/// A Markdown document split around its fenced code blocks.
///
/// `segments` always holds one more entry than `blocks`: segment `i` comes
/// right before block `i`, and the last segment follows the last block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub segments: Vec<Vec<u8>>,
    pub blocks: Vec<CodeBlock>,
}

impl Document {
    /// Split `reader` on lines starting with three backticks. The fence
    /// lines themselves are dropped.
    pub fn parse<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut segments = Vec::new();
        let mut blocks = Vec::new();
        let mut in_block = false;
        let mut language = String::new();
        let mut current = Vec::new();
        let mut line = Vec::new();

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            let text = line.strip_suffix(b"\n").unwrap_or(&line);
            let text = text.strip_suffix(b"\r").unwrap_or(text);

            if let Some(tag) = text.strip_prefix(FENCE) {
                let content = std::mem::take(&mut current);
                if in_block {
                    blocks.push(CodeBlock::new(std::mem::take(&mut language), content));
                } else {
                    segments.push(content);
                    language = String::from_utf8_lossy(tag).into_owned();
                }
                in_block = !in_block;
                continue;
            }
            current.extend_from_slice(text);
            current.push(b'\n');
        }

        if in_block {
            return Err(Error::format("last code block was not closed"));
        }
        segments.push(current);
        log::debug!("found {} code blocks", blocks.len());
        Ok(Document { segments, blocks })
    }

    /// Run every block through `highlighter` in a single batch and keep the
    /// `<pre>` region of each result as the block's output.
    pub fn highlight<H: Highlighter + ?Sized>(&mut self, highlighter: &H) -> Result<()> {
        if self.blocks.is_empty() {
            return Ok(());
        }
        let pages = highlighter.highlight(&self.blocks)?;
        if pages.len() != self.blocks.len() {
            return Err(Error::format(format!(
                "highlighter returned {} results for {} code blocks",
                pages.len(),
                self.blocks.len()
            )));
        }
        for (block, page) in self.blocks.iter_mut().zip(&pages) {
            block.output = extract_pre(page)?.to_vec();
        }
        Ok(())
    }

    /// Write segments and block outputs interleaved in document order.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        for (segment, block) in self.segments.iter().zip(&self.blocks) {
            out.write_all(segment)?;
            out.write_all(&block.output)?;
        }
        if let Some(last) = self.segments.last() {
            out.write_all(last)?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Read Markdown from `reader`, highlight its code blocks and write the
/// result to `out`. Nothing is written unless every block was highlighted.
pub fn highlight_code_blocks<R, W, H>(out: &mut W, reader: R, highlighter: &H) -> Result<()>
where
    R: BufRead,
    W: Write,
    H: Highlighter + ?Sized,
{
    let mut document = Document::parse(reader)?;
    document.highlight(highlighter)?;
    document.write_to(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    /// Wraps each block in a minimal HTML page.
    struct PreWrap {
        calls: Cell<usize>,
    }

    impl PreWrap {
        fn new() -> Self {
            PreWrap {
                calls: Cell::new(0),
            }
        }
    }

    impl Highlighter for PreWrap {
        fn highlight(&self, blocks: &[CodeBlock]) -> Result<Vec<Vec<u8>>> {
            self.calls.set(self.calls.get() + 1);
            Ok(blocks
                .iter()
                .map(|block| {
                    let mut page =
                        format!("<html><body>\n<pre><!-- {} -->", block.language).into_bytes();
                    page.extend_from_slice(&block.input);
                    page.extend_from_slice(b"</pre>\n</body></html>\n");
                    page
                })
                .collect())
        }
    }

    struct Broken;

    impl Highlighter for Broken {
        fn highlight(&self, blocks: &[CodeBlock]) -> Result<Vec<Vec<u8>>> {
            Ok(vec![b"<body>no pre here</body>\n".to_vec(); blocks.len()])
        }
    }

    struct Short;

    impl Highlighter for Short {
        fn highlight(&self, _blocks: &[CodeBlock]) -> Result<Vec<Vec<u8>>> {
            Ok(Vec::new())
        }
    }

    const MARKDOWN: &str = "+++\ntitle = \"x\"\n+++\n\nIntro\n```emacs-lisp\n(a)\n\n(b)\n```\nMiddle\n```\nplain\n```\n```sh\nls\n```\nEnd\n";

    fn parse(markdown: &str) -> Document {
        Document::parse(markdown.as_bytes()).expect("parse failed")
    }

    #[test]
    fn splits_segments_and_blocks() {
        let doc = parse(MARKDOWN);
        assert_eq!(doc.segments.len(), doc.blocks.len() + 1);
        assert_eq!(
            doc.blocks,
            vec![
                CodeBlock::new("emacs-lisp", "(a)\n\n(b)\n"),
                CodeBlock::new("", "plain\n"),
                CodeBlock::new("sh", "ls\n"),
            ]
        );
        assert_eq!(doc.segments[0], b"+++\ntitle = \"x\"\n+++\n\nIntro\n");
        assert_eq!(doc.segments[1], b"Middle\n");
        assert_eq!(doc.segments[2], b"");
        assert_eq!(doc.segments[3], b"End\n");
    }

    #[test]
    fn concatenation_reconstructs_input_without_fences() {
        let doc = parse(MARKDOWN);
        let mut joined = Vec::new();
        for (segment, block) in doc.segments.iter().zip(&doc.blocks) {
            joined.extend_from_slice(segment);
            joined.extend_from_slice(&block.input);
        }
        joined.extend_from_slice(doc.segments.last().unwrap());
        let expected: String = MARKDOWN
            .lines()
            .filter(|line| !line.starts_with("```"))
            .map(|line| format!("{line}\n"))
            .collect();
        assert_eq!(String::from_utf8(joined).unwrap(), expected);
    }

    #[test]
    fn document_without_blocks() {
        let doc = parse("just\ntext");
        assert!(doc.blocks.is_empty());
        assert_eq!(doc.segments, vec![b"just\ntext\n".to_vec()]);

        let empty = parse("");
        assert_eq!(empty.segments, vec![Vec::new()]);
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let err = Document::parse("a\n```emacs-lisp\n(a)\n".as_bytes()).unwrap_err();
        assert!(err.is_format());
        assert!(err.to_string().contains("not closed"));
    }

    #[test]
    fn splices_highlighted_blocks_in_order() {
        let highlighter = PreWrap::new();
        let mut out = Vec::new();
        highlight_code_blocks(&mut out, MARKDOWN.as_bytes(), &highlighter).unwrap();
        assert_eq!(highlighter.calls.get(), 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "+++\ntitle = \"x\"\n+++\n\nIntro\n\
             <pre><!-- emacs-lisp -->(a)\n\n(b)\n</pre>\n\
             Middle\n\
             <pre><!--  -->plain\n</pre>\n\
             <pre><!-- sh -->ls\n</pre>\n\
             End\n"
        );
    }

    #[test]
    fn no_blocks_skips_highlighter() {
        let highlighter = PreWrap::new();
        let mut out = Vec::new();
        highlight_code_blocks(&mut out, "only text\n".as_bytes(), &highlighter).unwrap();
        assert_eq!(highlighter.calls.get(), 0);
        assert_eq!(out, b"only text\n");
    }

    #[test]
    fn missing_pre_fails_whole_document() {
        let mut out = Vec::new();
        let err = highlight_code_blocks(&mut out, MARKDOWN.as_bytes(), &Broken).unwrap_err();
        assert!(err.to_string().contains("<pre>"));
        assert!(out.is_empty());
    }

    #[test]
    fn result_count_must_match() {
        let mut doc = parse(MARKDOWN);
        let err = doc.highlight(&Short).unwrap_err();
        assert!(err.is_format());
    }
}
