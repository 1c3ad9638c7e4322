/// A fenced code block lifted out of a Markdown document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBlock {
    /// Tag following the opening fence; empty for an untagged fence.
    pub language: String,
    /// Block contents, every line terminated by `\n`.
    pub input: Vec<u8>,
    /// Highlighted `<pre>...</pre>` fragment that replaces the block.
    pub output: Vec<u8>,
}

impl CodeBlock {
    pub fn new(language: impl Into<String>, input: impl Into<Vec<u8>>) -> Self {
        CodeBlock {
            language: language.into(),
            input: input.into(),
            output: Vec::new(),
        }
    }
}
