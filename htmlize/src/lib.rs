//! Syntax highlighting of code blocks by Emacs running `htmlize` in batch
//! mode.

pub mod config;
pub mod script;

pub use config::{DEFAULT_INIT, HtmlizeConfig};

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use elmd::{CodeBlock, Error, Highlighter, Result};

/// Number of trailing stderr bytes quoted when the command fails.
const STDERR_TAIL: usize = 2048;

/// Highlights code blocks with a batch Emacs.
#[derive(Debug, Clone, Default)]
pub struct Htmlize {
    config: HtmlizeConfig,
}

impl Htmlize {
    pub fn new(config: HtmlizeConfig) -> Self {
        Htmlize { config }
    }

    pub fn config(&self) -> &HtmlizeConfig {
        &self.config
    }

    fn run(&self, script: &Path) -> Result<()> {
        let mut command = Command::new(&self.config.command);
        command.args(&self.config.args).arg(script);
        log::debug!("running {:?}", command);

        let output = command
            .output()
            .map_err(|e| Error::io_at(&self.config.command, e))?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = &output.stderr[output.stderr.len().saturating_sub(STDERR_TAIL)..];
        Err(Error::io_at(
            &self.config.command,
            io::Error::other(format!(
                "exited with {}: {}",
                output.status,
                String::from_utf8_lossy(stderr).trim_end()
            )),
        ))
    }
}

impl Highlighter for Htmlize {
    fn highlight(&self, blocks: &[CodeBlock]) -> Result<Vec<Vec<u8>>> {
        if let Some(block) = blocks.iter().find(|b| !is_valid_language(&b.language)) {
            return Err(Error::format(format!(
                "htmlize: invalid language name: {}",
                block.language
            )));
        }

        // Removed on drop, whichever way this function returns.
        let tmp = tempfile::Builder::new()
            .prefix("htmlize")
            .tempdir()
            .map_err(|e| Error::io_at(std::env::temp_dir(), e))?;
        log::debug!("highlighting {} blocks in {}", blocks.len(), tmp.path().display());

        let mut sources = Vec::with_capacity(blocks.len());
        for (i, block) in blocks.iter().enumerate() {
            let path = tmp.path().join(format!("{i:04}"));
            write_private(&path, &block.input).map_err(|e| Error::io_at(&path, e))?;
            sources.push(path);
        }

        let script_path = tmp.path().join("init.el");
        let script = script::init_script(
            &self.config.init,
            sources
                .iter()
                .map(PathBuf::as_path)
                .zip(blocks.iter().map(|b| b.language.as_str())),
        );
        write_private(&script_path, script.as_bytes())
            .map_err(|e| Error::io_at(&script_path, e))?;

        self.run(&script_path)?;

        let pages = sources
            .iter()
            .map(|source| {
                let mut html = source.clone().into_os_string();
                html.push(".html");
                let html = PathBuf::from(html);
                fs::read(&html).map_err(|e| Error::io_at(&html, e))
            })
            .collect::<Result<Vec<_>>>()?;
        log::info!("highlighted {} code blocks", pages.len());
        Ok(pages)
    }
}

/// Language tags become Emacs mode names, so only ASCII letters, `-` and
/// `/` are accepted. Non-ASCII letters and combining marks are rejected.
/// The empty tag is valid.
pub fn is_valid_language(name: &str) -> bool {
    name.bytes()
        .all(|b| b.is_ascii_alphabetic() || b == b'-' || b == b'/')
}

fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)?.write_all(contents)
}
