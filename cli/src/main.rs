mod config;
mod header;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use elmd::{Error, FormatError, Result, highlight_code_blocks};
use htmlize::Htmlize;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "elmd", version, about = "Literate Emacs Lisp to Markdown")]
struct Cli {
    /// Annotated source file to convert
    input: PathBuf,

    /// Output file (default: standard output)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep the +++ header of the existing output file
    #[arg(short = 'H', long)]
    preserve_header: bool,

    /// Run htmlize on code blocks
    #[arg(long)]
    htmlize: bool,

    /// TOML file overriding the marker, fence language and Emacs command
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable colored error output
    #[arg(long)]
    no_color: bool,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let result = Config::load(cli.config.as_deref()).and_then(|config| run(&cli, &config));
    if let Err(error) = result {
        report(&error, color_choice);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn run(cli: &Cli, config: &Config) -> Result<()> {
    let Some(output) = &cli.output else {
        if cli.preserve_header {
            log::warn!("--preserve-header has no effect without --output");
        }
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        return convert(cli, config, &mut out, None);
    };

    // The header has to be read before the file is truncated.
    let header = if cli.preserve_header {
        Some(header::read_header(output)?)
    } else {
        None
    };
    let file = File::create(output).map_err(|e| Error::io_at(output, e))?;
    let mut out = BufWriter::new(file);
    let result = convert(cli, config, &mut out, header.as_deref());
    let closed = close(out).map_err(|e| Error::io_at(output, e));

    match (result, closed) {
        (Ok(()), closed) => closed,
        (Err(error), Err(close_error)) => {
            log::error!("{close_error}");
            Err(error)
        }
        (Err(error), Ok(())) => Err(error),
    }
}

fn convert<W: Write>(
    cli: &Cli,
    config: &Config,
    out: &mut W,
    header: Option<&[u8]>,
) -> Result<()> {
    if !cli.htmlize {
        return config.convert.convert(out, &cli.input, header);
    }
    let mut markdown = Vec::new();
    config.convert.convert(&mut markdown, &cli.input, header)?;
    let htmlize = Htmlize::new(config.htmlize.clone());
    highlight_code_blocks(out, markdown.as_slice(), &htmlize)
}

/// Flush buffered output and make sure it reached the disk.
fn close(out: BufWriter<File>) -> io::Result<()> {
    let file = out.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

fn report(error: &Error, color_choice: ColorChoice) {
    if let Error::Format(format) = error
        && emit_located(format, color_choice).is_ok()
    {
        return;
    }
    eprintln!("error: {}", error);
}

/// Render a format error against its source line. Fails when the error has
/// no location or the source cannot be read back.
fn emit_located(error: &FormatError, color_choice: ColorChoice) -> io::Result<()> {
    let location = error
        .location
        .as_ref()
        .ok_or_else(|| io::Error::other("no location"))?;
    let source = std::fs::read_to_string(&location.path)?;

    let mut files = SimpleFiles::new();
    let file_id = files.add(location.path.display().to_string(), source);
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    term::emit_to_write_style(&mut writer.lock(), &config, &files, &error.to_diagnostic(file_id))
        .map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn cli(input: PathBuf, output: Option<PathBuf>, preserve_header: bool) -> Cli {
        Cli {
            input,
            output,
            preserve_header,
            htmlize: false,
            config: None,
            no_color: true,
            verbose: 0,
        }
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from(["elmd", "-H", "-o", "out.md", "--htmlize", "init.el"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("init.el"));
        assert_eq!(cli.output, Some(PathBuf::from("out.md")));
        assert!(cli.preserve_header);
        assert!(cli.htmlize);
        assert!(Cli::try_parse_from(["elmd"]).is_err());
    }

    #[test]
    fn writes_output_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("init.el");
        let output = dir.path().join("init.md");
        fs::write(&input, ";;; # Init\n(setq a 1)\n").unwrap();

        run(&cli(input, Some(output.clone()), false), &Config::default()).unwrap();
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "# Init\n```emacs-lisp\n(setq a 1)\n```\n"
        );
    }

    #[test]
    fn preserves_existing_header() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("init.el");
        let output = dir.path().join("init.md");
        fs::write(&input, ";;; Body\n").unwrap();
        fs::write(&output, "+++\ntitle = \"Init\"\n+++\n\nStale body\n").unwrap();

        run(&cli(input, Some(output.clone()), true), &Config::default()).unwrap();
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "+++\ntitle = \"Init\"\n+++\n\nBody\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn highlighting_keeps_preserved_header() {
        // Stands in for Emacs: wraps every numbered source in a <pre> page.
        const FAKE_EMACS: &str = r#"
for f in "$(dirname "$1")"/[0-9][0-9][0-9][0-9]; do
  { printf '<html>\n<pre>\n'; cat "$f"; printf '</pre>\n</html>\n'; } > "$f.html"
done
"#;
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("init.el");
        let output = dir.path().join("init.md");
        fs::write(&input, ";;; Body\n(setq a 1)\n;;; End\n").unwrap();
        fs::write(&output, "+++\ntitle = \"Init\"\n+++\n\nStale body\n").unwrap();

        let config = Config {
            htmlize: htmlize::HtmlizeConfig {
                command: "sh".to_string(),
                args: vec!["-c".to_string(), FAKE_EMACS.to_string(), "fake-emacs".to_string()],
                init: String::new(),
            },
            ..Config::default()
        };
        let mut cli = cli(input, Some(output.clone()), true);
        cli.htmlize = true;

        run(&cli, &config).unwrap();
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "+++\ntitle = \"Init\"\n+++\n\nBody\n<pre>\n(setq a 1)\n</pre>\nEnd\n"
        );
    }

    #[test]
    fn missing_header_leaves_output_untouched() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("init.el");
        let output = dir.path().join("init.md");
        fs::write(&input, ";;; Body\n").unwrap();
        fs::write(&output, "no header here\n").unwrap();

        let err = run(&cli(input, Some(output.clone()), true), &Config::default()).unwrap_err();
        assert!(err.is_format());
        assert_eq!(fs::read_to_string(&output).unwrap(), "no header here\n");
    }

    #[test]
    fn conversion_error_is_returned() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("init.el");
        let output = dir.path().join("init.md");
        fs::write(&input, ";;; {{../escape.el}}\n").unwrap();

        let err = run(&cli(input, Some(output), false), &Config::default()).unwrap_err();
        assert!(err.is_format());
    }
}
