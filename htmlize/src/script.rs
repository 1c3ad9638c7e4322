use std::fmt::Write;
use std::path::Path;

/// Highlights one file in the given major mode and writes `<file>.html`.
const HELPER: &str = r#"
(defun my-htmlize-file (filename mode-function)
  (find-file filename)
  (funcall mode-function)
  (font-lock-ensure)
  (with-current-buffer (htmlize-buffer)
    (write-file (concat filename ".html"))))
"#;

/// Build the init script that highlights `files`, each paired with its
/// language tag. An empty tag leaves the mode choice to `htmlize-file`.
pub fn init_script<'a, I>(init: &str, files: I) -> String
where
    I: IntoIterator<Item = (&'a Path, &'a str)>,
{
    let mut script = String::from(HELPER);
    script.push_str(init);
    script.push_str("(progn\n");
    for (path, language) in files {
        let path = lisp_string(&path.to_string_lossy());
        // Writing into a String cannot fail.
        let _ = if language.is_empty() {
            writeln!(script, "(htmlize-file {path})")
        } else {
            writeln!(script, "(my-htmlize-file {path} '{language}-mode)")
        };
    }
    script.push_str(")\n");
    script
}

fn lisp_string(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
