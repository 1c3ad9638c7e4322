use serde::Deserialize;

/// Emacs packages loaded before any block is highlighted.
pub const DEFAULT_INIT: &str = "
(package-initialize)
(require 'use-package nil t)
(add-hook 'emacs-lisp-mode-hook #'paren-face-mode)
";

/// How to run the highlighting Emacs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HtmlizeConfig {
    /// Program to run.
    pub command: String,
    /// Arguments placed before the path of the generated init script.
    pub args: Vec<String>,
    /// Lisp evaluated after the helper definitions and before highlighting.
    pub init: String,
}

impl Default for HtmlizeConfig {
    fn default() -> Self {
        HtmlizeConfig {
            command: "emacs".to_string(),
            args: vec!["--batch".to_string(), "-l".to_string()],
            init: DEFAULT_INIT.to_string(),
        }
    }
}
