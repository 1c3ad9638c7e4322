use std::path::Path;

use serde::Deserialize;

use elmd::{Converter, Error, Result};
use htmlize::HtmlizeConfig;

/// Settings read from the `--config` TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prose marker and code fence language.
    pub convert: Converter,
    /// Emacs command line used by `--htmlize`.
    pub htmlize: HtmlizeConfig,
}

impl Config {
    /// Load `path`, or the built-in defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
        let config = toml::from_str(&content)
            .map_err(|e| Error::format(format!("{}: invalid config: {}", path.display(), e)))?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }
}
