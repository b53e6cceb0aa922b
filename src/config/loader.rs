use crate::config::schema::{RulesConfig, ValidationError};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where a set of rules was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulesOrigin {
    Inline,
    File(PathBuf),
}

impl fmt::Display for RulesOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulesOrigin::Inline => f.write_str("inline rules"),
            RulesOrigin::File(path) => write!(f, "rules file {}", path.display()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read rules file {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    /// Not TOML, or not shaped as `[options]` plus `[[rules]]`.
    #[error("malformed {origin}: {source}")]
    Parse {
        origin: RulesOrigin,
        source: toml_edit::de::Error,
    },

    /// Parsed, but some rules can never be compiled.
    #[error("{origin} rejected:\n{source}")]
    Invalid {
        origin: RulesOrigin,
        source: ValidationError,
    },
}

impl ConfigError {
    /// The rules file involved, if the rules came from one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. } => Some(path),
            ConfigError::Parse { origin, .. } | ConfigError::Invalid { origin, .. } => {
                match origin {
                    RulesOrigin::File(path) => Some(path),
                    RulesOrigin::Inline => None,
                }
            }
        }
    }
}

pub fn load_from_str(input: &str) -> Result<RulesConfig, ConfigError> {
    parse_rules(input, RulesOrigin::Inline)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RulesConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_rules(&contents, RulesOrigin::File(path.to_path_buf()))?;
    tracing::debug!(path = %path.display(), rules = config.rules.len(), "loaded rules file");
    Ok(config)
}

fn parse_rules(input: &str, origin: RulesOrigin) -> Result<RulesConfig, ConfigError> {
    let config: RulesConfig = match toml_edit::de::from_str(input) {
        Ok(config) => config,
        Err(source) => return Err(ConfigError::Parse { origin, source }),
    };
    match config.validate() {
        Ok(()) => Ok(config),
        Err(source) => Err(ConfigError::Invalid { origin, source }),
    }
}
