//! Configuration loader and home-directory expansion.
//!
//! Uses Figment to merge built-in defaults + an optional TOML file + `LSH_*`
//! env vars. Paths beginning with `~` are expanded against the user's home.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_TYPES: &str = "txt,md";
pub const DEFAULT_INDEX_PATH: &str = "~/.lsh/lsh_index";
pub const DEFAULT_CONFIG_PATH: &str = "~/.lsh/config.toml";

/// Settings the CLI falls back to when a flag is not given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Comma-separated eligible file-name suffixes.
    pub types: String,
    /// Index location; may start with `~`.
    pub index_path: String,
    pub limit: usize,
    pub offset: usize,
    /// Stored fields returned with each hit.
    pub fields: Vec<String>,
    pub writer_memory_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            types: DEFAULT_TYPES.to_string(),
            index_path: DEFAULT_INDEX_PATH.to_string(),
            limit: 10,
            offset: 0,
            fields: vec!["Path".to_string()],
            writer_memory_bytes: 50_000_000,
        }
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Defaults, then the TOML file named by `LSH_CONFIG` (or
    /// `~/.lsh/config.toml`), then `LSH_*` environment variables.
    pub fn load() -> Result<Self> {
        let file = env::var("LSH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let file = expand_home(&file)?;
        Ok(Self::with_file(&file))
    }

    /// Same layering as [`Config::load`] with an explicit TOML file. A missing
    /// file contributes nothing.
    pub fn with_file(path: &Path) -> Self {
        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("LSH_"));
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    pub fn settings(&self) -> Result<Settings> {
        self.figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

/// Expand a leading `~` to the current user's home directory.
/// Only `~` and `~/...` expand; `~user/...` is returned unchanged, as is any
/// other input.
pub fn expand_home(input: &str) -> Result<PathBuf> {
    expand_home_with(input, dirs::home_dir)
}

/// [`expand_home`] with the home directory lookup supplied by the caller.
pub fn expand_home_with<F>(input: &str, home_dir: F) -> Result<PathBuf>
where
    F: FnOnce() -> Option<PathBuf>,
{
    if !input.starts_with('~') {
        return Ok(PathBuf::from(input));
    }
    let home = home_dir().ok_or_else(|| Error::PathExpansion {
        path: PathBuf::from(input),
        reason: "home directory could not be determined".to_string(),
    })?;
    let home = home.into_os_string().into_string().map_err(|_| Error::PathExpansion {
        path: PathBuf::from(input),
        reason: "home directory is not valid UTF-8".to_string(),
    })?;
    let expanded = shellexpand::tilde_with_context(input, || Some(home));
    Ok(PathBuf::from(expanded.as_ref()))
}
