//! Runtime configuration for the directory database.

use std::{env, path::PathBuf, str::FromStr};

use crate::{errors::DirectoryError, seed::SeedSet};

/// Default SQLite file, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "healthcare.db";

/// Where the directory lives and how it is prepared on startup.
#[derive(Clone, Debug)]
pub struct DirectoryConfig {
    /// SQLite file path. `:memory:` opens a private in-memory database.
    pub db_path: PathBuf,
    /// Rows written on reset/seed.
    pub seed: SeedSet,
    /// Drop and re-seed the table on every start (`true`) or seed only when empty.
    pub reset_on_start: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            seed: SeedSet::Clinics,
            reset_on_start: true,
        }
    }
}

impl DirectoryConfig {
    /// Reads `DIRECTORY_DB_PATH`, `DIRECTORY_SEED` and `DIRECTORY_RESET`.
    ///
    /// Unset or blank variables fall back to [`DirectoryConfig::default`].
    pub fn from_env() -> Result<Self, DirectoryError> {
        Self::from_env_with_seed(SeedSet::Clinics)
    }

    /// Like [`DirectoryConfig::from_env`], with `default_seed` used when
    /// `DIRECTORY_SEED` is unset or blank.
    pub fn from_env_with_seed(default_seed: SeedSet) -> Result<Self, DirectoryError> {
        Self::from_lookup(default_seed, |key| env::var(key).ok())
    }

    fn from_lookup(
        default_seed: SeedSet,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, DirectoryError> {
        let read_var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut cfg = Self {
            seed: default_seed,
            ..Self::default()
        };

        if let Some(path) = read_var("DIRECTORY_DB_PATH") {
            cfg.db_path = PathBuf::from(path);
        }
        if let Some(seed) = read_var("DIRECTORY_SEED") {
            cfg.seed = SeedSet::from_str(&seed)?;
        }
        if let Some(raw) = read_var("DIRECTORY_RESET") {
            cfg.reset_on_start = parse_bool(&raw).ok_or_else(|| {
                DirectoryError::Config(format!("DIRECTORY_RESET: expected a boolean, got `{raw}`"))
            })?;
        }

        Ok(cfg)
    }

    pub fn is_in_memory(&self) -> bool {
        self.db_path.as_os_str() == ":memory:"
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
