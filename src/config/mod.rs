use crate::corpus::DEFAULT_SHARD_SUFFIX;
use crate::error::{CountError, CountResult};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;

pub const ENV_THREADS: &str = "WORDSHARD_THREADS";
pub const ENV_SHARD_SUFFIX: &str = "WORDSHARD_SHARD_SUFFIX";
pub const ENV_LOG_LEVEL: &str = "WORDSHARD_LOG_LEVEL";
pub const ENV_QUIET: &str = "WORDSHARD_QUIET";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountConfig {
    /// Worker count when none is given on the command line
    pub threads: Option<NonZeroUsize>,
    /// Only files whose names end with this are treated as shards
    pub shard_suffix: String,
    pub log_level: Option<String>,
    /// Suppress the per-shard `start`/`finish` lines
    pub quiet: bool,
}

impl Default for CountConfig {
    fn default() -> Self {
        Self {
            threads: None,
            shard_suffix: DEFAULT_SHARD_SUFFIX.to_string(),
            log_level: None,
            quiet: false,
        }
    }
}

impl CountConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(contents: &str) -> CountResult<Self> {
        let config: CountConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> CountResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Load `path` if given, then apply environment overrides.
    pub fn resolve(path: Option<&Path>) -> CountResult<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::new(),
        };
        config.merge_env_vars()?;
        Ok(config)
    }

    pub fn merge_env_vars(&mut self) -> CountResult<()> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup; split out from
    /// [`merge_env_vars`](Self::merge_env_vars) so tests need not touch the
    /// process environment.
    pub fn merge_vars<F>(&mut self, lookup: F) -> CountResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(threads) = lookup(ENV_THREADS) {
            let parsed = threads.trim().parse::<NonZeroUsize>().map_err(|_| {
                CountError::InvalidConfiguration {
                    field: ENV_THREADS.to_string(),
                    reason: format!("'{threads}' is not an integer > 0"),
                }
            })?;
            self.threads = Some(parsed);
        }

        if let Some(suffix) = lookup(ENV_SHARD_SUFFIX) {
            self.shard_suffix = suffix;
        }

        if let Some(log_level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = Some(log_level);
        }

        if let Some(quiet) = lookup(ENV_QUIET) {
            self.quiet = quiet.parse::<bool>().map_err(|_| CountError::InvalidConfiguration {
                field: ENV_QUIET.to_string(),
                reason: format!("'{quiet}' is not true or false"),
            })?;
        }

        self.validate()
    }

    pub fn validate(&self) -> CountResult<()> {
        if self.shard_suffix.is_empty() {
            return Err(CountError::InvalidConfiguration {
                field: "shard_suffix".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Explicit request, then configured value, then the machine's
    /// available parallelism.
    pub fn effective_threads(&self, requested: Option<NonZeroUsize>) -> NonZeroUsize {
        requested
            .or(self.threads)
            .or_else(|| std::thread::available_parallelism().ok())
            .unwrap_or(NonZeroUsize::MIN)
    }
}
