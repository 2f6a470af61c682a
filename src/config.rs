//! Repository configuration.
//!
//! Resolution order (lowest to highest priority):
//! 1. [`RepositoryConfig::default`]
//! 2. A JSON file ([`RepositoryConfig::from_json_file`])
//! 3. Environment variables (`STORED_OPERATION_TIMEOUT_MS`, `STORED_FIND_POLICY`)
//!
//! ```ignore
//! let config = RepositoryConfig::from_json_file("repository.json")?.with_env_overrides()?;
//! let handle = StoreHandle::with_config(InMemoryStore::new(), config);
//! ```

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Environment variable overriding [`RepositoryConfig::operation_timeout_ms`].
pub const ENV_OPERATION_TIMEOUT_MS: &str = "STORED_OPERATION_TIMEOUT_MS";

/// Environment variable overriding [`RepositoryConfig::find_policy`].
pub const ENV_FIND_POLICY: &str = "STORED_FIND_POLICY";

/// What `find` does when more than one entity matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindPolicy {
    /// Several matches read as "not found".
    #[default]
    Collapse,
    /// Several matches fail with `StoreError::AmbiguousMatch`.
    Strict,
}

impl FromStr for FindPolicy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collapse" => Ok(FindPolicy::Collapse),
            "strict" => Ok(FindPolicy::Strict),
            other => Err(StoreError::config(format!(
                "unknown find policy `{other}` (expected `collapse` or `strict`)"
            ))),
        }
    }
}

/// Settings shared by every repository created from one store handle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Upper bound on each async operation. `None` or `0` disables it.
    pub operation_timeout_ms: Option<u64>,
    pub find_policy: FindPolicy,
}

impl RepositoryConfig {
    /// Rounds up to whole milliseconds, so any non-zero timeout stays enabled.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        let ms = timeout.as_nanos().div_ceil(1_000_000);
        self.operation_timeout_ms = Some(u64::try_from(ms).unwrap_or(u64::MAX));
        self
    }

    pub fn with_find_policy(mut self, policy: FindPolicy) -> Self {
        self.find_policy = policy;
        self
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn from_json_str(json: &str) -> StoreResult<Self> {
        serde_json::from_str(json).map_err(|e| StoreError::config(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| StoreError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&contents)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> StoreResult<Self> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> StoreResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> StoreResult<Self> {
        if let Some(raw) = lookup(ENV_OPERATION_TIMEOUT_MS) {
            let ms = raw.trim().parse::<u64>().map_err(|e| {
                StoreError::config(format!("{ENV_OPERATION_TIMEOUT_MS}=`{raw}`: {e}"))
            })?;
            self.operation_timeout_ms = Some(ms);
        }
        if let Some(raw) = lookup(ENV_FIND_POLICY) {
            self.find_policy = raw.parse()?;
        }
        Ok(self)
    }
}
