use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use xlm_engine::EngineConfig;

/// Worker configuration file.
///
/// ```toml
/// log_filter = "xlm_engine=debug,info"
///
/// [engine]
/// save_reply_timeout = 600
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub engine: EngineConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".into(),
            engine: EngineConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let config = WorkerConfig::load(None).unwrap();
        assert_eq!(config, WorkerConfig::default());
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn loads_nested_engine_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xlmerge.toml");
        std::fs::write(
            &path,
            "log_filter = \"debug\"\n[engine]\nsuggested_name_prefix = \"combined\"\nsave_reply_timeout = 5\n",
        )
        .unwrap();

        let config = WorkerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.engine.suggested_name_prefix, "combined");
        assert_eq!(config.engine.save_reply_timeout, Some(5));
        assert_eq!(config.engine.default_extension, "xlsx");
    }

    #[test]
    fn rejects_unknown_keys_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "verbose = true\n").unwrap();
        assert!(WorkerConfig::load(Some(&path)).is_err());
        assert!(WorkerConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
