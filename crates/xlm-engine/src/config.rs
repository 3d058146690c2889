use std::time::Duration;

use serde::{Deserialize, Serialize};
use xlm_types::{FileFormat, DEFAULT_MAX_ATTEMPTS};

/// Configuration for a merge run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Extension appended to save targets and suggested names that lack one.
    pub default_extension: String,
    /// Leading component of generated suggested names.
    pub suggested_name_prefix: String,
    /// Suffix probes the sheet-name resolver tries before giving up.
    pub max_name_attempts: u32,
    /// Seconds to wait for the controller's save decision. `None` waits
    /// indefinitely.
    pub save_reply_timeout: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_extension: FileFormat::Xlsx.extension().to_string(),
            suggested_name_prefix: "merged".to_string(),
            max_name_attempts: DEFAULT_MAX_ATTEMPTS,
            save_reply_timeout: None,
        }
    }
}

impl EngineConfig {
    pub fn reply_timeout(&self) -> Option<Duration> {
        self.save_reply_timeout.map(Duration::from_secs)
    }

    /// The default extension without a leading dot.
    pub fn extension(&self) -> &str {
        self.default_extension.trim_start_matches('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.extension(), "xlsx");
        assert_eq!(config.max_name_attempts, 10_000);
        assert!(config.reply_timeout().is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: EngineConfig = toml::from_str("save_reply_timeout = 30").unwrap();
        assert_eq!(config.reply_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.suggested_name_prefix, "merged");
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(toml::from_str::<EngineConfig>("colour = \"red\"").is_err());
    }
}
