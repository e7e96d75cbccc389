// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Agent configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

fn default_listen_addr() -> String {
    "127.0.0.1:8081".into()
}

fn default_log_filter() -> String {
    "info".into()
}

/// Agent process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Address the job router listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Default tracing filter, overridable via `RUST_LOG`.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            log_filter: default_log_filter(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from a JSON file, or fall back to defaults when no
    /// path is given.
    ///
    /// A path that is given but unreadable or malformed is an error; a
    /// half-applied config is worse than none.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&raw)?)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_stock_agent() {
        let cfg = AgentConfig::default();
        assert_eq!(cfg.listen_addr, "127.0.0.1:8081");
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn no_path_yields_defaults() {
        let cfg = AgentConfig::load_or_default(None).expect("load");
        assert_eq!(cfg.listen_addr, "127.0.0.1:8081");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, r#"{{"listen_addr":"0.0.0.0:9100"}}"#).expect("write");

        let cfg = AgentConfig::load_or_default(Some(file.path())).expect("load");
        assert_eq!(cfg.listen_addr, "0.0.0.0:9100");
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = AgentConfig::load_or_default(Some(Path::new("/nonexistent/spoolwerk.json")));
        assert!(result.is_err());
    }
}
