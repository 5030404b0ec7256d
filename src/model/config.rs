use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::view::{Filter, SortMode, ViewState};

/// Configuration from config.toml. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Task data file. Default: `$XDG_DATA_HOME/taskline/tasks.json`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Defaults for a view that has never been changed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub filter: Filter,
    #[serde(default)]
    pub sort: SortMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directive, overridden by `TASKLINE_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl ViewConfig {
    pub fn initial_state(&self) -> ViewState {
        ViewState {
            filter: self.filter.clone(),
            search: String::new(),
            sort: self.sort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.storage.path.is_none());
        assert_eq!(config.view.filter, Filter::All);
        assert_eq!(config.view.sort, SortMode::Manual);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn full_config() {
        let config: Config = toml::from_str(
            r#"
[storage]
path = "/tmp/tasks.json"

[view]
filter = "important"
sort = "due-date"

[log]
level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(config.storage.path, Some(PathBuf::from("/tmp/tasks.json")));
        let state = config.view.initial_state();
        assert_eq!(state.filter, Filter::Important);
        assert_eq!(state.sort, SortMode::DueDate);
        assert!(state.search.is_empty());
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn bad_sort_is_an_error() {
        assert!(toml::from_str::<Config>("[view]\nsort = \"sideways\"\n").is_err());
    }
}
