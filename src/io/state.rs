use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::io::storage::{StorageError, atomic_write};
use crate::model::view::ViewState;
use crate::session::{Change, ChangeListener, Snapshot};

const VIEW_STATE_FILE: &str = "view_state.json";

/// The view state file lives next to the task data file
pub fn view_state_path(data_path: &Path) -> PathBuf {
    data_path.with_file_name(VIEW_STATE_FILE)
}

/// Read the saved view state. Missing or malformed files yield `None`.
pub fn read_view_state(path: &Path) -> Option<ViewState> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(state) => Some(state),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "ignoring unreadable view state");
            None
        }
    }
}

pub fn write_view_state(path: &Path, state: &ViewState) -> Result<(), StorageError> {
    let content = serde_json::to_string_pretty(state)?;
    let write_err = |source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    atomic_write(path, content.as_bytes()).map_err(write_err)
}

/// Writes the view state whenever filter, search or sort changes
#[derive(Debug, Clone)]
pub struct ViewStatePersister {
    path: PathBuf,
}

impl ViewStatePersister {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ViewStatePersister { path: path.into() }
    }
}

impl ChangeListener for ViewStatePersister {
    fn on_change(&mut self, changes: &[Change], snapshot: &Snapshot<'_>) -> Result<(), StorageError> {
        if changes.contains(&Change::ViewChanged) {
            write_view_state(&self.path, snapshot.view)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::view::{Filter, SortMode};
    use tempfile::TempDir;

    #[test]
    fn write_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = view_state_path(&dir.path().join("tasks.json"));
        let state = ViewState {
            filter: Filter::Tag("work".into()),
            search: "report".into(),
            sort: SortMode::DueDate,
        };
        write_view_state(&path, &state).unwrap();
        assert_eq!(read_view_state(&path), Some(state));
        assert!(dir.path().join("view_state.json").exists());
    }

    #[test]
    fn read_missing_file_returns_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_view_state(&dir.path().join("view_state.json")).is_none());
    }

    #[test]
    fn read_malformed_json_returns_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("view_state.json");
        fs::write(&path, "not json {{{").unwrap();
        assert!(read_view_state(&path).is_none());
    }

    #[test]
    fn serde_defaults_on_partial_object() {
        let state: ViewState = serde_json::from_str(r#"{"sort":"priority"}"#).unwrap();
        assert_eq!(state.filter, Filter::All);
        assert_eq!(state.search, "");
        assert_eq!(state.sort, SortMode::Priority);
    }
}
