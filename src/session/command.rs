use crate::model::task::TaskFields;
use crate::model::view::{Filter, SortMode};
use crate::ops::edit::EditTarget;
use crate::ops::store::{Placement, TaskError};
use crate::parse::ParseError;

/// One user intent, as produced by any input surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Parse a raw input line and add the resulting task
    AddTask(String),
    ToggleCompletion(String),
    TogglePriority(String),
    EnterEdit(String),
    /// Record in-progress values for the open task edit
    StageEdit(TaskFields),
    CommitEdit(String, TaskFields),
    /// Replace a task's fields without an edit session
    EditTask(String, TaskFields),
    CancelEdit,
    DeleteTask(String),
    ArchiveCompleted,
    UnarchiveTask(String),
    AddSubtask {
        parent: String,
        text: String,
    },
    ToggleSubtask {
        parent: String,
        id: String,
    },
    EnterSubtaskEdit {
        parent: String,
        id: String,
    },
    StageSubtaskEdit(String),
    CommitSubtaskEdit {
        parent: String,
        id: String,
        text: String,
    },
    /// Replace a subtask's text without an edit session
    EditSubtask {
        parent: String,
        id: String,
        text: String,
    },
    DeleteSubtask {
        parent: String,
        id: String,
    },
    SetFilter(Filter),
    SetSearchTerm(String),
    SetSortMode(SortMode),
    Reorder {
        id: String,
        target: Option<String>,
        placement: Placement,
    },
}

/// What a command changed. Listeners receive these after every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    TaskAdded(String),
    TaskUpdated(String),
    TaskDeleted(String),
    TasksArchived(Vec<String>),
    TaskUnarchived(String),
    TaskMoved(String),
    SubtaskAdded { parent: String, id: String },
    SubtaskUpdated { parent: String, id: String },
    SubtaskDeleted { parent: String, id: String },
    EditOpened(EditTarget),
    EditClosed(EditTarget),
    /// Filter, search term or sort mode changed
    ViewChanged,
}

impl Change {
    /// True when the persisted task collection is affected
    pub fn touches_tasks(&self) -> bool {
        !matches!(
            self,
            Change::EditOpened(_) | Change::EditClosed(_) | Change::ViewChanged
        )
    }

    /// The change recorded when an edit on `target` is applied
    pub fn updated(target: EditTarget) -> Self {
        match target {
            EditTarget::Task(id) => Change::TaskUpdated(id),
            EditTarget::Subtask { parent, id } => Change::SubtaskUpdated { parent, id },
        }
    }
}

/// Why a command was not applied. Nothing changes when one is returned.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Rejected(#[from] TaskError),
}
