use crate::model::task::TaskFields;

/// What is currently open for editing. At most one exists per store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    Task(String),
    Subtask { parent: String, id: String },
}

/// Values typed into an open editor but not yet committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draft {
    Task(TaskFields),
    Subtask(String),
}

/// An open edit, with whatever the input surface has staged so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub target: EditTarget,
    pub draft: Option<Draft>,
}

impl EditTarget {
    /// The top-level task this edit belongs to
    pub fn task_id(&self) -> &str {
        match self {
            EditTarget::Task(id) => id,
            EditTarget::Subtask { parent, .. } => parent,
        }
    }

    pub fn is_task(&self, id: &str) -> bool {
        matches!(self, EditTarget::Task(t) if t == id)
    }

    pub fn is_subtask(&self, parent_id: &str, subtask_id: &str) -> bool {
        matches!(self, EditTarget::Subtask { parent, id } if parent == parent_id && id == subtask_id)
    }

    /// True for the task itself or any of its subtasks
    pub fn touches_task(&self, id: &str) -> bool {
        self.task_id() == id
    }
}

impl EditSession {
    pub fn new(target: EditTarget) -> Self {
        EditSession {
            target,
            draft: None,
        }
    }
}
