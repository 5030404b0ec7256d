use chrono::NaiveDate;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A top-level to-do item.
///
/// Field names serialize in camelCase, which is the persisted storage format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque identifier, unique within the store
    pub id: String,
    /// Creation time in epoch milliseconds
    pub created_at: i64,
    /// Sanitized, never empty
    pub text: String,
    pub completed: bool,
    /// Calendar date without a time zone, stored as `YYYY-MM-DD`
    pub due_date: Option<NaiveDate>,
    /// Only meaningful while the task is not completed
    pub is_important: bool,
    /// Normalized: lowercase, no empties, no duplicates
    pub tags: Vec<String>,
    pub notes: String,
    pub is_archived: bool,
    /// Display order is insertion order
    pub subtasks: Vec<Subtask>,
}

/// A lightweight child item. Has no due date, tags or priority of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

/// The editable fields of a task, replaced wholesale by an edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFields {
    pub text: String,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub notes: String,
    pub is_important: bool,
}

impl Task {
    /// Create an open (not completed, not archived) task with no subtasks.
    pub fn new(id: String, created_at: i64, text: String) -> Self {
        Task {
            id,
            created_at,
            text,
            completed: false,
            due_date: None,
            is_important: false,
            tags: Vec::new(),
            notes: String::new(),
            is_archived: false,
            subtasks: Vec::new(),
        }
    }

    /// Neither completed nor archived. Open tasks form the manual-order block
    /// at the front of the list.
    pub fn is_open(&self) -> bool {
        !self.completed && !self.is_archived
    }

    /// Important and still worth attention
    pub fn is_flagged(&self) -> bool {
        self.is_important && !self.completed
    }

    /// Case-insensitive exact tag match
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn subtask(&self, id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == id)
    }

    pub fn subtask_mut(&mut self, id: &str) -> Option<&mut Subtask> {
        self.subtasks.iter_mut().find(|s| s.id == id)
    }

    /// Snapshot of the current editable fields
    pub fn fields(&self) -> TaskFields {
        TaskFields {
            text: self.text.clone(),
            due_date: self.due_date,
            tags: self.tags.clone(),
            notes: self.notes.clone(),
            is_important: self.is_important,
        }
    }
}

impl Subtask {
    pub fn new(id: String, text: String) -> Self {
        Subtask {
            id,
            text,
            completed: false,
        }
    }
}

/// Normalize one tag: lowercase, keep only `[a-z0-9_-]`. Returns `None` when
/// nothing is left.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-')
        .collect();
    if tag.is_empty() { None } else { Some(tag) }
}

/// Normalize a tag list, dropping empties and collapsing duplicates while
/// keeping first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .filter_map(|t| normalize_tag(t.as_ref()))
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect()
}
