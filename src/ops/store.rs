use tracing::debug;
use uuid::Uuid;

use crate::model::now::Now;
use crate::model::task::{Subtask, Task, TaskFields, normalize_tags};
use crate::model::view::SortMode;
use crate::ops::edit::{Draft, EditSession, EditTarget};
use crate::parse::ParsedTask;
use crate::util::text::{sanitize_line, sanitize_notes};

/// Error type for task store operations. The store is unchanged whenever one
/// of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("subtask not found: {0}")]
    SubtaskNotFound(String),
    #[error("task is archived: {0}")]
    Archived(String),
    #[error("task is completed: {0}")]
    Completed(String),
    #[error("currently being edited: {0}")]
    BeingEdited(String),
    #[error("text cannot be empty")]
    EmptyText,
    #[error("tasks can only be reordered in manual sort mode")]
    NotManualSort,
    #[error("nothing is open for editing")]
    NotEditing,
    #[error("invalid reorder target: {0}")]
    InvalidTarget(String),
}

/// Where a reordered task lands relative to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Before the target, or at the very top when there is no target
    Before,
    /// After the target, or at the end of the open block when there is none
    After,
}

/// The ordered task collection plus the single open edit.
///
/// Vector position is the canonical manual order. Open tasks are expected to
/// sit in front of completed and archived ones; new and moved tasks are kept
/// out of that trailing block.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    editing: Option<EditSession>,
    last_created_at: i64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a collection that has already been normalized by the loader.
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let last_created_at = tasks.iter().map(|t| t.created_at).max().unwrap_or(0);
        TaskStore {
            tasks,
            editing: None,
            last_created_at,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// The target currently open for editing, if any
    pub fn editing(&self) -> Option<&EditTarget> {
        self.editing.as_ref().map(|s| &s.target)
    }

    pub fn edit_session(&self) -> Option<&EditSession> {
        self.editing.as_ref()
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Create a task from parsed input and return its id.
    ///
    /// In manual sort mode the task goes right before the first completed or
    /// archived task (the end of the list if there is none); in every other
    /// mode it is prepended.
    pub fn add_task(&mut self, parsed: ParsedTask, now: Now, sort: SortMode) -> String {
        let id = self.fresh_id();
        let created_at = self.next_created_at(now.timestamp_ms);
        let mut task = Task::new(id.clone(), created_at, parsed.text);
        task.tags = normalize_tags(parsed.tags);
        task.is_important = parsed.is_important;
        task.due_date = parsed.due_date;

        let index = if sort == SortMode::Manual {
            self.open_block_end()
        } else {
            0
        };
        self.tasks.insert(index, task);
        id
    }

    /// Flip completion. Returns the new value.
    pub fn toggle_completion(&mut self, id: &str) -> Result<bool, TaskError> {
        let index = self.position(id)?;
        if self.tasks[index].is_archived {
            return Err(TaskError::Archived(id.to_string()));
        }
        self.ensure_not_editing_task(id)?;
        let task = &mut self.tasks[index];
        task.completed = !task.completed;
        Ok(task.completed)
    }

    /// Flip the importance flag of an open task. Returns the new value.
    pub fn toggle_priority(&mut self, id: &str) -> Result<bool, TaskError> {
        let index = self.position(id)?;
        ensure_open(&self.tasks[index])?;
        self.ensure_not_editing_task(id)?;
        let task = &mut self.tasks[index];
        task.is_important = !task.is_important;
        Ok(task.is_important)
    }

    /// Replace a task's editable fields wholesale.
    pub fn edit_task(&mut self, id: &str, fields: TaskFields) -> Result<(), TaskError> {
        let index = self.position(id)?;
        ensure_open(&self.tasks[index])?;
        let text = sanitize_line(&fields.text);
        if text.is_empty() {
            return Err(TaskError::EmptyText);
        }

        let task = &mut self.tasks[index];
        task.text = text;
        task.due_date = fields.due_date;
        task.tags = normalize_tags(&fields.tags);
        task.notes = sanitize_notes(&fields.notes);
        task.is_important = fields.is_important;
        Ok(())
    }

    /// Permanently remove a task and its subtasks. Any open edit on it is
    /// discarded.
    pub fn delete_task(&mut self, id: &str) -> Result<Task, TaskError> {
        let index = self.position(id)?;
        if self.editing().is_some_and(|t| t.touches_task(id)) {
            self.editing = None;
        }
        Ok(self.tasks.remove(index))
    }

    /// Archive exactly those of `ids` that are completed and not yet archived.
    /// Returns the ids that were archived.
    pub fn archive_tasks(&mut self, ids: &[String]) -> Vec<String> {
        let mut archived = Vec::new();
        for task in &mut self.tasks {
            if task.completed && !task.is_archived && ids.contains(&task.id) {
                task.is_archived = true;
                archived.push(task.id.clone());
            }
        }
        if self
            .editing()
            .is_some_and(|t| archived.iter().any(|id| t.touches_task(id)))
        {
            self.editing = None;
        }
        archived
    }

    /// Archive every completed, non-archived task.
    pub fn archive_completed(&mut self) -> Vec<String> {
        let ids: Vec<String> = self
            .tasks
            .iter()
            .filter(|t| t.completed && !t.is_archived)
            .map(|t| t.id.clone())
            .collect();
        self.archive_tasks(&ids)
    }

    /// Bring an archived task back. Its completion state is untouched.
    pub fn unarchive_task(&mut self, id: &str) -> Result<(), TaskError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.is_archived)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        task.is_archived = false;
        Ok(())
    }

    /// Move an open task next to another open task (or to the top / end of the
    /// open block when `target` is `None`). Only legal in manual sort mode.
    /// The task never lands inside the completed/archived block.
    pub fn reorder(
        &mut self,
        id: &str,
        target: Option<&str>,
        placement: Placement,
        sort: SortMode,
    ) -> Result<(), TaskError> {
        if sort != SortMode::Manual {
            return Err(TaskError::NotManualSort);
        }
        let from = self.position(id)?;
        ensure_open(&self.tasks[from])?;

        // Target index as it will be once the moved task is out of the list
        let target_index = match target {
            Some(target_id) => {
                if target_id == id {
                    return Err(TaskError::InvalidTarget(target_id.to_string()));
                }
                let index = self.position(target_id)?;
                if !self.tasks[index].is_open() {
                    return Err(TaskError::InvalidTarget(target_id.to_string()));
                }
                Some(if index > from { index - 1 } else { index })
            }
            None => None,
        };

        let task = self.tasks.remove(from);
        let boundary = self.open_block_end();
        let index = match (target_index, placement) {
            (Some(t), Placement::Before) => t,
            (Some(t), Placement::After) => t + 1,
            (None, Placement::Before) => 0,
            (None, Placement::After) => boundary,
        };
        self.tasks.insert(index.min(boundary), task);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Subtasks
    // -----------------------------------------------------------------------

    /// Append a subtask to an open task. Returns the new subtask id.
    pub fn add_subtask(&mut self, parent_id: &str, text: &str) -> Result<String, TaskError> {
        let index = self.position(parent_id)?;
        ensure_open(&self.tasks[index])?;
        let text = sanitize_line(text);
        if text.is_empty() {
            return Err(TaskError::EmptyText);
        }
        let id = self.fresh_id();
        self.tasks[index]
            .subtasks
            .push(Subtask::new(id.clone(), text));
        Ok(id)
    }

    /// Flip a subtask's completion. Returns the new value.
    pub fn toggle_subtask(&mut self, parent_id: &str, subtask_id: &str) -> Result<bool, TaskError> {
        if self
            .editing()
            .is_some_and(|t| t.is_subtask(parent_id, subtask_id))
        {
            return Err(TaskError::BeingEdited(subtask_id.to_string()));
        }
        let parent = self.task_mut(parent_id)?;
        if parent.is_archived {
            return Err(TaskError::Archived(parent_id.to_string()));
        }
        let subtask = parent
            .subtask_mut(subtask_id)
            .ok_or_else(|| TaskError::SubtaskNotFound(subtask_id.to_string()))?;
        subtask.completed = !subtask.completed;
        Ok(subtask.completed)
    }

    /// Replace a subtask's text. Empty text is rejected and the old text kept.
    pub fn edit_subtask(
        &mut self,
        parent_id: &str,
        subtask_id: &str,
        text: &str,
    ) -> Result<(), TaskError> {
        let parent = self.task_mut(parent_id)?;
        if parent.is_archived {
            return Err(TaskError::Archived(parent_id.to_string()));
        }
        let subtask = parent
            .subtask_mut(subtask_id)
            .ok_or_else(|| TaskError::SubtaskNotFound(subtask_id.to_string()))?;
        let text = sanitize_line(text);
        if text.is_empty() {
            return Err(TaskError::EmptyText);
        }
        subtask.text = text;
        Ok(())
    }

    pub fn delete_subtask(
        &mut self,
        parent_id: &str,
        subtask_id: &str,
    ) -> Result<Subtask, TaskError> {
        let parent = self.task_mut(parent_id)?;
        let index = parent
            .subtasks
            .iter()
            .position(|s| s.id == subtask_id)
            .ok_or_else(|| TaskError::SubtaskNotFound(subtask_id.to_string()))?;
        let removed = parent.subtasks.remove(index);
        if self
            .editing()
            .is_some_and(|t| t.is_subtask(parent_id, subtask_id))
        {
            self.editing = None;
        }
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Edit sessions
    // -----------------------------------------------------------------------

    /// Open a task for editing.
    ///
    /// Whatever was open before is closed first: a staged draft is committed
    /// if it validates and dropped otherwise. Returns the target whose draft
    /// was committed, if any.
    pub fn enter_edit(&mut self, id: &str) -> Result<Option<EditTarget>, TaskError> {
        let index = self.position(id)?;
        ensure_open(&self.tasks[index])?;
        if self.editing().is_some_and(|t| t.is_task(id)) {
            return Ok(None);
        }
        let committed = self.close_open_edit();
        self.editing = Some(EditSession::new(EditTarget::Task(id.to_string())));
        Ok(committed)
    }

    /// Open a subtask for editing. Completed subtasks cannot be edited. Same
    /// hand-over rules as `enter_edit`.
    pub fn enter_subtask_edit(
        &mut self,
        parent_id: &str,
        subtask_id: &str,
    ) -> Result<Option<EditTarget>, TaskError> {
        let index = self.position(parent_id)?;
        let parent = &self.tasks[index];
        if parent.is_archived {
            return Err(TaskError::Archived(parent_id.to_string()));
        }
        match parent.subtask(subtask_id) {
            None => return Err(TaskError::SubtaskNotFound(subtask_id.to_string())),
            Some(subtask) if subtask.completed => {
                return Err(TaskError::Completed(subtask_id.to_string()));
            }
            Some(_) => {}
        }
        if self
            .editing()
            .is_some_and(|t| t.is_subtask(parent_id, subtask_id))
        {
            return Ok(None);
        }
        let committed = self.close_open_edit();
        self.editing = Some(EditSession::new(EditTarget::Subtask {
            parent: parent_id.to_string(),
            id: subtask_id.to_string(),
        }));
        Ok(committed)
    }

    /// Record in-progress values for the open task edit.
    pub fn stage_edit(&mut self, fields: TaskFields) -> Result<(), TaskError> {
        match &mut self.editing {
            Some(EditSession {
                target: EditTarget::Task(_),
                draft,
            }) => {
                *draft = Some(Draft::Task(fields));
                Ok(())
            }
            _ => Err(TaskError::NotEditing),
        }
    }

    /// Record in-progress text for the open subtask edit.
    pub fn stage_subtask_edit(&mut self, text: String) -> Result<(), TaskError> {
        match &mut self.editing {
            Some(EditSession {
                target: EditTarget::Subtask { .. },
                draft,
            }) => {
                *draft = Some(Draft::Subtask(text));
                Ok(())
            }
            _ => Err(TaskError::NotEditing),
        }
    }

    /// Apply `fields` to the task open for editing and close the edit. If the
    /// fields do not validate the edit is still closed and the task keeps its
    /// previous values.
    pub fn commit_edit(&mut self, id: &str, fields: TaskFields) -> Result<(), TaskError> {
        if !self.editing().is_some_and(|t| t.is_task(id)) {
            return Err(TaskError::NotEditing);
        }
        self.editing = None;
        self.edit_task(id, fields)
    }

    /// Subtask counterpart of `commit_edit`.
    pub fn commit_subtask_edit(
        &mut self,
        parent_id: &str,
        subtask_id: &str,
        text: &str,
    ) -> Result<(), TaskError> {
        if !self
            .editing()
            .is_some_and(|t| t.is_subtask(parent_id, subtask_id))
        {
            return Err(TaskError::NotEditing);
        }
        self.editing = None;
        self.edit_subtask(parent_id, subtask_id, text)
    }

    /// Close any open edit without applying it.
    pub fn cancel_edit(&mut self) -> Option<EditTarget> {
        self.editing.take().map(|s| s.target)
    }

    /// Close the open edit, committing its draft when it validates.
    fn close_open_edit(&mut self) -> Option<EditTarget> {
        let session = self.editing.take()?;
        let result = match (&session.target, session.draft) {
            (EditTarget::Task(id), Some(Draft::Task(fields))) => self.edit_task(id, fields),
            (EditTarget::Subtask { parent, id }, Some(Draft::Subtask(text))) => {
                self.edit_subtask(parent, id, &text)
            }
            _ => return None,
        };
        match result {
            Ok(()) => Some(session.target),
            Err(e) => {
                debug!(error = %e, "discarded staged edit");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn position(&self, id: &str) -> Result<usize, TaskError> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    fn task_mut(&mut self, id: &str) -> Result<&mut Task, TaskError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    fn ensure_not_editing_task(&self, id: &str) -> Result<(), TaskError> {
        if self.editing().is_some_and(|t| t.is_task(id)) {
            return Err(TaskError::BeingEdited(id.to_string()));
        }
        Ok(())
    }

    /// Index of the first completed or archived task, or the length
    fn open_block_end(&self) -> usize {
        self.tasks
            .iter()
            .position(|t| !t.is_open())
            .unwrap_or(self.tasks.len())
    }

    fn id_in_use(&self, id: &str) -> bool {
        self.tasks
            .iter()
            .any(|t| t.id == id || t.subtasks.iter().any(|s| s.id == id))
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if !self.id_in_use(&id) {
                return id;
            }
        }
    }

    /// Strictly increasing creation stamps, even if the clock stalls
    fn next_created_at(&mut self, now_ms: i64) -> i64 {
        let stamp = now_ms.max(self.last_created_at.saturating_add(1));
        self.last_created_at = stamp;
        stamp
    }
}

fn ensure_open(task: &Task) -> Result<(), TaskError> {
    if task.is_archived {
        return Err(TaskError::Archived(task.id.clone()));
    }
    if task.completed {
        return Err(TaskError::Completed(task.id.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn now(ms: i64) -> Now {
        Now::fixed(NaiveDate::from_ymd_opt(2025, 6, 11).unwrap(), ms)
    }

    fn parsed(text: &str) -> ParsedTask {
        ParsedTask {
            text: text.to_string(),
            tags: Vec::new(),
            is_important: false,
            due_date: None,
        }
    }

    /// Store holding one task per title, in the given order
    fn store_with(titles: &[&str]) -> (TaskStore, Vec<String>) {
        let mut store = TaskStore::new();
        let ids = titles
            .iter()
            .enumerate()
            .map(|(i, title)| store.add_task(parsed(title), now(1000 + i as i64), SortMode::Manual))
            .collect();
        (store, ids)
    }

    fn titles(store: &TaskStore) -> Vec<&str> {
        store.tasks().iter().map(|t| t.text.as_str()).collect()
    }

    fn fields(text: &str) -> TaskFields {
        TaskFields {
            text: text.to_string(),
            ..Default::default()
        }
    }

    // --- Creation ---

    #[test]
    fn add_in_manual_mode_goes_before_closed_block() {
        let (mut store, ids) = store_with(&["A", "B"]);
        store.toggle_completion(&ids[1]).unwrap();
        store.add_task(parsed("C"), now(5000), SortMode::Manual);
        assert_eq!(titles(&store), vec!["A", "C", "B"]);
    }

    #[test]
    fn add_in_manual_mode_appends_when_all_open() {
        let (store, _) = store_with(&["A", "B", "C"]);
        assert_eq!(titles(&store), vec!["A", "B", "C"]);
    }

    #[test]
    fn add_in_sorted_mode_prepends() {
        let (mut store, ids) = store_with(&["A", "B"]);
        store.toggle_completion(&ids[1]).unwrap();
        store.add_task(parsed("C"), now(5000), SortMode::DueDate);
        assert_eq!(titles(&store), vec!["C", "A", "B"]);
    }

    #[test]
    fn add_copies_parsed_fields() {
        let mut store = TaskStore::new();
        let due = NaiveDate::from_ymd_opt(2025, 6, 12);
        let id = store.add_task(
            ParsedTask {
                text: "Buy milk".into(),
                tags: vec!["Errand".into(), "errand".into()],
                is_important: true,
                due_date: due,
            },
            now(1),
            SortMode::Manual,
        );
        let task = store.get(&id).unwrap();
        assert_eq!(task.text, "Buy milk");
        assert_eq!(task.tags, vec!["errand"]);
        assert!(task.is_important);
        assert_eq!(task.due_date, due);
        assert!(task.is_open());
        assert!(task.subtasks.is_empty());
    }

    #[test]
    fn created_at_is_strictly_increasing() {
        let mut store = TaskStore::new();
        let a = store.add_task(parsed("A"), now(1000), SortMode::Manual);
        let b = store.add_task(parsed("B"), now(1000), SortMode::Manual);
        let c = store.add_task(parsed("C"), now(900), SortMode::Manual);
        let stamps: Vec<i64> = [a, b, c]
            .iter()
            .map(|id| store.get(id).unwrap().created_at)
            .collect();
        assert_eq!(stamps, vec![1000, 1001, 1002]);
    }

    #[test]
    fn created_at_saturates_at_the_maximum() {
        let mut store = TaskStore::from_tasks(vec![Task::new("x".into(), i64::MAX, "X".into())]);
        let id = store.add_task(parsed("New"), now(10), SortMode::Manual);
        assert_eq!(store.get(&id).unwrap().created_at, i64::MAX);
    }

    #[test]
    fn created_at_continues_after_loaded_tasks() {
        let mut loaded = Task::new("old".into(), 5000, "Old".into());
        loaded.completed = true;
        let mut store = TaskStore::from_tasks(vec![loaded]);
        let id = store.add_task(parsed("New"), now(10), SortMode::Manual);
        assert_eq!(store.get(&id).unwrap().created_at, 5001);
    }

    #[test]
    fn ids_are_unique_across_tasks_and_subtasks() {
        let mut store = TaskStore::new();
        let mut seen = std::collections::HashSet::new();
        for i in 0..20 {
            let id = store.add_task(parsed("T"), now(i), SortMode::Manual);
            assert!(seen.insert(id.clone()));
            let sub = store.add_subtask(&id, "S").unwrap();
            assert!(seen.insert(sub));
            if i % 3 == 0 {
                store.delete_task(&id).unwrap();
            }
        }
        for _ in 0..5 {
            let id = store.add_task(parsed("T"), now(100), SortMode::Manual);
            assert!(seen.insert(id));
        }
    }

    // --- Toggles ---

    #[test]
    fn toggle_completion_flips() {
        let (mut store, ids) = store_with(&["A"]);
        assert_eq!(store.toggle_completion(&ids[0]), Ok(true));
        assert_eq!(store.toggle_completion(&ids[0]), Ok(false));
    }

    #[test]
    fn toggle_completion_rejections() {
        let (mut store, ids) = store_with(&["A", "B"]);
        assert_eq!(
            store.toggle_completion("nope"),
            Err(TaskError::NotFound("nope".into()))
        );

        store.toggle_completion(&ids[0]).unwrap();
        store.archive_completed();
        assert_eq!(
            store.toggle_completion(&ids[0]),
            Err(TaskError::Archived(ids[0].clone()))
        );

        store.enter_edit(&ids[1]).unwrap();
        assert_eq!(
            store.toggle_completion(&ids[1]),
            Err(TaskError::BeingEdited(ids[1].clone()))
        );
        assert!(!store.get(&ids[1]).unwrap().completed);
    }

    #[test]
    fn toggle_priority_requires_open_task() {
        let (mut store, ids) = store_with(&["A"]);
        assert_eq!(store.toggle_priority(&ids[0]), Ok(true));
        store.toggle_completion(&ids[0]).unwrap();
        assert_eq!(
            store.toggle_priority(&ids[0]),
            Err(TaskError::Completed(ids[0].clone()))
        );
        assert!(store.get(&ids[0]).unwrap().is_important);
    }

    // --- Edit / delete ---

    #[test]
    fn edit_task_replaces_fields() {
        let (mut store, ids) = store_with(&["A"]);
        store
            .edit_task(
                &ids[0],
                TaskFields {
                    text: "  Call   <b>mom</b> ".into(),
                    due_date: NaiveDate::from_ymd_opt(2025, 7, 1),
                    tags: vec!["Family".into(), "".into(), "family".into()],
                    notes: "bring cake".into(),
                    is_important: true,
                },
            )
            .unwrap();
        let task = store.get(&ids[0]).unwrap();
        assert_eq!(task.text, "Call mom");
        assert_eq!(task.tags, vec!["family"]);
        assert_eq!(task.notes, "bring cake");
        assert!(task.is_important);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2025, 7, 1));
    }

    #[test]
    fn edit_task_rejects_empty_text_and_keeps_old() {
        let (mut store, ids) = store_with(&["A"]);
        assert_eq!(store.edit_task(&ids[0], fields("   ")), Err(TaskError::EmptyText));
        assert_eq!(store.get(&ids[0]).unwrap().text, "A");
    }

    #[test]
    fn edit_task_rejects_closed_tasks() {
        let (mut store, ids) = store_with(&["A"]);
        store.toggle_completion(&ids[0]).unwrap();
        assert_eq!(
            store.edit_task(&ids[0], fields("B")),
            Err(TaskError::Completed(ids[0].clone()))
        );
    }

    #[test]
    fn delete_removes_task_with_subtasks_and_open_edit() {
        let (mut store, ids) = store_with(&["A", "B"]);
        let sub = store.add_subtask(&ids[0], "child").unwrap();
        store.enter_subtask_edit(&ids[0], &sub).unwrap();

        let removed = store.delete_task(&ids[0]).unwrap();
        assert_eq!(removed.subtasks.len(), 1);
        assert_eq!(titles(&store), vec!["B"]);
        assert_eq!(store.editing(), None);
        assert_eq!(
            store.delete_task(&ids[0]),
            Err(TaskError::NotFound(ids[0].clone()))
        );
    }

    // --- Archive ---

    #[test]
    fn archive_only_touches_completed_tasks() {
        let (mut store, ids) = store_with(&["A", "B", "C"]);
        store.toggle_completion(&ids[0]).unwrap();
        store.toggle_completion(&ids[2]).unwrap();

        let archived = store.archive_tasks(&[ids[0].clone(), ids[1].clone()]);
        assert_eq!(archived, vec![ids[0].clone()]);
        assert!(store.get(&ids[0]).unwrap().is_archived);
        assert!(!store.get(&ids[1]).unwrap().is_archived);
        assert!(!store.get(&ids[2]).unwrap().is_archived);

        assert_eq!(store.archive_completed(), vec![ids[2].clone()]);
        assert!(store.archive_completed().is_empty());
    }

    #[test]
    fn unarchive_restores_without_touching_completion() {
        let (mut store, ids) = store_with(&["A"]);
        store.toggle_completion(&ids[0]).unwrap();
        store.archive_completed();
        store.unarchive_task(&ids[0]).unwrap();
        let task = store.get(&ids[0]).unwrap();
        assert!(!task.is_archived);
        assert!(task.completed);

        assert_eq!(
            store.unarchive_task(&ids[0]),
            Err(TaskError::NotFound(ids[0].clone()))
        );
    }

    // --- Reorder ---

    #[test]
    fn reorder_before_and_after() {
        let (mut store, ids) = store_with(&["A", "B", "C", "D"]);
        store
            .reorder(&ids[3], Some(&ids[1]), Placement::Before, SortMode::Manual)
            .unwrap();
        assert_eq!(titles(&store), vec!["A", "D", "B", "C"]);

        store
            .reorder(&ids[0], Some(&ids[2]), Placement::After, SortMode::Manual)
            .unwrap();
        assert_eq!(titles(&store), vec!["D", "B", "C", "A"]);

        store
            .reorder(&ids[0], None, Placement::Before, SortMode::Manual)
            .unwrap();
        assert_eq!(titles(&store), vec!["A", "D", "B", "C"]);
    }

    #[test]
    fn reorder_never_enters_closed_block() {
        let (mut store, ids) = store_with(&["A", "B", "C"]);
        store.toggle_completion(&ids[2]).unwrap();

        store
            .reorder(&ids[0], None, Placement::After, SortMode::Manual)
            .unwrap();
        assert_eq!(titles(&store), vec!["B", "A", "C"]);

        store
            .reorder(&ids[1], Some(&ids[0]), Placement::After, SortMode::Manual)
            .unwrap();
        assert_eq!(titles(&store), vec!["A", "B", "C"]);
    }

    #[test]
    fn reorder_rejections() {
        let (mut store, ids) = store_with(&["A", "B", "C"]);
        store.toggle_completion(&ids[2]).unwrap();

        assert_eq!(
            store.reorder(&ids[0], Some(&ids[1]), Placement::After, SortMode::Alphabetical),
            Err(TaskError::NotManualSort)
        );
        assert_eq!(
            store.reorder(&ids[0], Some(&ids[2]), Placement::After, SortMode::Manual),
            Err(TaskError::InvalidTarget(ids[2].clone()))
        );
        assert_eq!(
            store.reorder(&ids[2], Some(&ids[0]), Placement::Before, SortMode::Manual),
            Err(TaskError::Completed(ids[2].clone()))
        );
        assert_eq!(
            store.reorder(&ids[0], Some(&ids[0]), Placement::Before, SortMode::Manual),
            Err(TaskError::InvalidTarget(ids[0].clone()))
        );
        assert_eq!(titles(&store), vec!["A", "B", "C"]);
    }

    // --- Subtasks ---

    #[test]
    fn subtask_lifecycle() {
        let (mut store, ids) = store_with(&["A"]);
        let s1 = store.add_subtask(&ids[0], "first").unwrap();
        let s2 = store.add_subtask(&ids[0], " second ").unwrap();
        assert_ne!(s1, s2);

        assert_eq!(store.toggle_subtask(&ids[0], &s1), Ok(true));
        store.edit_subtask(&ids[0], &s2, "2nd").unwrap();
        let texts: Vec<&str> = store.get(&ids[0]).unwrap().subtasks.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "2nd"]);

        let removed = store.delete_subtask(&ids[0], &s1).unwrap();
        assert_eq!(removed.text, "first");
        assert_eq!(store.get(&ids[0]).unwrap().subtasks.len(), 1);
        assert_eq!(
            store.delete_subtask(&ids[0], &s1),
            Err(TaskError::SubtaskNotFound(s1.clone()))
        );
    }

    #[test]
    fn subtask_rejections() {
        let (mut store, ids) = store_with(&["A", "B"]);
        let sub = store.add_subtask(&ids[0], "child").unwrap();

        assert_eq!(store.add_subtask(&ids[0], "  "), Err(TaskError::EmptyText));
        assert_eq!(store.edit_subtask(&ids[0], &sub, ""), Err(TaskError::EmptyText));
        assert_eq!(store.get(&ids[0]).unwrap().subtasks[0].text, "child");

        store.toggle_completion(&ids[1]).unwrap();
        assert_eq!(
            store.add_subtask(&ids[1], "late"),
            Err(TaskError::Completed(ids[1].clone()))
        );

        store.toggle_completion(&ids[0]).unwrap();
        store.archive_completed();
        assert_eq!(
            store.toggle_subtask(&ids[0], &sub),
            Err(TaskError::Archived(ids[0].clone()))
        );
    }

    // --- Edit sessions ---

    #[test]
    fn only_one_edit_open_at_a_time() {
        let (mut store, ids) = store_with(&["A", "B"]);
        assert_eq!(store.enter_edit(&ids[0]), Ok(None));
        assert_eq!(store.enter_edit(&ids[1]), Ok(None));
        assert_eq!(store.editing(), Some(&EditTarget::Task(ids[1].clone())));
        assert_eq!(store.cancel_edit(), Some(EditTarget::Task(ids[1].clone())));
        assert_eq!(store.editing(), None);
    }

    #[test]
    fn enter_edit_rejects_closed_tasks() {
        let (mut store, ids) = store_with(&["A"]);
        store.toggle_completion(&ids[0]).unwrap();
        assert_eq!(
            store.enter_edit(&ids[0]),
            Err(TaskError::Completed(ids[0].clone()))
        );
        assert_eq!(store.editing(), None);
    }

    #[test]
    fn switching_edits_commits_valid_draft() {
        let (mut store, ids) = store_with(&["A", "B"]);
        store.enter_edit(&ids[0]).unwrap();
        store.stage_edit(fields("A prime")).unwrap();

        assert_eq!(
            store.enter_edit(&ids[1]),
            Ok(Some(EditTarget::Task(ids[0].clone())))
        );
        assert_eq!(store.get(&ids[0]).unwrap().text, "A prime");
    }

    #[test]
    fn switching_edits_drops_invalid_draft() {
        let (mut store, ids) = store_with(&["A", "B"]);
        let sub = store.add_subtask(&ids[1], "child").unwrap();
        store.enter_edit(&ids[0]).unwrap();
        store.stage_edit(fields("")).unwrap();

        assert_eq!(store.enter_subtask_edit(&ids[1], &sub), Ok(None));
        assert_eq!(store.get(&ids[0]).unwrap().text, "A");
        assert_eq!(
            store.editing(),
            Some(&EditTarget::Subtask {
                parent: ids[1].clone(),
                id: sub.clone()
            })
        );
    }

    #[test]
    fn stage_requires_matching_open_edit() {
        let (mut store, ids) = store_with(&["A"]);
        assert_eq!(store.stage_edit(fields("x")), Err(TaskError::NotEditing));
        store.enter_edit(&ids[0]).unwrap();
        assert_eq!(
            store.stage_subtask_edit("x".into()),
            Err(TaskError::NotEditing)
        );
    }

    #[test]
    fn commit_closes_edit_even_when_invalid() {
        let (mut store, ids) = store_with(&["A"]);
        assert_eq!(store.commit_edit(&ids[0], fields("B")), Err(TaskError::NotEditing));

        store.enter_edit(&ids[0]).unwrap();
        assert_eq!(store.commit_edit(&ids[0], fields(" ")), Err(TaskError::EmptyText));
        assert_eq!(store.editing(), None);
        assert_eq!(store.get(&ids[0]).unwrap().text, "A");

        store.enter_edit(&ids[0]).unwrap();
        store.commit_edit(&ids[0], fields("B")).unwrap();
        assert_eq!(store.get(&ids[0]).unwrap().text, "B");
        assert_eq!(store.editing(), None);
    }

    #[test]
    fn completed_subtask_cannot_be_opened_for_edit() {
        let (mut store, ids) = store_with(&["A"]);
        let sub = store.add_subtask(&ids[0], "child").unwrap();
        store.toggle_subtask(&ids[0], &sub).unwrap();
        assert_eq!(
            store.enter_subtask_edit(&ids[0], &sub),
            Err(TaskError::Completed(sub.clone()))
        );
        assert_eq!(store.editing(), None);
    }

    #[test]
    fn staged_draft_is_kept_on_the_session() {
        let (mut store, ids) = store_with(&["A"]);
        store.enter_edit(&ids[0]).unwrap();
        assert_eq!(store.edit_session().and_then(|s| s.draft.clone()), None);
        store.stage_edit(fields("A draft")).unwrap();
        assert_eq!(
            store.edit_session().and_then(|s| s.draft.clone()),
            Some(Draft::Task(fields("A draft")))
        );
        assert_eq!(store.get(&ids[0]).unwrap().text, "A");
        store.cancel_edit();
        assert!(store.edit_session().is_none());
    }

    #[test]
    fn subtask_edit_blocks_its_toggle() {
        let (mut store, ids) = store_with(&["A"]);
        let sub = store.add_subtask(&ids[0], "child").unwrap();
        store.enter_subtask_edit(&ids[0], &sub).unwrap();
        assert_eq!(
            store.toggle_subtask(&ids[0], &sub),
            Err(TaskError::BeingEdited(sub.clone()))
        );
        store
            .commit_subtask_edit(&ids[0], &sub, "renamed")
            .unwrap();
        assert_eq!(store.get(&ids[0]).unwrap().subtasks[0].text, "renamed");
        assert_eq!(store.toggle_subtask(&ids[0], &sub), Ok(true));
    }

    #[test]
    fn archiving_closes_edit_on_archived_task() {
        let (mut store, ids) = store_with(&["A"]);
        let sub = store.add_subtask(&ids[0], "child").unwrap();
        store.toggle_completion(&ids[0]).unwrap();
        store.enter_subtask_edit(&ids[0], &sub).unwrap();
        store.archive_completed();
        assert_eq!(store.editing(), None);
    }
}
