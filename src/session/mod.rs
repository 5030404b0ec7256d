//! The command surface: one `Session` owns the store and the view state,
//! applies `Command`s, and tells listeners what changed.

pub mod command;
pub mod listener;

pub use command::{Change, Command, CommandError};
pub use listener::{ChangeListener, PersistListener, Snapshot};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::io::storage::{StorageError, TaskGateway};
use crate::model::now::Now;
use crate::model::view::{Filter, ViewState};
use crate::ops::store::{TaskError, TaskStore};
use crate::ops::view::{View, build_view};
use crate::parse::parse_task_input;

/// Result of a successfully dispatched command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub changes: Vec<Change>,
    /// Non-fatal problems, such as a failed save
    pub warnings: Vec<String>,
}

impl Outcome {
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    /// Id of the task or subtask the command created, if any
    pub fn created_id(&self) -> Option<&str> {
        self.changes.iter().find_map(|c| match c {
            Change::TaskAdded(id) | Change::SubtaskAdded { id, .. } => Some(id.as_str()),
            _ => None,
        })
    }
}

pub struct Session {
    store: TaskStore,
    view: ViewState,
    listeners: Vec<Box<dyn ChangeListener>>,
}

impl Session {
    pub fn new(store: TaskStore, view: ViewState) -> Self {
        Session {
            store,
            view,
            listeners: Vec::new(),
        }
    }

    /// Load tasks through `gateway` and keep it subscribed for saving.
    pub fn open<G: TaskGateway + 'static>(
        mut gateway: G,
        view: ViewState,
        now: Now,
    ) -> Result<Self, StorageError> {
        let tasks = gateway.load(now)?;
        let mut session = Session::new(TaskStore::from_tasks(tasks), view);
        session.subscribe(PersistListener::new(gateway));
        Ok(session)
    }

    pub fn subscribe<L: ChangeListener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener));
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn view(&self, today: NaiveDate) -> View<'_> {
        build_view(self.store.tasks(), &self.view, today)
    }

    /// Apply one command. On error nothing changed and no listener runs.
    pub fn dispatch(&mut self, command: Command, now: Now) -> Result<Outcome, CommandError> {
        let editing_before = self.store.editing().cloned();
        let mut outcome = Outcome::default();
        self.apply(command, now, &mut outcome)
            .inspect_err(|e| debug!(error = %e, "command rejected"))?;

        let editing_after = self.store.editing().cloned();
        if editing_before != editing_after {
            if let Some(target) = editing_before {
                outcome.changes.push(Change::EditClosed(target));
            }
            if let Some(target) = editing_after {
                outcome.changes.push(Change::EditOpened(target));
            }
        }

        if outcome.changes.is_empty() {
            debug!("command changed nothing");
        } else {
            self.notify(&mut outcome, now);
        }
        Ok(outcome)
    }

    fn notify(&mut self, outcome: &mut Outcome, now: Now) {
        let snapshot = Snapshot {
            tasks: self.store.tasks(),
            view: &self.view,
            editing: self.store.editing(),
            now,
        };
        for listener in &mut self.listeners {
            if let Err(e) = listener.on_change(&outcome.changes, &snapshot) {
                warn!(error = %e, "change listener failed");
                outcome.warnings.push(e.to_string());
            }
        }
    }

    fn apply(&mut self, command: Command, now: Now, outcome: &mut Outcome) -> Result<(), CommandError> {
        let store = &mut self.store;
        let changes = &mut outcome.changes;
        match command {
            Command::AddTask(raw) => {
                let parsed = parse_task_input(&raw, now.today)?;
                let id = store.add_task(parsed, now, self.view.sort);
                changes.push(Change::TaskAdded(id));
                if matches!(self.view.filter, Filter::Completed | Filter::Archived) {
                    self.view.filter = Filter::All;
                    changes.push(Change::ViewChanged);
                }
            }
            Command::ToggleCompletion(id) => {
                store.toggle_completion(&id)?;
                changes.push(Change::TaskUpdated(id));
            }
            Command::TogglePriority(id) => {
                store.toggle_priority(&id)?;
                changes.push(Change::TaskUpdated(id));
            }
            Command::EnterEdit(id) => {
                if let Some(committed) = store.enter_edit(&id)? {
                    changes.push(Change::updated(committed));
                }
            }
            Command::StageEdit(fields) => store.stage_edit(fields)?,
            Command::CommitEdit(id, fields) => match store.commit_edit(&id, fields) {
                Ok(()) => changes.push(Change::TaskUpdated(id)),
                Err(TaskError::NotEditing) => return Err(TaskError::NotEditing.into()),
                Err(e) => outcome.warnings.push(format!("edit discarded: {e}")),
            },
            Command::EditTask(id, fields) => {
                store.edit_task(&id, fields)?;
                changes.push(Change::TaskUpdated(id));
            }
            Command::CancelEdit => {
                store.cancel_edit();
            }
            Command::DeleteTask(id) => {
                store.delete_task(&id)?;
                changes.push(Change::TaskDeleted(id));
            }
            Command::ArchiveCompleted => {
                let archived = store.archive_completed();
                if archived.is_empty() {
                    debug!("no completed tasks to archive");
                } else {
                    changes.push(Change::TasksArchived(archived));
                }
            }
            Command::UnarchiveTask(id) => {
                store.unarchive_task(&id)?;
                changes.push(Change::TaskUnarchived(id));
            }
            Command::AddSubtask { parent, text } => {
                let id = store.add_subtask(&parent, &text)?;
                changes.push(Change::SubtaskAdded { parent, id });
            }
            Command::ToggleSubtask { parent, id } => {
                store.toggle_subtask(&parent, &id)?;
                changes.push(Change::SubtaskUpdated { parent, id });
            }
            Command::EnterSubtaskEdit { parent, id } => {
                if let Some(committed) = store.enter_subtask_edit(&parent, &id)? {
                    changes.push(Change::updated(committed));
                }
            }
            Command::StageSubtaskEdit(text) => store.stage_subtask_edit(text)?,
            Command::CommitSubtaskEdit { parent, id, text } => {
                match store.commit_subtask_edit(&parent, &id, &text) {
                    Ok(()) => changes.push(Change::SubtaskUpdated { parent, id }),
                    Err(TaskError::NotEditing) => return Err(TaskError::NotEditing.into()),
                    Err(e) => outcome.warnings.push(format!("edit discarded: {e}")),
                }
            }
            Command::EditSubtask { parent, id, text } => {
                store.edit_subtask(&parent, &id, &text)?;
                changes.push(Change::SubtaskUpdated { parent, id });
            }
            Command::DeleteSubtask { parent, id } => {
                store.delete_subtask(&parent, &id)?;
                changes.push(Change::SubtaskDeleted { parent, id });
            }
            Command::SetFilter(filter) => {
                if self.view.filter != filter {
                    store.cancel_edit();
                    self.view.filter = filter;
                    changes.push(Change::ViewChanged);
                }
            }
            Command::SetSearchTerm(term) => {
                if self.view.search != term {
                    store.cancel_edit();
                    self.view.search = term;
                    changes.push(Change::ViewChanged);
                }
            }
            Command::SetSortMode(sort) => {
                if self.view.sort != sort {
                    store.cancel_edit();
                    self.view.sort = sort;
                    changes.push(Change::ViewChanged);
                }
            }
            Command::Reorder {
                id,
                target,
                placement,
            } => {
                store.reorder(&id, target.as_deref(), placement, self.view.sort)?;
                changes.push(Change::TaskMoved(id));
            }
        }
        Ok(())
    }
}
