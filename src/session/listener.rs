use tracing::debug;

use crate::io::storage::{StorageError, TaskGateway};
use crate::model::now::Now;
use crate::model::task::Task;
use crate::model::view::ViewState;
use crate::ops::edit::EditTarget;
use crate::session::command::Change;

/// Read-only state handed to listeners after a command
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub tasks: &'a [Task],
    pub view: &'a ViewState,
    pub editing: Option<&'a EditTarget>,
    pub now: Now,
}

/// Notified after every command that changed something. Persistence and
/// re-rendering are independent listeners.
pub trait ChangeListener {
    fn on_change(&mut self, changes: &[Change], snapshot: &Snapshot<'_>) -> Result<(), StorageError>;
}

/// Saves the whole collection through a gateway when task data changed
#[derive(Debug)]
pub struct PersistListener<G> {
    gateway: G,
}

impl<G: TaskGateway> PersistListener<G> {
    pub fn new(gateway: G) -> Self {
        PersistListener { gateway }
    }
}

impl<G: TaskGateway> ChangeListener for PersistListener<G> {
    fn on_change(&mut self, changes: &[Change], snapshot: &Snapshot<'_>) -> Result<(), StorageError> {
        if !changes.iter().any(Change::touches_tasks) {
            return Ok(());
        }
        self.gateway.save(snapshot.tasks)?;
        debug!(count = snapshot.tasks.len(), "persisted tasks");
        Ok(())
    }
}
