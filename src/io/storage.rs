use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::model::now::Now;
use crate::model::task::{Subtask, Task, normalize_tags};
use crate::parse::parse_iso_date;
use crate::util::text::{sanitize_line, sanitize_notes};

const UNTITLED_TASK: &str = "Untitled Task";
const UNTITLED_SUBTASK: &str = "Untitled Subtask";

/// Error type for reading and writing the task collection
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: io::Error,
    },
    #[error("could not serialize tasks: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where the task collection lives. `load` never fails on bad content, only
/// on an unreadable medium.
pub trait TaskGateway {
    fn load(&mut self, now: Now) -> Result<Vec<Task>, StorageError>;
    fn save(&mut self, tasks: &[Task]) -> Result<(), StorageError>;
}

/// Why a stored payload could not be used at all
#[derive(Debug, thiserror::Error)]
pub enum CorruptPayload {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("expected a JSON array of tasks")]
    NotAnArray,
}

// ---------------------------------------------------------------------------
// JSON file gateway
// ---------------------------------------------------------------------------

/// Tasks stored as one pretty-printed JSON array in a single file
#[derive(Debug, Clone)]
pub struct JsonFileGateway {
    path: PathBuf,
}

impl JsonFileGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileGateway { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TaskGateway for JsonFileGateway {
    fn load(&mut self, now: Now) -> Result<Vec<Task>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no data file yet");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        match decode_tasks(&content, now) {
            Ok(tasks) => {
                info!(path = %self.path.display(), count = tasks.len(), "loaded tasks");
                Ok(tasks)
            }
            Err(e) => {
                // Corrupted: back up and start fresh
                let bak = backup_path(&self.path);
                match fs::copy(&self.path, &bak) {
                    Ok(_) => warn!(
                        path = %self.path.display(),
                        backup = %bak.display(),
                        error = %e,
                        "could not parse task data, backed it up and starting empty"
                    ),
                    Err(copy_err) => warn!(
                        path = %self.path.display(),
                        error = %e,
                        backup_error = %copy_err,
                        "could not parse task data and could not back it up, starting empty"
                    ),
                }
                Ok(Vec::new())
            }
        }
    }

    fn save(&mut self, tasks: &[Task]) -> Result<(), StorageError> {
        let content = encode_tasks(tasks)?;
        let write_err = |source| StorageError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        atomic_write(&self.path, content.as_bytes()).map_err(write_err)?;
        info!(path = %self.path.display(), count = tasks.len(), "saved tasks");
        Ok(())
    }
}

/// `tasks.json` -> `tasks.json.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory gateway
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryStore {
    tasks: Vec<Task>,
    saves: usize,
    fail_saves: bool,
}

/// A gateway that keeps tasks in memory. Clones share the same storage, so a
/// caller can keep a handle after giving one to a session.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    inner: Rc<RefCell<MemoryStore>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let gateway = Self::default();
        gateway.inner.borrow_mut().tasks = tasks;
        gateway
    }

    /// Last saved collection
    pub fn tasks(&self) -> Vec<Task> {
        self.inner.borrow().tasks.clone()
    }

    /// Number of successful saves so far
    pub fn saves(&self) -> usize {
        self.inner.borrow().saves
    }

    /// Make every following save fail (or succeed again)
    pub fn set_fail_saves(&self, fail: bool) {
        self.inner.borrow_mut().fail_saves = fail;
    }
}

impl TaskGateway for MemoryGateway {
    fn load(&mut self, _now: Now) -> Result<Vec<Task>, StorageError> {
        Ok(self.tasks())
    }

    fn save(&mut self, tasks: &[Task]) -> Result<(), StorageError> {
        let mut store = self.inner.borrow_mut();
        if store.fail_saves {
            return Err(StorageError::Write {
                path: PathBuf::from("<memory>"),
                source: io::Error::other("saving is disabled"),
            });
        }
        store.tasks = tasks.to_vec();
        store.saves += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

pub fn encode_tasks(tasks: &[Task]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(tasks)
}

/// Decode a stored payload, repairing every entry that can be repaired.
///
/// Only a payload that is not a JSON array is rejected. Individual entries are
/// normalized: non-objects are skipped, missing fields get defaults, and
/// duplicate ids are replaced with fresh ones.
pub fn decode_tasks(content: &str, now: Now) -> Result<Vec<Task>, CorruptPayload> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Array(entries) = value else {
        return Err(CorruptPayload::NotAnArray);
    };

    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let Value::Object(fields) = entry else {
            debug!(index, "skipping non-object task entry");
            continue;
        };
        tasks.push(decode_task(fields, now, &mut seen));
    }
    Ok(tasks)
}

fn decode_task(fields: &Map<String, Value>, now: Now, seen: &mut HashSet<String>) -> Task {
    let raw_id = id_field(fields);
    let created_at = fields
        .get("createdAt")
        .and_then(as_millis)
        .filter(|ms| *ms != 0)
        .or_else(|| raw_id.as_deref().and_then(|id| id.parse::<i64>().ok()))
        .unwrap_or(now.timestamp_ms);
    let id = claim_id(raw_id, seen);

    let text = match fields.get("text").and_then(Value::as_str).map(sanitize_line) {
        Some(text) if !text.is_empty() => text,
        _ => UNTITLED_TASK.to_string(),
    };

    let mut task = Task::new(id, created_at, text);
    task.completed = flag(fields, "completed");
    task.is_important = flag(fields, "isImportant");
    task.is_archived = flag(fields, "isArchived");
    task.due_date = fields.get("dueDate").and_then(Value::as_str).and_then(due_date_prefix);
    task.notes = fields
        .get("notes")
        .and_then(Value::as_str)
        .map(sanitize_notes)
        .unwrap_or_default();
    task.tags = match fields.get("tags") {
        Some(Value::Array(tags)) => normalize_tags(tags.iter().filter_map(Value::as_str)),
        _ => Vec::new(),
    };
    task.subtasks = match fields.get("subtasks") {
        Some(Value::Array(subs)) => subs
            .iter()
            .filter_map(Value::as_object)
            .map(|sub| decode_subtask(sub, seen))
            .collect(),
        _ => Vec::new(),
    };
    task
}

fn decode_subtask(fields: &Map<String, Value>, seen: &mut HashSet<String>) -> Subtask {
    let id = claim_id(id_field(fields), seen);
    let text = match fields.get("text").and_then(Value::as_str).map(sanitize_line) {
        Some(text) if !text.is_empty() => text,
        _ => UNTITLED_SUBTASK.to_string(),
    };
    let mut subtask = Subtask::new(id, text);
    subtask.completed = flag(fields, "completed");
    subtask
}

/// A string id, or a numeric one rendered as a string
fn id_field(fields: &Map<String, Value>) -> Option<String> {
    match fields.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Keep `raw` if it is unused so far, otherwise mint a fresh id.
fn claim_id(raw: Option<String>, seen: &mut HashSet<String>) -> String {
    if let Some(id) = raw {
        if seen.insert(id.clone()) {
            return id;
        }
        debug!(id = %id, "re-keying duplicate id");
    }
    loop {
        let id = Uuid::new_v4().to_string();
        if seen.insert(id.clone()) {
            return id;
        }
    }
}

fn as_millis(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

/// Loose truthiness: booleans as-is, non-zero numbers true, anything else false
fn flag(fields: &Map<String, Value>, key: &str) -> bool {
    match fields.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

/// `YYYY-MM-DD`, or the date part of a longer timestamp
fn due_date_prefix(s: &str) -> Option<chrono::NaiveDate> {
    parse_iso_date(s.get(..10)?)
}
