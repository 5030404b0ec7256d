use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::model::task::Task;
use crate::model::view::{Filter, SortMode, ViewState};
use crate::ops::search::SearchQuery;

/// Due-date category used by the `due-date` sort. Declaration order is sort
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DueBucket {
    Overdue,
    Today,
    Tomorrow,
    Future,
    NoDate,
}

impl DueBucket {
    pub fn of(due: Option<NaiveDate>, today: NaiveDate) -> Self {
        let Some(due) = due else {
            return DueBucket::NoDate;
        };
        match due.cmp(&today) {
            Ordering::Less => DueBucket::Overdue,
            Ordering::Equal => DueBucket::Today,
            Ordering::Greater if today.checked_add_days(Days::new(1)) == Some(due) => {
                DueBucket::Tomorrow
            }
            Ordering::Greater => DueBucket::Future,
        }
    }
}

/// Aggregate counts over the non-archived tasks (plus the archive size)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewStats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    /// Rounded completion percentage, 0 when there are no tasks
    pub percent: u32,
    /// Distinct tags in use, sorted
    pub tags: Vec<String>,
    /// Completed tasks that `archive` would move
    pub archivable: usize,
    pub archived: usize,
}

/// Why nothing is visible
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyState {
    NoTasks,
    NoSearchResults(String),
    EmptyArchive,
    NoCompleted,
    NoImportant,
    NoTagged(String),
    NoFilterMatches,
}

impl fmt::Display for EmptyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyState::NoTasks => write!(f, "No tasks yet! Add your first task."),
            EmptyState::NoSearchResults(term) => {
                write!(f, "No tasks match your search: \"{term}\".")
            }
            EmptyState::EmptyArchive => write!(f, "Your archive is empty."),
            EmptyState::NoCompleted => write!(f, "No completed tasks found."),
            EmptyState::NoImportant => write!(f, "No important tasks found."),
            EmptyState::NoTagged(tag) => write!(f, "No tasks found with the tag \"{tag}\"."),
            EmptyState::NoFilterMatches => write!(f, "No tasks match the current filter."),
        }
    }
}

/// Everything a presentation layer needs to draw one screen
#[derive(Debug, Clone)]
pub struct View<'a> {
    pub tasks: Vec<&'a Task>,
    pub stats: ViewStats,
    pub empty_state: Option<EmptyState>,
}

pub fn build_view<'a>(tasks: &'a [Task], state: &ViewState, today: NaiveDate) -> View<'a> {
    let visible = visible_tasks(tasks, state, today);
    let empty_state = if visible.is_empty() {
        Some(empty_state(tasks, state))
    } else {
        None
    };
    View {
        tasks: visible,
        stats: compute_stats(tasks),
        empty_state,
    }
}

// ---------------------------------------------------------------------------
// Filtering and sorting
// ---------------------------------------------------------------------------

/// The ordered list of tasks to show for `state`.
pub fn visible_tasks<'a>(tasks: &'a [Task], state: &ViewState, today: NaiveDate) -> Vec<&'a Task> {
    let archive_view = state.filter == Filter::Archived;
    let query = if archive_view {
        None
    } else {
        state.search_term().and_then(SearchQuery::new)
    };

    let mut visible: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.is_archived == archive_view)
        .filter(|t| query.as_ref().is_none_or(|q| q.matches(t)))
        .filter(|t| passes_filter(t, &state.filter))
        .collect();

    if archive_view {
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    } else if state.sort != SortMode::Manual {
        let group_completed = state.filter != Filter::Completed;
        visible.sort_by(|a, b| {
            let grouped = if group_completed {
                a.completed.cmp(&b.completed)
            } else {
                Ordering::Equal
            };
            grouped.then_with(|| compare(a, b, state.sort, today))
        });
    }
    visible
}

fn passes_filter(task: &Task, filter: &Filter) -> bool {
    match filter {
        Filter::All | Filter::Archived => true,
        Filter::Active => !task.completed,
        Filter::Completed => task.completed,
        Filter::Important => task.is_flagged(),
        Filter::Tag(tag) => task.has_tag(tag),
    }
}

fn newest_first(a: &Task, b: &Task) -> Ordering {
    b.created_at.cmp(&a.created_at)
}

fn compare(a: &Task, b: &Task, sort: SortMode, today: NaiveDate) -> Ordering {
    match sort {
        SortMode::Manual => Ordering::Equal,
        SortMode::CreationAsc => a.created_at.cmp(&b.created_at),
        SortMode::CreationDesc => newest_first(a, b),
        SortMode::DueDate => DueBucket::of(a.due_date, today)
            .cmp(&DueBucket::of(b.due_date, today))
            .then_with(|| match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => Ordering::Equal,
            })
            .then_with(|| newest_first(a, b)),
        SortMode::Priority => b
            .is_important
            .cmp(&a.is_important)
            .then_with(|| newest_first(a, b)),
        SortMode::Alphabetical => a.text.to_lowercase().cmp(&b.text.to_lowercase()),
    }
}

// ---------------------------------------------------------------------------
// Stats and empty states
// ---------------------------------------------------------------------------

pub fn compute_stats(tasks: &[Task]) -> ViewStats {
    let live: Vec<&Task> = tasks.iter().filter(|t| !t.is_archived).collect();
    let total = live.len();
    let completed = live.iter().filter(|t| t.completed).count();
    let percent = if total == 0 {
        0
    } else {
        (completed as f64 / total as f64 * 100.0).round() as u32
    };
    let tags: BTreeSet<&str> = live
        .iter()
        .flat_map(|t| t.tags.iter().map(String::as_str))
        .collect();

    ViewStats {
        total,
        completed,
        active: total - completed,
        percent,
        tags: tags.into_iter().map(str::to_string).collect(),
        archivable: completed,
        archived: tasks.len() - total,
    }
}

/// Pick the placeholder for an empty view. Checked in order: nothing in this
/// partition at all, a search that found nothing, then the filter-specific
/// messages.
fn empty_state(tasks: &[Task], state: &ViewState) -> EmptyState {
    let archive_view = state.filter == Filter::Archived;
    if archive_view {
        return EmptyState::EmptyArchive;
    }
    if !tasks.iter().any(|t| !t.is_archived) {
        return EmptyState::NoTasks;
    }
    if let Some(term) = state.search_term() {
        return EmptyState::NoSearchResults(term.to_string());
    }
    match &state.filter {
        Filter::Completed => EmptyState::NoCompleted,
        Filter::Important => EmptyState::NoImportant,
        Filter::Tag(tag) => EmptyState::NoTagged(tag.clone()),
        _ => EmptyState::NoFilterMatches,
    }
}
