use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::model::task::{Subtask, Task};
use crate::model::view::ViewState;
use crate::ops::search::{MatchField, SearchQuery};
use crate::ops::view::{View, ViewStats};

/// Shortest id prefix ever shown
const MIN_SHORT_ID: usize = 6;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskJson<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    pub overdue: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matched: Vec<MatchField>,
}

#[derive(Serialize)]
pub struct ListJson<'a> {
    pub filter: String,
    pub sort: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<&'a str>,
    pub tasks: Vec<TaskJson<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty: Option<String>,
    pub stats: &'a ViewStats,
}

#[derive(Serialize)]
pub struct ActionJson<'a> {
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json<'a>(task: &'a Task, today: NaiveDate, query: Option<&SearchQuery>) -> TaskJson<'a> {
    TaskJson {
        task,
        overdue: is_overdue(task, today),
        matched: query.map(|q| q.match_fields(task)).unwrap_or_default(),
    }
}

pub fn view_to_json<'a>(view: &'a View<'a>, state: &'a ViewState, today: NaiveDate) -> ListJson<'a> {
    let query = state.search_term().and_then(SearchQuery::new);
    ListJson {
        filter: state.filter.to_string(),
        sort: state.sort.name(),
        search: state.search_term(),
        tasks: view
            .tasks
            .iter()
            .map(|t| task_to_json(t, today, query.as_ref()))
            .collect(),
        empty: view.empty_state.as_ref().map(ToString::to_string),
        stats: &view.stats,
    }
}

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Length of the shortest prefix (at least `MIN_SHORT_ID`) that tells every
/// id in `ids` apart.
pub fn short_id_len<'a>(ids: impl IntoIterator<Item = &'a str>) -> usize {
    let ids: Vec<&str> = ids.into_iter().collect();
    let longest = ids.iter().map(|id| id.chars().count()).max().unwrap_or(0);
    let mut len = MIN_SHORT_ID.min(longest);
    while len < longest {
        let prefixes: HashSet<&str> = ids.iter().map(|id| short_id(id, len)).collect();
        if prefixes.len() == ids.len() {
            break;
        }
        len += 1;
    }
    len
}

/// The first `len` characters of `id`
pub fn short_id(id: &str, len: usize) -> &str {
    match id.char_indices().nth(len) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Id prefix length that keeps every task and subtask id in `tasks` distinct
pub fn id_len_for(tasks: &[Task]) -> usize {
    short_id_len(
        tasks
            .iter()
            .flat_map(|t| std::iter::once(t.id.as_str()).chain(t.subtasks.iter().map(|s| s.id.as_str()))),
    )
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    !task.completed && task.due_date.is_some_and(|d| d < today)
}

/// `today`, `tomorrow`, a weekday name within the coming week, `Jun 3`
/// otherwise.
pub fn due_label(due: NaiveDate, today: NaiveDate) -> String {
    match (due - today).num_days() {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        2..=7 => due.weekday().to_string(),
        _ => due.format("%b %-d").to_string(),
    }
}

fn checkbox(completed: bool) -> &'static str {
    if completed { "[x]" } else { "[ ]" }
}

fn format_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| format!("#{}", t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format a single task as a one-line summary
pub fn format_task_line(task: &Task, today: NaiveDate, id_len: usize) -> String {
    let mut line = format!("{} {} ", checkbox(task.completed), short_id(&task.id, id_len));
    if task.is_flagged() {
        line.push_str("! ");
    }
    line.push_str(&task.text);
    if let Some(due) = task.due_date {
        line.push_str(&format!("  (due {}", due_label(due, today)));
        if is_overdue(task, today) {
            line.push_str(", overdue");
        }
        line.push(')');
    }
    if !task.tags.is_empty() {
        line.push_str("  ");
        line.push_str(&format_tags(&task.tags));
    }
    if task.is_archived {
        line.push_str("  [archived]");
    }
    line
}

fn format_subtask_line(subtask: &Subtask, id_len: usize) -> String {
    format!(
        "    {} {} {}",
        checkbox(subtask.completed),
        short_id(&subtask.id, id_len),
        subtask.text
    )
}

/// Format a task with its subtasks, indented
pub fn format_task_tree(task: &Task, today: NaiveDate, id_len: usize) -> Vec<String> {
    let mut lines = vec![format_task_line(task, today, id_len)];
    lines.extend(task.subtasks.iter().map(|s| format_subtask_line(s, id_len)));
    lines
}

/// Format detailed task view
pub fn format_task_detail(task: &Task, today: NaiveDate, id_len: usize) -> Vec<String> {
    let mut lines = vec![format!("{} {}", checkbox(task.completed), task.text)];
    lines.push(format!("id: {}", task.id));
    if task.is_important {
        lines.push("important: yes".to_string());
    }
    if let Some(due) = task.due_date {
        let overdue = if is_overdue(task, today) { " (overdue)" } else { "" };
        lines.push(format!("due: {} ({}){}", due, due_label(due, today), overdue));
    }
    if !task.tags.is_empty() {
        lines.push(format!("tags: {}", format_tags(&task.tags)));
    }
    if task.is_archived {
        lines.push("archived: yes".to_string());
    }
    if !task.notes.is_empty() {
        lines.push("notes:".to_string());
        for line in task.notes.lines() {
            lines.push(format!("  {}", line));
        }
    }
    if !task.subtasks.is_empty() {
        let done = task.subtasks.iter().filter(|s| s.completed).count();
        lines.push(String::new());
        lines.push(format!("subtasks ({}/{}):", done, task.subtasks.len()));
        lines.extend(task.subtasks.iter().map(|s| format_subtask_line(s, id_len)));
    }
    lines
}

/// Header naming the filter, sort and search of a view
pub fn format_view_header(state: &ViewState) -> String {
    let mut header = format!("== {} · {} ==", state.filter, state.sort);
    if let Some(term) = state.search_term() {
        header.push_str(&format!(" search: \"{}\"", term));
    }
    header
}

/// Format a whole view: header, tasks or the empty message, summary
pub fn format_view(view: &View<'_>, state: &ViewState, today: NaiveDate, id_len: usize) -> Vec<String> {
    let mut lines = vec![format_view_header(state), String::new()];
    match &view.empty_state {
        Some(empty) => lines.push(empty.to_string()),
        None => {
            for task in &view.tasks {
                lines.extend(format_task_tree(task, today, id_len));
            }
        }
    }
    lines.push(String::new());
    lines.push(format_summary(&view.stats));
    lines
}

pub fn format_summary(stats: &ViewStats) -> String {
    format!(
        "{} active, {} completed ({}% complete)",
        stats.active, stats.completed, stats.percent
    )
}

pub fn format_stats(stats: &ViewStats) -> Vec<String> {
    let mut lines = vec![
        format!("total:      {}", stats.total),
        format!("active:     {}", stats.active),
        format!("completed:  {}", stats.completed),
        format!("progress:   {}%", stats.percent),
        format!("archivable: {}", stats.archivable),
        format!("archived:   {}", stats.archived),
    ];
    if !stats.tags.is_empty() {
        lines.push(format!("tags:       {}", format_tags(&stats.tags)));
    }
    lines
}
