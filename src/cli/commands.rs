use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

use crate::model::view::{Filter, SortMode};

#[derive(Parser)]
#[command(name = "tl", about = concat!("taskline v", env!("CARGO_PKG_VERSION"), " - a quick-add task list"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different task data file
    #[arg(long, global = true, value_name = "PATH")]
    pub data: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task: `tl add Buy milk due:tomorrow #errand !important`
    Add(AddArgs),
    /// List tasks in the current view
    List(ListArgs),
    /// Show task details
    Show(IdArg),
    /// Toggle a task's completion
    Done(IdArg),
    /// Toggle a task's importance
    Star(IdArg),
    /// Change a task's fields
    Edit(EditArgs),
    /// Permanently delete a task and its subtasks
    Rm(IdArg),
    /// Archive all completed tasks
    Archive,
    /// Bring an archived task back
    Unarchive(IdArg),
    /// Move a task (manual sort only)
    Mv(MvArgs),
    /// Manage subtasks
    Sub(SubCmd),
    /// Change and save the view (filter, sort, search)
    View(ViewArgs),
    /// Show completion statistics
    Stats,
    /// List tags in use
    Tags,
}

// ---------------------------------------------------------------------------
// Task args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct IdArg {
    /// Task ID (any unique prefix)
    pub id: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task text, with optional due:, #tag/@tag and !important keywords
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub text: Vec<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Filter for this listing only (all, active, completed, important, archived, tag:<name>)
    #[arg(long)]
    pub filter: Option<Filter>,
    /// Sort for this listing only
    #[arg(long)]
    pub sort: Option<SortMode>,
    /// Search for this listing only
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID (any unique prefix)
    pub id: String,
    /// New task text
    #[arg(long)]
    pub text: Option<String>,
    /// Due date: YYYY-MM-DD, today, tomorrow, nextweek or a weekday
    #[arg(long, conflicts_with = "no_due")]
    pub due: Option<String>,
    /// Remove the due date
    #[arg(long)]
    pub no_due: bool,
    /// Replace tags (comma-separated)
    #[arg(long)]
    pub tags: Option<String>,
    /// Replace notes
    #[arg(long)]
    pub notes: Option<String>,
    /// Mark as important
    #[arg(long, conflicts_with = "not_important")]
    pub important: bool,
    /// Clear the important flag
    #[arg(long)]
    pub not_important: bool,
}

#[derive(Args)]
#[command(group(ArgGroup::new("dest").required(true).args(["before", "after", "top", "bottom"])))]
pub struct MvArgs {
    /// Task ID (any unique prefix)
    pub id: String,
    /// Move before this task
    #[arg(long)]
    pub before: Option<String>,
    /// Move after this task
    #[arg(long)]
    pub after: Option<String>,
    /// Move to the top of the list
    #[arg(long)]
    pub top: bool,
    /// Move to the end of the open tasks
    #[arg(long)]
    pub bottom: bool,
}

// ---------------------------------------------------------------------------
// Subtask args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SubCmd {
    #[command(subcommand)]
    pub action: SubAction,
}

#[derive(Subcommand)]
pub enum SubAction {
    /// Add a subtask
    Add(SubAddArgs),
    /// Toggle a subtask's completion
    Done(SubIdArgs),
    /// Change a subtask's text
    Edit(SubEditArgs),
    /// Delete a subtask
    Rm(SubIdArgs),
}

#[derive(Args)]
pub struct SubAddArgs {
    /// Parent task ID
    pub parent: String,
    /// Subtask text
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub text: Vec<String>,
}

#[derive(Args)]
pub struct SubIdArgs {
    /// Parent task ID
    pub parent: String,
    /// Subtask ID (any unique prefix within the parent)
    pub sub: String,
}

#[derive(Args)]
pub struct SubEditArgs {
    /// Parent task ID
    pub parent: String,
    /// Subtask ID (any unique prefix within the parent)
    pub sub: String,
    /// New subtask text
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub text: Vec<String>,
}

// ---------------------------------------------------------------------------
// View args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ViewArgs {
    /// all, active, completed, important, archived or tag:<name>
    #[arg(long)]
    pub filter: Option<Filter>,
    /// manual, creation-asc, creation-desc, due-date, priority or alphabetical
    #[arg(long)]
    pub sort: Option<SortMode>,
    /// Search term
    #[arg(long, conflicts_with = "clear_search")]
    pub search: Option<String>,
    /// Clear the search term
    #[arg(long)]
    pub clear_search: bool,
}
