mod view;

use std::path::Path;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::state::{ViewStatePersister, read_view_state, view_state_path};
use crate::io::storage::{JsonFileGateway, StorageError};
use crate::model::config::Config;
use crate::model::now::Now;
use crate::model::task::Task;
use crate::ops::store::{Placement, TaskStore};
use crate::parse::{ParseError, resolve_due_date};
use crate::session::{Change, Command, Outcome, Session};

type CliResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli, config: &Config) -> CliResult {
    let json = cli.json;
    let data_path = config_io::data_path(config, cli.data.as_deref());
    let now = Now::local();
    let mut session = open_session(&data_path, config, now)?;
    let ctx = Ctx { json, now };

    match cli.command {
        // Read commands
        Commands::List(args) => view::cmd_list(&session, args, ctx),
        Commands::Show(args) => cmd_show(&session, args, ctx),
        Commands::Stats => view::cmd_stats(&session, ctx),
        Commands::Tags => view::cmd_tags(&session, ctx),

        // Write commands
        Commands::Add(args) => cmd_add(&mut session, args, ctx),
        Commands::Done(args) => cmd_done(&mut session, args, ctx),
        Commands::Star(args) => cmd_star(&mut session, args, ctx),
        Commands::Edit(args) => cmd_edit(&mut session, args, ctx),
        Commands::Rm(args) => cmd_rm(&mut session, args, ctx),
        Commands::Archive => cmd_archive(&mut session, ctx),
        Commands::Unarchive(args) => cmd_unarchive(&mut session, args, ctx),
        Commands::Mv(args) => cmd_mv(&mut session, args, ctx),
        Commands::Sub(args) => cmd_sub(&mut session, args, ctx),
        Commands::View(args) => view::cmd_view(&mut session, args, ctx),
    }
}

/// Per-invocation flags and clock reading
#[derive(Clone, Copy)]
struct Ctx {
    json: bool,
    now: Now,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_session(data_path: &Path, config: &Config, now: Now) -> Result<Session, StorageError> {
    let state_path = view_state_path(data_path);
    let view = read_view_state(&state_path).unwrap_or_else(|| config.view.initial_state());
    let mut session = Session::open(JsonFileGateway::new(data_path), view, now)?;
    session.subscribe(ViewStatePersister::new(state_path));
    Ok(session)
}

/// Run a command, reporting warnings on stderr
fn run(session: &mut Session, command: Command, ctx: Ctx) -> Result<Outcome, Box<dyn std::error::Error>> {
    let outcome = session.dispatch(command, ctx.now)?;
    for warning in &outcome.warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(outcome)
}

/// Resolve a task id from an exact id or a unique prefix.
fn resolve_task_id(store: &TaskStore, prefix: &str) -> Result<String, String> {
    if prefix.is_empty() {
        return Err("task id cannot be empty".to_string());
    }
    if store.get(prefix).is_some() {
        return Ok(prefix.to_string());
    }
    let matches: Vec<&Task> = store
        .tasks()
        .iter()
        .filter(|t| t.id.starts_with(prefix))
        .collect();
    match matches.as_slice() {
        [] => Err(format!("no task matches '{}'", prefix)),
        [task] => Ok(task.id.clone()),
        many => Err(format!("'{}' is ambiguous ({} tasks match)", prefix, many.len())),
    }
}

/// Resolve a subtask id within its parent from an exact id or a unique prefix.
fn resolve_subtask_id(parent: &Task, prefix: &str) -> Result<String, String> {
    if prefix.is_empty() {
        return Err("subtask id cannot be empty".to_string());
    }
    if parent.subtask(prefix).is_some() {
        return Ok(prefix.to_string());
    }
    let matches: Vec<&str> = parent
        .subtasks
        .iter()
        .map(|s| s.id.as_str())
        .filter(|id| id.starts_with(prefix))
        .collect();
    match matches.as_slice() {
        [] => Err(format!("no subtask of '{}' matches '{}'", parent.text, prefix)),
        [id] => Ok(id.to_string()),
        many => Err(format!("'{}' is ambiguous ({} subtasks match)", prefix, many.len())),
    }
}

/// Resolve a parent prefix and a subtask prefix together
fn resolve_subtask(store: &TaskStore, parent: &str, sub: &str) -> Result<(String, String), String> {
    let parent_id = resolve_task_id(store, parent)?;
    let task = store
        .get(&parent_id)
        .ok_or_else(|| format!("task not found: {}", parent_id))?;
    let sub_id = resolve_subtask_id(task, sub)?;
    Ok((parent_id, sub_id))
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the outcome of a write command: JSON summary, or a line of text
fn report(ctx: Ctx, action: &'static str, id: Option<&str>, outcome: &Outcome, text: String) -> CliResult {
    if ctx.json {
        print_json(&ActionJson {
            action,
            id,
            ids: Vec::new(),
            warnings: outcome.warnings.clone(),
        })
    } else {
        println!("{}", text);
        Ok(())
    }
}

/// One-line summary of the task's current state
fn task_line(session: &Session, id: &str, today: chrono::NaiveDate) -> String {
    let tasks = session.store().tasks();
    match session.store().get(id) {
        Some(task) => format_task_line(task, today, id_len_for(tasks)),
        None => id.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_show(session: &Session, args: IdArg, ctx: Ctx) -> CliResult {
    let store = session.store();
    let id = resolve_task_id(store, &args.id)?;
    let task = store.get(&id).ok_or_else(|| format!("task not found: {}", id))?;

    if ctx.json {
        print_json(&task_to_json(task, ctx.now.today, None))
    } else {
        for line in format_task_detail(task, ctx.now.today, id_len_for(store.tasks())) {
            println!("{}", line);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(session: &mut Session, args: AddArgs, ctx: Ctx) -> CliResult {
    let outcome = run(session, Command::AddTask(args.text.join(" ")), ctx)?;
    let id = outcome
        .created_id()
        .ok_or("task was not created")?
        .to_string();
    if ctx.json {
        report(ctx, "add", Some(&id), &outcome, String::new())
    } else {
        println!("{}", id);
        Ok(())
    }
}

fn cmd_done(session: &mut Session, args: IdArg, ctx: Ctx) -> CliResult {
    let id = resolve_task_id(session.store(), &args.id)?;
    let outcome = run(session, Command::ToggleCompletion(id.clone()), ctx)?;
    let line = task_line(session, &id, ctx.now.today);
    report(ctx, "toggle-completion", Some(&id), &outcome, line)
}

fn cmd_star(session: &mut Session, args: IdArg, ctx: Ctx) -> CliResult {
    let id = resolve_task_id(session.store(), &args.id)?;
    let outcome = run(session, Command::TogglePriority(id.clone()), ctx)?;
    let line = task_line(session, &id, ctx.now.today);
    report(ctx, "toggle-priority", Some(&id), &outcome, line)
}

fn cmd_edit(session: &mut Session, args: EditArgs, ctx: Ctx) -> CliResult {
    let id = resolve_task_id(session.store(), &args.id)?;
    let task = session
        .store()
        .get(&id)
        .ok_or_else(|| format!("task not found: {}", id))?;

    // Unspecified fields keep their current value
    let mut fields = task.fields();
    if let Some(text) = args.text {
        fields.text = text;
    }
    if let Some(due) = args.due {
        fields.due_date = Some(
            resolve_due_date(&due, ctx.now.today).ok_or(ParseError::InvalidDate(due))?,
        );
    }
    if args.no_due {
        fields.due_date = None;
    }
    if let Some(tags) = args.tags {
        fields.tags = tags.split(',').map(str::to_string).collect();
    }
    if let Some(notes) = args.notes {
        fields.notes = notes;
    }
    if args.important {
        fields.is_important = true;
    }
    if args.not_important {
        fields.is_important = false;
    }

    let outcome = run(session, Command::EditTask(id.clone(), fields), ctx)?;
    let line = task_line(session, &id, ctx.now.today);
    report(ctx, "edit", Some(&id), &outcome, line)
}

fn cmd_rm(session: &mut Session, args: IdArg, ctx: Ctx) -> CliResult {
    let id = resolve_task_id(session.store(), &args.id)?;
    let outcome = run(session, Command::DeleteTask(id.clone()), ctx)?;
    report(ctx, "delete", Some(&id), &outcome, format!("deleted {}", id))
}

fn cmd_archive(session: &mut Session, ctx: Ctx) -> CliResult {
    let outcome = run(session, Command::ArchiveCompleted, ctx)?;
    let archived: Vec<&str> = outcome
        .changes
        .iter()
        .filter_map(|c| match c {
            Change::TasksArchived(ids) => Some(ids.iter().map(String::as_str)),
            _ => None,
        })
        .flatten()
        .collect();

    if ctx.json {
        return print_json(&ActionJson {
            action: "archive",
            id: None,
            ids: archived,
            warnings: outcome.warnings.clone(),
        });
    }
    match archived.len() {
        0 => println!("nothing to archive"),
        1 => println!("archived 1 task"),
        n => println!("archived {} tasks", n),
    }
    Ok(())
}

fn cmd_unarchive(session: &mut Session, args: IdArg, ctx: Ctx) -> CliResult {
    let id = resolve_task_id(session.store(), &args.id)?;
    let outcome = run(session, Command::UnarchiveTask(id.clone()), ctx)?;
    let line = task_line(session, &id, ctx.now.today);
    report(ctx, "unarchive", Some(&id), &outcome, line)
}

fn cmd_mv(session: &mut Session, args: MvArgs, ctx: Ctx) -> CliResult {
    let store = session.store();
    let id = resolve_task_id(store, &args.id)?;
    let (target, placement) = if let Some(ref before) = args.before {
        (Some(resolve_task_id(store, before)?), Placement::Before)
    } else if let Some(ref after) = args.after {
        (Some(resolve_task_id(store, after)?), Placement::After)
    } else if args.top {
        (None, Placement::Before)
    } else {
        (None, Placement::After)
    };

    let outcome = run(
        session,
        Command::Reorder {
            id: id.clone(),
            target,
            placement,
        },
        ctx,
    )?;
    report(ctx, "move", Some(&id), &outcome, format!("moved {}", id))
}

fn cmd_sub(session: &mut Session, args: SubCmd, ctx: Ctx) -> CliResult {
    match args.action {
        SubAction::Add(args) => {
            let parent = resolve_task_id(session.store(), &args.parent)?;
            let outcome = run(
                session,
                Command::AddSubtask {
                    parent,
                    text: args.text.join(" "),
                },
                ctx,
            )?;
            let id = outcome
                .created_id()
                .ok_or("subtask was not created")?
                .to_string();
            if ctx.json {
                report(ctx, "add-subtask", Some(&id), &outcome, String::new())
            } else {
                println!("{}", id);
                Ok(())
            }
        }
        SubAction::Done(args) => {
            let (parent, id) = resolve_subtask(session.store(), &args.parent, &args.sub)?;
            let outcome = run(
                session,
                Command::ToggleSubtask {
                    parent: parent.clone(),
                    id: id.clone(),
                },
                ctx,
            )?;
            let line = task_line(session, &parent, ctx.now.today);
            report(ctx, "toggle-subtask", Some(&id), &outcome, line)
        }
        SubAction::Edit(args) => {
            let (parent, id) = resolve_subtask(session.store(), &args.parent, &args.sub)?;
            let outcome = run(
                session,
                Command::EditSubtask {
                    parent,
                    id: id.clone(),
                    text: args.text.join(" "),
                },
                ctx,
            )?;
            report(ctx, "edit-subtask", Some(&id), &outcome, format!("updated {}", id))
        }
        SubAction::Rm(args) => {
            let (parent, id) = resolve_subtask(session.store(), &args.parent, &args.sub)?;
            let outcome = run(
                session,
                Command::DeleteSubtask {
                    parent,
                    id: id.clone(),
                },
                ctx,
            )?;
            report(ctx, "delete-subtask", Some(&id), &outcome, format!("deleted {}", id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Subtask;

    fn store_with_ids(ids: &[&str]) -> TaskStore {
        TaskStore::from_tasks(
            ids.iter()
                .enumerate()
                .map(|(i, id)| Task::new(id.to_string(), i as i64 + 1, format!("Task {}", i)))
                .collect(),
        )
    }

    #[test]
    fn resolve_by_exact_id_or_unique_prefix() {
        let store = store_with_ids(&["abc123", "abd456", "abc"]);
        assert_eq!(resolve_task_id(&store, "abc"), Ok("abc".to_string()));
        assert_eq!(resolve_task_id(&store, "abd"), Ok("abd456".to_string()));
        assert!(resolve_task_id(&store, "ab").unwrap_err().contains("ambiguous"));
        assert!(resolve_task_id(&store, "zz").unwrap_err().contains("no task"));
        assert!(resolve_task_id(&store, "").is_err());
    }

    #[test]
    fn resolve_subtask_within_parent() {
        let mut parent = Task::new("p".into(), 1, "Parent".into());
        parent.subtasks = vec![
            Subtask::new("s-one".into(), "One".into()),
            Subtask::new("s-two".into(), "Two".into()),
        ];
        assert_eq!(resolve_subtask_id(&parent, "s-t"), Ok("s-two".to_string()));
        assert!(resolve_subtask_id(&parent, "s-").unwrap_err().contains("ambiguous"));

        let store = TaskStore::from_tasks(vec![parent]);
        assert_eq!(
            resolve_subtask(&store, "p", "s-o"),
            Ok(("p".to_string(), "s-one".to_string()))
        );
    }
}
