use super::{CliResult, Ctx, print_json, run};
use crate::cli::commands::{ListArgs, ViewArgs};
use crate::cli::output::*;
use crate::model::view::ViewState;
use crate::ops::view::build_view;
use crate::session::{Command, Session};

/// Render `state` over the session's tasks
fn print_view(session: &Session, state: &ViewState, ctx: Ctx) -> CliResult {
    let tasks = session.store().tasks();
    let view = build_view(tasks, state, ctx.now.today);
    if ctx.json {
        return print_json(&view_to_json(&view, state, ctx.now.today));
    }
    for line in format_view(&view, state, ctx.now.today, id_len_for(tasks)) {
        println!("{}", line);
    }
    Ok(())
}

/// List with one-off overrides; the saved view state is left alone.
pub(super) fn cmd_list(session: &Session, args: ListArgs, ctx: Ctx) -> CliResult {
    let mut state = session.view_state().clone();
    if let Some(filter) = args.filter {
        state.filter = filter;
    }
    if let Some(sort) = args.sort {
        state.sort = sort;
    }
    if let Some(search) = args.search {
        state.search = search;
    }
    print_view(session, &state, ctx)
}

/// Change the saved view state, then show it
pub(super) fn cmd_view(session: &mut Session, args: ViewArgs, ctx: Ctx) -> CliResult {
    if let Some(filter) = args.filter {
        run(session, Command::SetFilter(filter), ctx)?;
    }
    if let Some(sort) = args.sort {
        run(session, Command::SetSortMode(sort), ctx)?;
    }
    if let Some(search) = args.search {
        run(session, Command::SetSearchTerm(search), ctx)?;
    }
    if args.clear_search {
        run(session, Command::SetSearchTerm(String::new()), ctx)?;
    }
    let state = session.view_state().clone();
    print_view(session, &state, ctx)
}

pub(super) fn cmd_stats(session: &Session, ctx: Ctx) -> CliResult {
    let view = session.view(ctx.now.today);
    if ctx.json {
        return print_json(&view.stats);
    }
    for line in format_stats(&view.stats) {
        println!("{}", line);
    }
    Ok(())
}

pub(super) fn cmd_tags(session: &Session, ctx: Ctx) -> CliResult {
    let view = session.view(ctx.now.today);
    if ctx.json {
        return print_json(&view.stats.tags);
    }
    for tag in &view.stats.tags {
        println!("{}", tag);
    }
    Ok(())
}
