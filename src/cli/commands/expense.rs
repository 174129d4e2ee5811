//! Expense commands and the over-budget challenge flow.

use std::collections::HashSet;

use uuid::Uuid;

use crate::cli::commands::parse_position;
use crate::cli::core::{CommandError, CommandResult};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::render;
use crate::cli::shell_context::{CliMode, ShellContext};
use crate::core::gate::PendingChallenge;
use crate::core::ledger_manager::AddOutcome;
use crate::core::metrics;
use crate::domain::ExpenseCandidate;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "add",
            "Add an expense to the current tin",
            "add <name> <amount> [calories]",
            cmd_add,
        ),
        CommandEntry::new(
            "answer",
            "Answer the over-budget challenge",
            "answer <number>",
            cmd_answer,
        ),
        CommandEntry::new(
            "cancel",
            "Drop the expense waiting on a challenge",
            "cancel",
            cmd_cancel,
        ),
        CommandEntry::new(
            "items",
            "List expenses, optionally filtered by name",
            "items [search]",
            cmd_items,
        ),
        CommandEntry::new(
            "remove",
            "Remove an expense by its position in `items`",
            "remove <position>",
            cmd_remove,
        ),
        CommandEntry::new(
            "scan",
            "Add a product from the barcode catalog",
            "scan <barcode> <price>",
            cmd_scan,
        ),
    ]
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let candidate = match args {
        [name, amount] => ExpenseCandidate::parse(name, amount, None)?,
        [name, amount, calories] => ExpenseCandidate::parse(name, amount, Some(*calories))?,
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: add <name> <amount> [calories]".into(),
            ))
        }
    };
    let id = context.active_session()?.id();
    if context.pending.take().is_some() {
        io::print_warning("Previous unanswered expense dropped.");
    }
    let outcome = context.manager.add_expense(id, candidate)?;
    report_outcome(context, id, outcome, false);
    settle_interactively(context)
}

fn cmd_answer(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let pending = context
        .pending
        .clone()
        .ok_or(CommandError::NoPendingChallenge)?;
    let [answer] = args else {
        return Err(CommandError::InvalidArguments("usage: answer <number>".into()));
    };
    submit_answer(context, pending, answer)
}

fn cmd_cancel(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let pending = context.pending.take().ok_or(CommandError::NoPendingChallenge)?;
    io::print_info(format!(
        "Dropped `{}`. Nothing was added.",
        pending.candidate().name()
    ));
    Ok(())
}

fn cmd_items(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let session = context.active_session()?;
    let query = args.join(" ");
    let hits: HashSet<Uuid> = metrics::search(session, &query)
        .into_iter()
        .map(|expense| expense.id())
        .collect();

    output_section(format!("Items: {}", session.label()));
    if session.items().is_empty() {
        io::print_info("The tin is empty.");
        return Ok(());
    }
    if hits.is_empty() {
        io::print_info(format!("No items match `{query}`."));
        return Ok(());
    }
    for (index, expense) in session.items().iter().enumerate() {
        if hits.contains(&expense.id()) {
            io::print_info(render::expense_line(
                index + 1,
                session.currency_symbol(),
                expense,
            ));
        }
    }
    Ok(())
}

fn cmd_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [position] = args else {
        return Err(CommandError::InvalidArguments("usage: remove <position>".into()));
    };
    let position = parse_position(position)?;
    let session = context.active_session()?;
    let id = session.id();
    let expense = session.items().get(position - 1).ok_or_else(|| {
        CommandError::InvalidArguments(format!("no item at position {position}"))
    })?;
    let (expense_id, name) = (expense.id(), expense.name().to_string());

    let session = context.manager.remove_expense(id, expense_id)?;
    io::print_success(format!(
        "Removed `{name}`. Remaining: {}",
        render::money(session.currency_symbol(), metrics::remaining(&session))
    ));
    Ok(())
}

fn cmd_scan(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [barcode, price] = args else {
        return Err(CommandError::InvalidArguments("usage: scan <barcode> <price>".into()));
    };
    let id = context.active_session()?.id();
    let Some(catalog) = context.catalog.as_ref() else {
        return Err(CommandError::InvalidArguments(
            "no barcode catalog configured; set `catalog_path` in the config file".into(),
        ));
    };
    match context.manager.add_scanned(id, catalog, barcode, price)? {
        Some(outcome) => {
            context.pending = None;
            report_outcome(context, id, outcome, false);
            settle_interactively(context)
        }
        None => {
            io::print_warning(format!("Product `{barcode}` not found."));
            Ok(())
        }
    }
}

fn submit_answer(
    context: &mut ShellContext,
    pending: PendingChallenge,
    answer: &str,
) -> CommandResult {
    let id = pending.session();
    let outcome = context.manager.answer_challenge(pending, answer)?;
    report_outcome(context, id, outcome, true);
    Ok(())
}

/// Prints the outcome and records or clears the pending challenge.
fn report_outcome(context: &mut ShellContext, id: Uuid, outcome: AddOutcome, retry: bool) {
    match outcome {
        AddOutcome::Committed(session) => {
            context.pending = None;
            let symbol = session.currency_symbol();
            if let Some(expense) = session.items().first() {
                io::print_success(format!(
                    "Added `{}` for {}.",
                    expense.name(),
                    render::money(symbol, expense.amount())
                ));
            }
            io::print_info(format!(
                "Spent {} of {}. Remaining: {}",
                render::money(symbol, metrics::total_spent(&session)),
                render::money(symbol, session.budget()),
                render::money(symbol, metrics::remaining(&session))
            ));
        }
        AddOutcome::ChallengeRequired(challenge) => {
            if retry {
                io::print_warning("Not quite. Try this one instead.");
            } else if let Some(session) = context.manager.session(id) {
                let symbol = session.currency_symbol();
                io::print_warning(format!(
                    "Over budget! `{}` would bring spending to {} of {}.",
                    challenge.candidate().name(),
                    render::money(
                        symbol,
                        metrics::total_spent(session) + challenge.candidate().amount()
                    ),
                    render::money(symbol, session.budget())
                ));
            }
            io::print_hint(format!(
                "Solve {} to add it anyway (`answer <n>` or `cancel`).",
                challenge.challenge()
            ));
            context.pending = Some(challenge);
        }
    }
}

/// Interactive sessions answer the challenge in place; a blank reply cancels.
fn settle_interactively(context: &mut ShellContext) -> CommandResult {
    while context.mode() == CliMode::Interactive {
        let Some(pending) = context.pending.clone() else {
            break;
        };
        let reply = io::prompt_text(
            &context.theme,
            &format!("{} (blank to cancel)", pending.challenge()),
        )?;
        if reply.trim().is_empty() {
            return cmd_cancel(context, &[]);
        }
        submit_answer(context, pending, &reply)?;
    }
    Ok(())
}
