//! Session lifecycle commands: open, pick, inspect, tweak, close and delete tins.

use crate::cli::commands::{
    is_clear_keyword, parse_args, parse_date, parse_f64, parse_u32,
};
use crate::cli::core::{CommandError, CommandResult};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::render;
use crate::cli::shell_context::ShellContext;
use crate::core::metrics;
use crate::domain::{OpenSession, Session, SettingsUpdate};

const OPEN_USAGE: &str =
    "open <holiday> <budget> [--name <label>] [--calories <limit>] [--date YYYY-MM-DD] [--currency <symbol>]";
const SETTINGS_USAGE: &str =
    "settings [--budget <amount>] [--calories <limit|none>] [--currency <symbol>] [--date <YYYY-MM-DD|none>]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("open", "Open a new tin for a holiday", OPEN_USAGE, cmd_open),
        CommandEntry::new("sessions", "List every tin", "sessions", cmd_sessions),
        CommandEntry::new(
            "use",
            "Switch to a tin (no argument returns to the list)",
            "use [position|id]",
            cmd_use,
        ),
        CommandEntry::new("status", "Show the dashboard of the current tin", "status", cmd_status),
        CommandEntry::new(
            "settings",
            "Show or change budget, calorie limit, currency and event date",
            SETTINGS_USAGE,
            cmd_settings,
        ),
        CommandEntry::new("close", "Close a tin; it stays viewable", "close [position|id]", cmd_close),
        CommandEntry::new("delete", "Delete a tin for good", "delete [position|id]", cmd_delete),
    ]
}

fn cmd_open(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = parse_args(args, &["name", "calories", "date", "currency"])?;
    let [holiday, budget] = parsed.positional.as_slice() else {
        return Err(CommandError::InvalidArguments(format!("usage: {OPEN_USAGE}")));
    };

    let mut request = OpenSession::new(*holiday, parse_f64(budget, "budget")?)
        .with_currency_symbol(
            parsed
                .flag("currency")
                .unwrap_or(context.config.currency_symbol.as_str()),
        );
    if let Some(name) = parsed.flag("name") {
        request = request.with_custom_name(name);
    }
    if let Some(limit) = parsed.flag("calories") {
        request = request.with_calorie_limit(parse_u32(limit, "calorie limit")?);
    }
    if let Some(date) = parsed.flag("date") {
        request = request.with_event_date(parse_date(date)?);
    }

    let session = context.manager.open_session(request)?;
    io::print_success(format!(
        "Opened tin `{}` with a budget of {}.",
        session.label(),
        render::money(session.currency_symbol(), session.budget())
    ));
    Ok(())
}

fn cmd_sessions(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    print_session_list(context);
    Ok(())
}

fn cmd_use(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(reference) = args.first() else {
        context.manager.deactivate();
        print_session_list(context);
        return Ok(());
    };
    let id = context.resolve_session(reference)?;
    let session = context.manager.activate(id)?;
    io::print_success(format!("Now viewing `{}`.", session.label()));
    print_dashboard(context, id)
}

fn cmd_status(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let id = context.active_session()?.id();
    print_dashboard(context, id)
}

fn cmd_settings(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let session = context.active_session()?;
    let id = session.id();
    if args.is_empty() {
        print_settings(session);
        return Ok(());
    }

    let parsed = parse_args(args, &["budget", "calories", "currency", "date"])?;
    if !parsed.positional.is_empty() {
        return Err(CommandError::InvalidArguments(format!("usage: {SETTINGS_USAGE}")));
    }
    let update = SettingsUpdate {
        budget: parsed
            .flag("budget")
            .map(|raw| parse_f64(raw, "budget"))
            .transpose()?,
        calorie_limit: parsed
            .flag("calories")
            .map(|raw| {
                if is_clear_keyword(raw) {
                    Ok(None)
                } else {
                    parse_u32(raw, "calorie limit").map(Some)
                }
            })
            .transpose()?,
        currency_symbol: parsed.flag("currency").map(str::to_string),
        event_date: parsed
            .flag("date")
            .map(|raw| {
                if is_clear_keyword(raw) {
                    Ok(None)
                } else {
                    parse_date(raw).map(Some)
                }
            })
            .transpose()?,
    };

    let session = context.manager.update_settings(id, update)?;
    io::print_success("Settings saved.");
    print_settings(&session);
    Ok(())
}

fn cmd_close(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let id = target_session(context, args)?;
    let label = context.manager.session(id).map(|s| s.label().to_string()).unwrap_or_default();
    if !context.confirm(&format!("Close `{label}`? No more items can be added."))? {
        io::print_info("Close cancelled.");
        return Ok(());
    }
    context.manager.close_session(id)?;
    if context.pending.as_ref().is_some_and(|pending| pending.session() == id) {
        context.pending = None;
    }
    io::print_success(format!("Closed `{label}`. It stays in the list for reference."));
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let id = target_session(context, args)?;
    let label = context.manager.session(id).map(|s| s.label().to_string()).unwrap_or_default();
    if !context.confirm(&format!("Delete `{label}` and all of its items? This cannot be undone."))? {
        io::print_info("Delete cancelled.");
        return Ok(());
    }
    context.manager.delete_session(id)?;
    if context.pending.as_ref().is_some_and(|pending| pending.session() == id) {
        context.pending = None;
    }
    io::print_success(format!("Deleted `{label}`."));
    Ok(())
}

fn target_session(context: &ShellContext, args: &[&str]) -> Result<uuid::Uuid, CommandError> {
    match args.first() {
        Some(reference) => context.resolve_session(reference),
        None => context.active_session().map(Session::id),
    }
}

fn print_session_list(context: &ShellContext) {
    output_section("Tins");
    let sessions = context.manager.sessions();
    if sessions.is_empty() {
        io::print_info("No tins yet. Use `open <holiday> <budget>` to start one.");
        return;
    }
    let active = context.manager.active_id();
    for (index, session) in sessions.iter().enumerate() {
        io::print_info(render::session_line(
            index + 1,
            session,
            metrics::total_spent(session),
            active == Some(session.id()),
        ));
    }
}

pub(crate) fn print_dashboard(context: &ShellContext, id: uuid::Uuid) -> CommandResult {
    let snapshot = context
        .manager
        .metrics(id, context.config.effective_warning_ratio())?;
    let Some(session) = context.manager.session(id) else {
        return Err(CommandError::NoActiveSession);
    };
    output_section(session.label());
    for line in render::dashboard(session, &snapshot) {
        io::print_info(line);
    }
    Ok(())
}

fn print_settings(session: &Session) {
    output_section(format!("Settings: {}", session.label()));
    let symbol = session.currency_symbol();
    io::print_info(format!("  Budget        : {}", render::money(symbol, session.budget())));
    io::print_info(format!(
        "  Calorie limit : {}",
        session
            .calorie_limit()
            .map(|limit| format!("{limit} kcal"))
            .unwrap_or_else(|| "none".into())
    ));
    io::print_info(format!("  Currency      : {symbol}"));
    io::print_info(format!(
        "  Event date    : {}",
        session
            .event_date()
            .map(|date| date.to_string())
            .unwrap_or_else(|| "none".into())
    ));
}
