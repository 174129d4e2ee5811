//! Text renderings of sessions and their metrics.

use uuid::Uuid;

use crate::core::metrics::SessionMetrics;
use crate::domain::{Expense, Session};

/// Formats `amount` with the session's symbol, sign in front: `-$10.00`.
pub fn money(symbol: &str, amount: f64) -> String {
    if amount < 0.0 {
        format!("-{symbol}{:.2}", -amount)
    } else {
        format!("{symbol}{amount:.2}")
    }
}

pub fn percent(ratio: f64) -> String {
    if ratio.is_finite() {
        format!("{:.0}%", ratio * 100.0)
    } else {
        "n/a".to_string()
    }
}

pub fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

pub fn session_line(index: usize, session: &Session, total_spent: f64, active: bool) -> String {
    let marker = if active { "*" } else { " " };
    let state = if session.is_closed() { " [closed]" } else { "" };
    let symbol = session.currency_symbol();
    format!(
        "{marker} {index:>2}. {label} ({spent} / {budget}) [{id}]{state}",
        label = session.label(),
        spent = money(symbol, total_spent),
        budget = money(symbol, session.budget()),
        id = short_id(session.id()),
    )
}

pub fn expense_line(index: usize, symbol: &str, expense: &Expense) -> String {
    let calories = expense
        .calories()
        .map(|kcal| format!(" ({kcal} kcal)"))
        .unwrap_or_default();
    format!(
        "{index:>3}. {name:<24} {amount:>10}{calories}",
        name = expense.name(),
        amount = money(symbol, expense.amount()),
    )
}

/// Dashboard body, one line per figure.
pub fn dashboard(session: &Session, metrics: &SessionMetrics) -> Vec<String> {
    let symbol = session.currency_symbol();
    let mut lines = vec![
        format!("{} - {}", metrics.level.headline(), metrics.level.subtitle()),
        format!(
            "Spent     : {} of {} ({})",
            money(symbol, metrics.total_spent),
            money(symbol, session.budget()),
            percent(metrics.spend_ratio)
        ),
        format!("Remaining : {}", money(symbol, metrics.remaining)),
    ];
    match (session.calorie_limit(), metrics.calorie_ratio) {
        (Some(limit), Some(ratio)) => lines.push(format!(
            "Calories  : {} / {} kcal ({})",
            metrics.total_calories,
            limit,
            percent(ratio)
        )),
        _ => lines.push(format!("Calories  : {} kcal", metrics.total_calories)),
    }
    if let (Some(date), Some(days)) = (session.event_date(), metrics.days_until) {
        let countdown = match days {
            0 => "today".to_string(),
            1 => "tomorrow".to_string(),
            d if d > 1 => format!("in {d} days"),
            d => format!("{} days ago", -d),
        };
        lines.push(format!("Event     : {date} ({countdown})"));
    }
    lines.push(format!("Items     : {}", metrics.item_count));
    if session.is_closed() {
        lines.push("This tin is closed.".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_puts_sign_before_symbol() {
        assert_eq!(money("$", 110.0), "$110.00");
        assert_eq!(money("$", -10.0), "-$10.00");
        assert_eq!(money("€", 0.5), "€0.50");
    }

    #[test]
    fn percent_handles_degenerate_ratios() {
        assert_eq!(percent(0.9), "90%");
        assert_eq!(percent(f64::INFINITY), "n/a");
        assert_eq!(percent(f64::NAN), "n/a");
    }
}
