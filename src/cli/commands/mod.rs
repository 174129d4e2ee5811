pub mod expense;
pub mod session;
pub mod system;

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::cli::core::CommandError;
use crate::cli::registry::CommandRegistry;

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    for entry in session::definitions()
        .into_iter()
        .chain(expense::definitions())
        .chain(system::definitions())
    {
        registry.register(entry);
    }
}

/// Positional arguments plus `--flag value` pairs.
#[derive(Debug, Default)]
pub(crate) struct ParsedArgs<'a> {
    pub positional: Vec<&'a str>,
    pub flags: HashMap<String, &'a str>,
}

impl<'a> ParsedArgs<'a> {
    pub fn flag(&self, name: &str) -> Option<&'a str> {
        self.flags.get(name).copied()
    }
}

pub(crate) fn parse_args<'a>(args: &[&'a str], known: &[&str]) -> Result<ParsedArgs<'a>, CommandError> {
    let mut parsed = ParsedArgs::default();
    let mut iter = args.iter().copied();
    while let Some(arg) = iter.next() {
        if let Some(flag) = arg.strip_prefix("--") {
            let flag = flag.to_ascii_lowercase();
            if !known.contains(&flag.as_str()) {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown option `--{flag}`"
                )));
            }
            let value = iter.next().ok_or_else(|| {
                CommandError::InvalidArguments(format!("option `--{flag}` needs a value"))
            })?;
            parsed.flags.insert(flag, value);
        } else {
            parsed.positional.push(arg);
        }
    }
    Ok(parsed)
}

pub(crate) fn parse_f64(raw: &str, what: &str) -> Result<f64, CommandError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| CommandError::InvalidArguments(format!("{what} must be a number, got `{raw}`")))
}

pub(crate) fn parse_u32(raw: &str, what: &str) -> Result<u32, CommandError> {
    raw.trim().parse::<u32>().map_err(|_| {
        CommandError::InvalidArguments(format!("{what} must be a whole number, got `{raw}`"))
    })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| CommandError::InvalidArguments(format!("expected YYYY-MM-DD, got `{raw}`")))
}

pub(crate) fn parse_position(raw: &str) -> Result<usize, CommandError> {
    match raw.trim().parse::<usize>() {
        Ok(position) if position > 0 => Ok(position),
        _ => Err(CommandError::InvalidArguments(format!(
            "expected a position starting at 1, got `{raw}`"
        ))),
    }
}

/// `none` clears an optional setting.
pub(crate) fn is_clear_keyword(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "none" | "off" | "clear")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_and_positionals_split() {
        let parsed = parse_args(
            &["Christmas", "150", "--date", "2026-12-25", "--NAME", "Xmas"],
            &["date", "name"],
        )
        .unwrap();
        assert_eq!(parsed.positional, vec!["Christmas", "150"]);
        assert_eq!(parsed.flag("date"), Some("2026-12-25"));
        assert_eq!(parsed.flag("name"), Some("Xmas"));
    }

    #[test]
    fn unknown_or_dangling_flags_are_rejected() {
        assert!(parse_args(&["--bogus", "1"], &["date"]).is_err());
        assert!(parse_args(&["--date"], &["date"]).is_err());
    }

    #[test]
    fn positions_start_at_one() {
        assert_eq!(parse_position("2").unwrap(), 2);
        assert!(parse_position("0").is_err());
        assert!(parse_position("two").is_err());
    }
}
