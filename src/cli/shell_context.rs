use dialoguer::theme::ColorfulTheme;
use strsim::levenshtein;
use uuid::Uuid;

use crate::cli::commands;
use crate::cli::core::{CliError, CommandError, LoopControl};
use crate::cli::io as cli_io;
use crate::cli::registry::{CommandEntry, CommandRegistry};
use crate::config::{Config, ConfigManager};
use crate::core::gate::PendingChallenge;
use crate::core::ledger_manager::LedgerManager;
use crate::core::lookup::CatalogLookup;
use crate::domain::Session;
use crate::storage::{JsonStorage, LedgerStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub manager: LedgerManager,
    pub theme: ColorfulTheme,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub catalog: Option<CatalogLookup>,
    /// Over-budget expense waiting for its challenge answer.
    pub pending: Option<PendingChallenge>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config_manager = ConfigManager::new().map_err(crate::errors::TinError::from)?;
        let config = config_manager
            .load()
            .map_err(crate::errors::TinError::from)?;
        let storage = JsonStorage::new(config.resolve_data_dir(config_manager.base_dir()))?;
        let store = LedgerStore::with_key(Box::new(storage), config.store_key.clone());
        Ok(Self::with_parts(
            mode,
            LedgerManager::new(store),
            config_manager,
            config,
        ))
    }

    pub fn with_parts(
        mode: CliMode,
        manager: LedgerManager,
        config_manager: ConfigManager,
        config: Config,
    ) -> Self {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);
        cli_io::apply_config(&config, mode == CliMode::Script);

        let catalog = config
            .catalog_path
            .as_deref()
            .and_then(|path| match CatalogLookup::from_path(path) {
                Ok(catalog) => Some(catalog),
                Err(err) => {
                    cli_io::print_warning(format!("Barcode catalog unavailable: {err}"));
                    None
                }
            });

        Self {
            mode,
            registry,
            manager,
            theme: ColorfulTheme::default(),
            config_manager,
            config,
            catalog,
            pending: None,
            running: true,
        }
    }

    pub(crate) fn mode(&self) -> CliMode {
        self.mode
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn prompt(&self) -> String {
        let label = self.manager.active().map(Session::label).unwrap_or("no tin");
        if self.pending.is_some() {
            format!("cookie-tin({label}) ?> ")
        } else {
            format!("cookie-tin({label})> ")
        }
    }

    pub(crate) fn active_session(&self) -> Result<&Session, CommandError> {
        self.manager.active().ok_or(CommandError::NoActiveSession)
    }

    /// Resolves a 1-based position in the session list or an id prefix.
    pub(crate) fn resolve_session(&self, reference: &str) -> Result<Uuid, CommandError> {
        let sessions = self.manager.sessions();
        if let Ok(position) = reference.parse::<usize>() {
            return position
                .checked_sub(1)
                .and_then(|index| sessions.get(index))
                .map(Session::id)
                .ok_or_else(|| {
                    CommandError::InvalidArguments(format!("no session at position {position}"))
                });
        }
        let needle = reference.to_ascii_lowercase();
        let matches: Vec<Uuid> = sessions
            .iter()
            .map(Session::id)
            .filter(|id| id.simple().to_string().starts_with(&needle))
            .collect();
        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(CommandError::InvalidArguments(format!(
                "no session matches `{reference}`"
            ))),
            _ => Err(CommandError::InvalidArguments(format!(
                "`{reference}` matches several sessions"
            ))),
        }
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match crate::cli::shell::parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                cli_io::print_warning(err);
                return Ok(LoopControl::Continue);
            }
        };
        let Some((first, rest)) = tokens.split_first() else {
            return Ok(LoopControl::Continue);
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();
        self.dispatch(&first.to_lowercase(), first, &args)
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{input}`. Type `help` to see available commands."
        ));
        if let Some(best) = closest_command(self.registry.names(), input) {
            cli_io::print_info(format!("Suggestion: `{best}`?"));
        }
    }

    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, prompt, false)
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, "Exit shell?", true).map_err(|err| match err {
            CommandError::Dialoguer(err) => CliError::Dialoguer(err),
            CommandError::Io(err) => CliError::Io(err),
            other => CliError::Io(std::io::Error::other(other.to_string())),
        })
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(message);
                cli_io::print_hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::NoActiveSession => {
                cli_io::print_error(CommandError::NoActiveSession);
                cli_io::print_hint("Try `open Christmas 150` to get started.");
                Ok(())
            }
            other => {
                cli_io::print_error(other);
                Ok(())
            }
        }
    }
}

fn closest_command<'a>(names: impl Iterator<Item = &'a str>, input: &str) -> Option<&'a str> {
    let input = input.to_lowercase();
    names
        .map(|name| (levenshtein(name, &input), name))
        .filter(|(distance, _)| *distance <= 3)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_nearby_commands_only() {
        let names = ["open", "sessions", "status", "add"];
        assert_eq!(closest_command(names.into_iter(), "stauts"), Some("status"));
        assert_eq!(closest_command(names.into_iter(), "ad"), Some("add"));
        assert_eq!(closest_command(names.into_iter(), "xxxxxxxxxx"), None);
    }
}
