//! Error types and loop control shared by the shell and its commands.

use std::io;

use rustyline::error::ReadlineError;
use thiserror::Error;

use crate::errors::TinError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

/// Failure of a single command. Reported to the user; the shell keeps running.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No session selected. Use `open` or `use` first.")]
    NoActiveSession,
    #[error("No challenge is waiting for an answer.")]
    NoPendingChallenge,
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Core(#[from] TinError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

/// Fatal shell error: ends the session with a non-zero exit code.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] TinError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Readline(#[from] ReadlineError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
}
