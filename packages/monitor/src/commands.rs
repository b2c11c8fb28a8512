//! Inbound commands.
//!
//! In `run` mode commands arrive one per line on stdin:
//!
//! ```text
//! refresh [STATE]
//! remove_state_devices STATE
//! diagnostics
//! quit
//! ```

use std::str::FromStr;

use aus_emergency_incident_models::AustralianState;
use aus_emergency_reconcile::DomainEvent;

use crate::diagnostics::Diagnostics;

/// Errors returned by command parsing and execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Not one of the supported state codes.
    #[error("Unsupported state {0:?}, expected one of SA, NSW, VIC, QLD, TAS, WA")]
    UnsupportedState(String),

    /// A supported state that has no configured entry.
    #[error("State {0} is not configured")]
    NotConfigured(AustralianState),

    /// No feed definition is registered for the state.
    #[error("No feed registered for {0}")]
    NoFeed(AustralianState),

    /// Unrecognized command word.
    #[error("Unknown command {0:?}")]
    Unknown(String),

    /// The command needs a state argument.
    #[error("{0} requires a state argument")]
    MissingState(&'static str),

    /// More arguments than the command accepts.
    #[error("Too many arguments for {0}")]
    TooManyArguments(&'static str),
}

/// Validates a state code (case-insensitive).
///
/// # Errors
///
/// Returns [`CommandError::UnsupportedState`] for anything outside the
/// supported set.
pub fn parse_state(code: &str) -> Result<AustralianState, CommandError> {
    AustralianState::from_str(code.trim())
        .map_err(|_: strum::ParseError| CommandError::UnsupportedState(code.trim().to_string()))
}

/// A parsed command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Refresh one state, or every configured state.
    Refresh(Option<AustralianState>),
    /// Drop every tracked entity of a state.
    RemoveStateDevices(AustralianState),
    /// Print diagnostics.
    Diagnostics,
    /// Shut down.
    Quit,
}

/// Result of executing a [`Command`].
#[derive(Debug)]
pub enum CommandOutcome {
    /// Events published by a refresh or removal.
    Events(Vec<DomainEvent>),
    /// Diagnostics document.
    Diagnostics(Box<Diagnostics>),
    /// Stop reading commands.
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CommandError::Unknown(String::new()));
        };
        let arg = words.next();
        let extra = words.next().is_some();

        let command = match verb.to_ascii_lowercase().as_str() {
            "refresh" => Self::Refresh(arg.map(parse_state).transpose()?),
            "remove_state_devices" => Self::RemoveStateDevices(parse_state(
                arg.ok_or(CommandError::MissingState("remove_state_devices"))?,
            )?),
            "diagnostics" if arg.is_none() => Self::Diagnostics,
            "quit" | "exit" if arg.is_none() => Self::Quit,
            "diagnostics" => return Err(CommandError::TooManyArguments("diagnostics")),
            "quit" | "exit" => return Err(CommandError::TooManyArguments("quit")),
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        if extra {
            return Err(CommandError::TooManyArguments(match command {
                Self::Refresh(_) => "refresh",
                _ => "remove_state_devices",
            }));
        }
        Ok(command)
    }
}
