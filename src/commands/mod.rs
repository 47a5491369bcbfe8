//! Free-text chat commands and their dispatch.
//!
//! The transport hands us raw message text; this module maps it onto the
//! command set (`TOPUP <amount>`, `SALDO`, `HELP`, `INFO`) and produces the
//! reply text the transport should deliver back.

use crate::directory::DriverDirectory;
use crate::services::admission;
use crate::services::orchestrator::{CreateOrderError, Orchestrator};
use crate::transport::messages;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Topup(i64),
    Balance,
    Help,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// `TOPUP` with a missing or non-numeric amount.
    TopupUsage,
    /// Anything that is not a known command.
    Unknown(String),
}

/// Case-insensitive, trimmed command parse.
pub fn parse(body: &str) -> Result<Command, ParseError> {
    let trimmed = body.trim();
    let upper = trimmed.to_uppercase();
    let mut parts = upper.split_whitespace();

    match parts.next() {
        Some("TOPUP") => {
            let amount = parts.next().ok_or(ParseError::TopupUsage)?;
            if parts.next().is_some() {
                return Err(ParseError::TopupUsage);
            }
            amount
                .parse::<i64>()
                .map(Command::Topup)
                .map_err(|_| ParseError::TopupUsage)
        }
        Some("SALDO") if parts.next().is_none() => Ok(Command::Balance),
        Some("HELP") if parts.next().is_none() => Ok(Command::Help),
        Some("INFO") if parts.next().is_none() => Ok(Command::Info),
        _ => Err(ParseError::Unknown(trimmed.to_string())),
    }
}

/// Routes parsed commands to the orchestrator and directory and renders the
/// reply.
pub struct CommandRouter {
    orchestrator: Arc<Orchestrator>,
    directory: Arc<dyn DriverDirectory>,
}

impl CommandRouter {
    pub fn new(orchestrator: Arc<Orchestrator>, directory: Arc<dyn DriverDirectory>) -> Self {
        Self {
            orchestrator,
            directory,
        }
    }

    pub async fn dispatch(&self, from: &str, body: &str) -> String {
        match parse(body) {
            Ok(Command::Topup(amount)) => self.handle_topup(from, amount).await,
            Ok(Command::Balance) => self.handle_balance(from).await,
            Ok(Command::Help) => messages::help_text(),
            Ok(Command::Info) => messages::info_text(),
            Err(ParseError::TopupUsage) => messages::topup_usage(),
            Err(ParseError::Unknown(text)) => messages::unknown_command(&text),
        }
    }

    async fn handle_topup(&self, from: &str, amount: i64) -> String {
        info!(from, amount, "top-up command received");

        match self.orchestrator.create_order(from, amount).await {
            Ok(ticket) => messages::payment_instructions(&ticket),
            Err(CreateOrderError::Admission(err)) => messages::admission_rejection(&err),
            Err(CreateOrderError::Gateway(err)) => {
                error!(from, %err, "payment creation failed");
                messages::gateway_unavailable()
            }
            Err(CreateOrderError::Directory(err)) => {
                error!(from, %err, "directory unavailable during admission");
                messages::internal_error()
            }
        }
    }

    async fn handle_balance(&self, from: &str) -> String {
        let identity = match admission::normalize_identity(from) {
            Some(identity) => identity,
            None => return messages::admission_rejection(&admission::AdmissionError::InvalidIdentity),
        };

        match self.directory.lookup(&identity).await {
            Ok(Some(driver)) => messages::balance_info(&driver),
            Ok(None) => {
                messages::admission_rejection(&admission::AdmissionError::UnknownDriver)
            }
            Err(err) => {
                error!(%identity, %err, "balance lookup failed");
                messages::internal_error()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_topup() {
        assert_eq!(parse("TOPUP 50000"), Ok(Command::Topup(50_000)));
        assert_eq!(parse("  topup 50000  "), Ok(Command::Topup(50_000)));
        assert_eq!(parse("Topup 1000"), Ok(Command::Topup(1_000)));
    }

    #[test]
    fn test_parse_topup_usage_errors() {
        assert_eq!(parse("TOPUP"), Err(ParseError::TopupUsage));
        assert_eq!(parse("TOPUP abc"), Err(ParseError::TopupUsage));
        assert_eq!(parse("TOPUP 50000 extra"), Err(ParseError::TopupUsage));
    }

    #[test]
    fn test_parse_simple_commands_case_insensitive() {
        assert_eq!(parse("saldo"), Ok(Command::Balance));
        assert_eq!(parse("SALDO"), Ok(Command::Balance));
        assert_eq!(parse("Help"), Ok(Command::Help));
        assert_eq!(parse("info"), Ok(Command::Info));
    }

    #[test]
    fn test_parse_unknown() {
        assert!(matches!(parse("hello there"), Err(ParseError::Unknown(_))));
        assert!(matches!(parse(""), Err(ParseError::Unknown(_))));
        assert!(matches!(parse("SALDO now"), Err(ParseError::Unknown(_))));
    }

    #[test]
    fn test_parse_negative_amount_stays_a_command() {
        // Bounds are admission's job; the parser only wants an integer.
        assert_eq!(parse("TOPUP -5"), Ok(Command::Topup(-5)));
    }
}
