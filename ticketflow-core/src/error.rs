//! Core error types.

use crate::model::{Action, TicketState};
use thiserror::Error;

/// Errors returned by the ticket engine.
///
/// None of these are fatal: each one leaves the registry untouched and the
/// caller decides whether to retry with different input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketError {
    #[error("ticket not found: {ticket_id}")]
    TicketNotFound { ticket_id: String },

    #[error("illegal action '{action}' for state {state}")]
    IllegalAction { action: String, state: TicketState },

    #[error("ticket already exists: {ticket_id}")]
    DuplicateIdentifier { ticket_id: String },
}

impl TicketError {
    /// Returns whether the caller can recover by retrying with other input.
    pub fn is_retryable(&self) -> bool {
        match self {
            TicketError::TicketNotFound { .. }
            | TicketError::IllegalAction { .. }
            | TicketError::DuplicateIdentifier { .. } => true,
        }
    }

    /// Returns a stable error code for callers that branch on the kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            TicketError::TicketNotFound { .. } => "TICKET_NOT_FOUND",
            TicketError::IllegalAction { .. } => "ILLEGAL_ACTION",
            TicketError::DuplicateIdentifier { .. } => "DUPLICATE_IDENTIFIER",
        }
    }
}

/// Errors from building a custom transition table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("self-transition on '{action}' from {state}")]
    SelfTransition { state: TicketState, action: Action },

    #[error("duplicate transition from {state} on '{action}'")]
    DuplicateEntry { state: TicketState, action: Action },
}

/// A boundary string did not name a known state, priority or action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {expected}: '{got}'")]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}
