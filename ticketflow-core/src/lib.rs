//! # ticketflow-core
//!
//! Ticket lifecycle engine for ticketflow.
//!
//! This crate provides:
//! - The fixed transition table for ticket states
//! - Ticket and audit-record types
//! - The ticket engine (registry, transitions, history)
//! - An injectable clock for transition timestamps

pub mod clock;
pub mod engine;
pub mod error;
pub mod model;
pub mod table;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{TicketEngine, TransitionOutcome};
pub use error::{ParseEnumError, TableError, TicketError};
pub use model::{Action, StateChange, Ticket, TicketPriority, TicketState};
pub use table::TransitionTable;
