//! Ticket engine - owns the ticket registry and applies transitions.

use crate::clock::{Clock, SystemClock};
use crate::error::TicketError;
use crate::model::{Action, StateChange, Ticket, TicketPriority, TicketState};
use crate::table::TransitionTable;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Result of a successful transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub ticket_id: String,
    pub action: Action,
    pub from_state: TicketState,
    pub to_state: TicketState,
    pub timestamp: DateTime<Utc>,
    /// History length after this transition.
    pub sequence: usize,
}

impl TransitionOutcome {
    /// Human-readable `FROM → TO`.
    pub fn description(&self) -> String {
        format!("{} → {}", self.from_state, self.to_state)
    }
}

impl fmt::Display for TransitionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ticket {} transitioned from {} to {}",
            self.ticket_id, self.from_state, self.to_state
        )
    }
}

/// The ticket engine.
///
/// Each ticket sits behind its own lock, so transitions on one ticket are
/// serialized while different tickets proceed in parallel.
pub struct TicketEngine {
    /// Tickets indexed by ID.
    tickets: DashMap<String, RwLock<Ticket>>,

    /// Fixed at construction.
    table: TransitionTable,

    clock: Arc<dyn Clock>,
}

impl TicketEngine {
    /// Creates an engine with the standard table and the system clock.
    pub fn new() -> Self {
        Self {
            tickets: DashMap::new(),
            table: TransitionTable::standard(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source used for transition timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the transition table.
    pub fn with_table(mut self, table: TransitionTable) -> Self {
        self.table = table;
        self
    }

    /// Returns the transition table this engine enforces.
    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Creates a ticket in the initial state.
    ///
    /// Fails with `DuplicateIdentifier` if `id` is taken; the existing ticket
    /// is left as it was.
    pub fn create_ticket(
        &self,
        id: &str,
        title: &str,
        description: &str,
        priority: TicketPriority,
    ) -> Result<Ticket, TicketError> {
        match self.tickets.entry(id.to_string()) {
            Entry::Occupied(_) => {
                tracing::warn!("Rejected duplicate ticket id {}", id);
                Err(TicketError::DuplicateIdentifier {
                    ticket_id: id.to_string(),
                })
            }
            Entry::Vacant(slot) => {
                let ticket = Ticket::new(id, title, description, priority, self.clock.now());
                slot.insert(RwLock::new(ticket.clone()));
                tracing::debug!("Created ticket {} ({})", id, priority);
                Ok(ticket)
            }
        }
    }

    /// Gets a snapshot of a ticket.
    pub fn get_ticket(&self, ticket_id: &str) -> Result<Ticket, TicketError> {
        self.tickets
            .get(ticket_id)
            .map(|r| r.read().clone())
            .ok_or_else(|| not_found(ticket_id))
    }

    pub fn contains(&self, ticket_id: &str) -> bool {
        self.tickets.contains_key(ticket_id)
    }

    /// Returns the number of tickets.
    pub fn ticket_count(&self) -> usize {
        self.tickets.len()
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Applies the action named `action` to a ticket.
    ///
    /// `action` must be an exact action name such as `start_work`; callers
    /// normalize user input first. A name that is not recognised at all is
    /// reported the same way as a known action that is not legal from the
    /// current state. A blank `assigned_to` counts as not supplied.
    pub fn transition(
        &self,
        ticket_id: &str,
        action: &str,
        comment: &str,
        assigned_to: Option<&str>,
    ) -> Result<TransitionOutcome, TicketError> {
        let ticket_lock = self
            .tickets
            .get(ticket_id)
            .ok_or_else(|| not_found(ticket_id))?;

        let mut ticket = ticket_lock.write();

        let Some(parsed) = Action::from_name(action) else {
            tracing::debug!(
                "Unknown action '{}' on ticket {} in {}",
                action,
                ticket_id,
                ticket.current_state
            );
            return Err(TicketError::IllegalAction {
                action: action.to_string(),
                state: ticket.current_state,
            });
        };

        self.apply_locked(&mut ticket, parsed, comment, assigned_to)
    }

    /// Applies a typed action to a ticket.
    pub fn apply(
        &self,
        ticket_id: &str,
        action: Action,
        comment: &str,
        assigned_to: Option<&str>,
    ) -> Result<TransitionOutcome, TicketError> {
        let ticket_lock = self
            .tickets
            .get(ticket_id)
            .ok_or_else(|| not_found(ticket_id))?;

        let mut ticket = ticket_lock.write();
        self.apply_locked(&mut ticket, action, comment, assigned_to)
    }

    /// Validates and applies `action` while the caller holds the ticket's
    /// write lock. Nothing is mutated unless the action is legal.
    fn apply_locked(
        &self,
        ticket: &mut Ticket,
        action: Action,
        comment: &str,
        assigned_to: Option<&str>,
    ) -> Result<TransitionOutcome, TicketError> {
        let from_state = ticket.current_state;

        let to_state = self.table.resolve(from_state, action).ok_or_else(|| {
            tracing::debug!(
                "Illegal action '{}' on ticket {} in {}",
                action,
                ticket.id,
                from_state
            );
            TicketError::IllegalAction {
                action: action.to_string(),
                state: from_state,
            }
        })?;

        // History timestamps never go backwards, even if the clock does
        let timestamp = self.clock.now().max(ticket.updated_at);

        let assignee = assigned_to
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        ticket.record(
            StateChange::new(from_state, to_state, action, timestamp, comment),
            assignee,
        );

        tracing::debug!(
            "Ticket {}: {} {} -> {}",
            ticket.id,
            action,
            from_state,
            to_state
        );

        Ok(TransitionOutcome {
            ticket_id: ticket.id.clone(),
            action,
            from_state,
            to_state,
            timestamp,
            sequence: ticket.history.len(),
        })
    }

    /// Returns the legal actions for a ticket's current state.
    pub fn available_actions(
        &self,
        ticket_id: &str,
    ) -> Result<BTreeMap<Action, TicketState>, TicketError> {
        let ticket_lock = self
            .tickets
            .get(ticket_id)
            .ok_or_else(|| not_found(ticket_id))?;

        let state = ticket_lock.read().current_state;
        Ok(self.table.legal_actions(state).clone())
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Returns a ticket's history, oldest first.
    ///
    /// Unknown tickets have nothing to show and yield an empty history.
    pub fn history(&self, ticket_id: &str) -> Vec<StateChange> {
        self.tickets
            .get(ticket_id)
            .map(|r| r.read().history.clone())
            .unwrap_or_default()
    }
}

impl Default for TicketEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(ticket_id: &str) -> TicketError {
    TicketError::TicketNotFound {
        ticket_id: ticket_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Duration;

    fn test_engine() -> (Arc<ManualClock>, TicketEngine) {
        let clock = Arc::new(ManualClock::default());
        let engine = TicketEngine::new().with_clock(clock.clone());
        (clock, engine)
    }

    #[test]
    fn test_create_and_get_ticket() {
        let (_clock, engine) = test_engine();

        let ticket = engine
            .create_ticket("T-1", "Login issue", "Cannot log in", TicketPriority::High)
            .unwrap();
        assert_eq!(ticket.id, "T-1");
        assert_eq!(ticket.current_state, TicketState::Created);

        let fetched = engine.get_ticket("T-1").unwrap();
        assert_eq!(fetched, ticket);
        assert!(engine.contains("T-1"));
        assert_eq!(engine.ticket_count(), 1);
    }

    #[test]
    fn test_duplicate_id_keeps_original() {
        let (_clock, engine) = test_engine();
        engine
            .create_ticket("T-1", "first", "", TicketPriority::Low)
            .unwrap();
        engine.transition("T-1", "assign", "", Some("bob")).unwrap();

        let result = engine.create_ticket("T-1", "second", "", TicketPriority::High);
        assert!(matches!(
            result,
            Err(TicketError::DuplicateIdentifier { .. })
        ));

        let kept = engine.get_ticket("T-1").unwrap();
        assert_eq!(kept.title, "first");
        assert_eq!(kept.current_state, TicketState::Assigned);
        assert_eq!(engine.ticket_count(), 1);
    }

    #[test]
    fn test_transition() {
        let (_clock, engine) = test_engine();
        engine
            .create_ticket("T-1", "t", "d", TicketPriority::Medium)
            .unwrap();

        let outcome = engine
            .transition("T-1", "assign", "triaged", Some("alice"))
            .unwrap();
        assert_eq!(outcome.from_state, TicketState::Created);
        assert_eq!(outcome.to_state, TicketState::Assigned);
        assert_eq!(outcome.action, Action::Assign);
        assert_eq!(outcome.sequence, 1);
        assert_eq!(outcome.description(), "CREATED → ASSIGNED");

        let ticket = engine.get_ticket("T-1").unwrap();
        assert_eq!(ticket.assigned_to.as_deref(), Some("alice"));
        assert_eq!(ticket.history[0].comment(), "triaged");
    }

    #[test]
    fn test_unknown_action_name_is_illegal() {
        let (_clock, engine) = test_engine();
        engine
            .create_ticket("T-1", "t", "d", TicketPriority::Medium)
            .unwrap();

        let err = engine.transition("T-1", "teleport", "", None).unwrap_err();
        assert_eq!(
            err,
            TicketError::IllegalAction {
                action: "teleport".to_string(),
                state: TicketState::Created,
            }
        );
    }

    #[test]
    fn test_action_names_must_match_exactly() {
        let (_clock, engine) = test_engine();
        engine
            .create_ticket("T-1", "t", "d", TicketPriority::Medium)
            .unwrap();
        let before = engine.get_ticket("T-1").unwrap();

        for name in ["ASSIGN", "  assign ", "Assign"] {
            let err = engine.transition("T-1", name, "", Some("alice")).unwrap_err();
            assert_eq!(
                err,
                TicketError::IllegalAction {
                    action: name.to_string(),
                    state: TicketState::Created,
                }
            );
        }
        assert_eq!(engine.get_ticket("T-1").unwrap(), before);

        engine.transition("T-1", "assign", "", None).unwrap();
        assert!(engine.transition("T-1", "Start Work", "", None).is_err());
        assert!(engine.transition("T-1", "start-work", "", None).is_err());
        assert_eq!(
            engine.get_ticket("T-1").unwrap().current_state,
            TicketState::Assigned
        );
    }

    #[test]
    fn test_not_found_wins_over_illegal_action() {
        let (_clock, engine) = test_engine();
        let err = engine.transition("nope", "teleport", "", None).unwrap_err();
        assert!(matches!(err, TicketError::TicketNotFound { .. }));
    }

    #[test]
    fn test_blank_assignee_is_ignored() {
        let (_clock, engine) = test_engine();
        engine
            .create_ticket("T-1", "t", "d", TicketPriority::Medium)
            .unwrap();
        engine.transition("T-1", "assign", "", Some("alice")).unwrap();
        engine.transition("T-1", "start_work", "", Some("   ")).unwrap();

        let ticket = engine.get_ticket("T-1").unwrap();
        assert_eq!(ticket.assigned_to.as_deref(), Some("alice"));
    }

    #[test]
    fn test_apply_typed_action() {
        let (_clock, engine) = test_engine();
        engine
            .create_ticket("T-1", "t", "d", TicketPriority::Medium)
            .unwrap();

        let outcome = engine.apply("T-1", Action::Cancel, "dup", None).unwrap();
        assert_eq!(outcome.to_state, TicketState::Cancelled);

        let result = engine.apply("T-1", Action::Cancel, "", None);
        assert!(matches!(result, Err(TicketError::IllegalAction { .. })));
    }

    #[test]
    fn test_available_actions() {
        let (_clock, engine) = test_engine();
        engine
            .create_ticket("T-1", "t", "d", TicketPriority::Medium)
            .unwrap();

        let actions = engine.available_actions("T-1").unwrap();
        let names: Vec<_> = actions.keys().map(|a| a.as_str()).collect();
        assert_eq!(names, vec!["assign", "cancel", "invalidate"]);

        engine.transition("T-1", "invalidate", "", None).unwrap();
        assert!(engine.available_actions("T-1").unwrap().is_empty());

        assert!(engine.available_actions("missing").is_err());
    }

    #[test]
    fn test_timestamps_follow_clock() {
        let (clock, engine) = test_engine();
        engine
            .create_ticket("T-1", "t", "d", TicketPriority::Medium)
            .unwrap();

        clock.advance(Duration::minutes(5));
        let first = engine.transition("T-1", "assign", "", None).unwrap();
        clock.advance(Duration::minutes(5));
        let second = engine.transition("T-1", "start_work", "", None).unwrap();

        assert_eq!(second.timestamp - first.timestamp, Duration::minutes(5));
        let history = engine.history("T-1");
        assert_eq!(history[0].timestamp(), first.timestamp);
        assert_eq!(history[1].timestamp(), second.timestamp);
    }

    #[test]
    fn test_timestamps_never_go_backwards() {
        let (clock, engine) = test_engine();
        engine
            .create_ticket("T-1", "t", "d", TicketPriority::Medium)
            .unwrap();

        clock.advance(Duration::hours(1));
        let first = engine.transition("T-1", "assign", "", None).unwrap();

        clock.advance(Duration::hours(-2));
        let second = engine.transition("T-1", "start_work", "", None).unwrap();

        assert_eq!(second.timestamp, first.timestamp);
    }

    #[test]
    fn test_custom_table() {
        let table = TransitionTable::from_entries([(
            TicketState::Created,
            Action::Close,
            TicketState::Closed,
        )])
        .unwrap();
        let engine = TicketEngine::new().with_table(table);
        engine
            .create_ticket("T-1", "t", "d", TicketPriority::Medium)
            .unwrap();

        assert!(engine.transition("T-1", "assign", "", None).is_err());
        let outcome = engine.transition("T-1", "close", "", None).unwrap();
        assert_eq!(outcome.to_state, TicketState::Closed);
    }
}
