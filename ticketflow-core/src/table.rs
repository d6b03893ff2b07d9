//! Ticket transition table.
//!
//! The standard table:
//!
//! | State       | Actions                                                           |
//! |-------------|-------------------------------------------------------------------|
//! | CREATED     | assign → ASSIGNED, cancel → CANCELLED, invalidate → DEAD          |
//! | ASSIGNED    | start_work → IN_PROGRESS, invalidate → DEAD                       |
//! | IN_PROGRESS | hold → ON_HOLD, resolve → RESOLVED, cancel → CANCELLED, invalidate → DEAD |
//! | ON_HOLD     | resume → IN_PROGRESS, cancel → CANCELLED, abandon → DEAD          |
//! | RESOLVED    | reopen → IN_PROGRESS, close → CLOSED, cancel → CANCELLED, finalize → DEAD |
//! | CANCELLED   | finalize → DEAD                                                   |
//! | CLOSED      | (terminal)                                                        |
//! | DEAD        | (terminal)                                                        |

use crate::error::TableError;
use crate::model::{Action, TicketState};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

static NO_ACTIONS: BTreeMap<Action, TicketState> = BTreeMap::new();

/// Entries of the standard table as (from, action, to).
pub const STANDARD_ENTRIES: [(TicketState, Action, TicketState); 17] = {
    use Action::*;
    use TicketState::*;
    [
        (Created, Assign, Assigned),
        (Created, Cancel, Cancelled),
        (Created, Invalidate, Dead),
        (Assigned, StartWork, InProgress),
        (Assigned, Invalidate, Dead),
        (InProgress, Hold, OnHold),
        (InProgress, Resolve, Resolved),
        (InProgress, Cancel, Cancelled),
        (InProgress, Invalidate, Dead),
        (OnHold, Resume, InProgress),
        (OnHold, Cancel, Cancelled),
        (OnHold, Abandon, Dead),
        (Resolved, Reopen, InProgress),
        (Resolved, Close, Closed),
        (Resolved, Cancel, Cancelled),
        (Resolved, Finalize, Dead),
        (Cancelled, Finalize, Dead),
    ]
};

/// Read-only mapping from (state, action) to destination state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    transitions: HashMap<TicketState, BTreeMap<Action, TicketState>>,
}

impl TransitionTable {
    /// Builds the standard ticket lifecycle table.
    pub fn standard() -> Self {
        let mut transitions: HashMap<TicketState, BTreeMap<Action, TicketState>> =
            HashMap::new();
        for (from, action, to) in STANDARD_ENTRIES {
            transitions.entry(from).or_default().insert(action, to);
        }
        Self { transitions }
    }

    /// Builds and validates a table from (from, action, to) entries.
    ///
    /// Rejects self-transitions and repeated (state, action) pairs.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (TicketState, Action, TicketState)>,
    ) -> Result<Self, TableError> {
        let mut transitions: HashMap<TicketState, BTreeMap<Action, TicketState>> =
            HashMap::new();
        for (from, action, to) in entries {
            if from == to {
                return Err(TableError::SelfTransition {
                    state: from,
                    action,
                });
            }
            let actions = transitions.entry(from).or_default();
            if actions.insert(action, to).is_some() {
                return Err(TableError::DuplicateEntry {
                    state: from,
                    action,
                });
            }
        }
        Ok(Self { transitions })
    }

    /// Returns the legal actions from `state` and where each one leads.
    /// Empty for terminal states.
    pub fn legal_actions(&self, state: TicketState) -> &BTreeMap<Action, TicketState> {
        self.transitions.get(&state).unwrap_or(&NO_ACTIONS)
    }

    /// Looks up the destination of `action` from `state`.
    pub fn resolve(&self, state: TicketState, action: Action) -> Option<TicketState> {
        self.legal_actions(state).get(&action).copied()
    }

    /// Returns true if no action leads out of `state`.
    pub fn is_terminal(&self, state: TicketState) -> bool {
        self.legal_actions(state).is_empty()
    }

    /// All states, in lifecycle order.
    pub fn states(&self) -> impl Iterator<Item = TicketState> {
        TicketState::ALL.into_iter()
    }

    pub fn terminal_states(&self) -> Vec<TicketState> {
        self.states().filter(|s| self.is_terminal(*s)).collect()
    }

    /// Returns every state reachable from `start` through one or more actions.
    pub fn reachable_from(&self, start: TicketState) -> BTreeSet<TicketState> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(state) = queue.pop_front() {
            for &next in self.legal_actions(state).values() {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::standard()
    }
}
