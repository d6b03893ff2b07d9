//! Ticket data model.
//!
//! States, priorities and actions are closed enums. Their string names only
//! appear at the boundary, through `Display` and `FromStr`.

use crate::error::ParseEnumError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketState {
    Created,
    Assigned,
    InProgress,
    OnHold,
    Resolved,
    Closed,
    Cancelled,
    Dead,
}

impl TicketState {
    /// Every state, in lifecycle order.
    pub const ALL: [TicketState; 8] = [
        TicketState::Created,
        TicketState::Assigned,
        TicketState::InProgress,
        TicketState::OnHold,
        TicketState::Resolved,
        TicketState::Closed,
        TicketState::Cancelled,
        TicketState::Dead,
    ];

    /// The only state a new ticket may start in.
    pub const INITIAL: TicketState = TicketState::Created;

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Assigned => "ASSIGNED",
            Self::InProgress => "IN_PROGRESS",
            Self::OnHold => "ON_HOLD",
            Self::Resolved => "RESOLVED",
            Self::Closed => "CLOSED",
            Self::Cancelled => "CANCELLED",
            Self::Dead => "DEAD",
        }
    }
}

impl fmt::Display for TicketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "created" => Ok(Self::Created),
            "assigned" => Ok(Self::Assigned),
            "in_progress" | "inprogress" => Ok(Self::InProgress),
            "on_hold" | "onhold" => Ok(Self::OnHold),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            "cancelled" => Ok(Self::Cancelled),
            "dead" => Ok(Self::Dead),
            _ => Err(ParseEnumError {
                expected: "state",
                got: s.to_string(),
            }),
        }
    }
}

/// Ticket priority. Informational only; never consulted by transitions.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TicketPriority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketPriority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseEnumError {
                expected: "priority",
                got: s.to_string(),
            }),
        }
    }
}

/// A named operation attempted against a ticket's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Assign,
    StartWork,
    Hold,
    Resume,
    Resolve,
    Reopen,
    Close,
    Cancel,
    Invalidate,
    Abandon,
    Finalize,
}

impl Action {
    pub const ALL: [Action; 11] = [
        Action::Assign,
        Action::StartWork,
        Action::Hold,
        Action::Resume,
        Action::Resolve,
        Action::Reopen,
        Action::Close,
        Action::Cancel,
        Action::Invalidate,
        Action::Abandon,
        Action::Finalize,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::StartWork => "start_work",
            Self::Hold => "hold",
            Self::Resume => "resume",
            Self::Resolve => "resolve",
            Self::Reopen => "reopen",
            Self::Close => "close",
            Self::Cancel => "cancel",
            Self::Invalidate => "invalidate",
            Self::Abandon => "abandon",
            Self::Finalize => "finalize",
        }
    }

    /// Looks up an action by its exact name, e.g. `start_work`.
    pub fn from_name(name: &str) -> Option<Action> {
        Action::ALL.into_iter().find(|a| a.as_str() == name)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::from_name(&normalize(s)).ok_or_else(|| ParseEnumError {
            expected: "action",
            got: s.to_string(),
        })
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase().replace(['-', ' '], "_")
}

/// Immutable audit record of one applied transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    from_state: TicketState,
    to_state: TicketState,
    action: Action,
    timestamp: DateTime<Utc>,
    comment: String,
}

impl StateChange {
    pub(crate) fn new(
        from_state: TicketState,
        to_state: TicketState,
        action: Action,
        timestamp: DateTime<Utc>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            from_state,
            to_state,
            action,
            timestamp,
            comment: comment.into(),
        }
    }

    pub fn from_state(&self) -> TicketState {
        self.from_state
    }

    pub fn to_state(&self) -> TicketState {
        self.to_state
    }

    /// The action that produced this change.
    pub fn action(&self) -> Action {
        self.action
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Free-text comment; may be empty.
    pub fn comment(&self) -> &str {
        &self.comment
    }
}

/// A tracked unit of work.
///
/// Tickets handed out by the engine are snapshots; changing one does not
/// affect the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique ticket ID.
    pub id: String,

    pub title: String,

    pub description: String,

    pub priority: TicketPriority,

    /// Current lifecycle state.
    pub current_state: TicketState,

    /// Agent the ticket is assigned to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,

    /// Applied transitions, oldest first.
    pub history: Vec<StateChange>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last applied transition (or creation).
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Creates a ticket in the initial state with no history.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        priority: TicketPriority,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            priority,
            current_state: TicketState::INITIAL,
            assigned_to: None,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a change and moves the ticket to its target state.
    pub(crate) fn record(&mut self, change: StateChange, assigned_to: Option<String>) {
        debug_assert_eq!(change.from_state, self.current_state);
        self.current_state = change.to_state;
        self.updated_at = change.timestamp;
        if let Some(agent) = assigned_to {
            self.assigned_to = Some(agent);
        }
        self.history.push(change);
    }

    /// Returns the most recent change, if any.
    pub fn last_change(&self) -> Option<&StateChange> {
        self.history.last()
    }
}
