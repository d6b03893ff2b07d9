//! Console formatting for tickets, actions and histories.

use chrono::SecondsFormat;
use colored::Colorize;
use std::collections::BTreeMap;
use ticketflow_core::{
    Action, StateChange, Ticket, TicketError, TicketState, TransitionOutcome, TransitionTable,
};

pub fn format_ticket(ticket: &Ticket) -> String {
    format!(
        "{}\n  Title: {}\n  Description: {}\n  Priority: {}\n  State: {}\n  Assigned to: {}\n  Transitions: {}",
        format!("Ticket {}", ticket.id.cyan()).bold(),
        ticket.title,
        ticket.description,
        ticket.priority,
        ticket.current_state.to_string().yellow(),
        ticket.assigned_to.as_deref().unwrap_or("-"),
        ticket.history.len()
    )
}

/// Comma-separated action names.
pub fn format_action_names(actions: &BTreeMap<Action, TicketState>) -> String {
    actions
        .keys()
        .map(|a| a.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_actions(actions: &BTreeMap<Action, TicketState>) -> String {
    if actions.is_empty() {
        return "No actions (terminal state)".yellow().to_string();
    }
    let mut output = String::new();
    for (action, to) in actions {
        output.push_str(&format!("  {:<12} → {}\n", action.as_str().cyan(), to));
    }
    output
}

pub fn format_outcome(outcome: &TransitionOutcome) -> String {
    format!(
        "{} {} on {}: {} → {}",
        "Applied".green(),
        outcome.action.as_str().cyan(),
        outcome.ticket_id,
        outcome.from_state,
        outcome.to_state.to_string().yellow()
    )
}

pub fn format_error(err: &TicketError) -> String {
    format!("{} [{}]: {}", "Rejected".red(), err.error_code(), err)
}

pub fn format_history(history: &[StateChange]) -> String {
    if history.is_empty() {
        return "No transitions".yellow().to_string();
    }
    let mut output = String::new();
    for change in history {
        output.push_str(&format!(
            "{}: {} → {} ({})\n",
            change
                .timestamp()
                .to_rfc3339_opts(SecondsFormat::Millis, true)
                .dimmed(),
            change.from_state(),
            change.to_state(),
            change.action().as_str().cyan()
        ));
        output.push_str(&format!("  Comment: {}\n", change.comment()));
    }
    output
}

pub fn format_table(table: &TransitionTable) -> String {
    let mut output = String::new();
    for state in table.states() {
        let actions = table.legal_actions(state);
        let moves = if actions.is_empty() {
            "(terminal)".dimmed().to_string()
        } else {
            actions
                .iter()
                .map(|(a, to)| format!("{} → {}", a.as_str().cyan(), to))
                .collect::<Vec<_>>()
                .join(", ")
        };
        output.push_str(&format!("  {:<12} {}\n", state.as_str(), moves));
    }
    output
}

/// Formats JSON for display.
pub fn format_json(value: &impl serde::Serialize) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}
