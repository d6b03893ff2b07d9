//! Guided single-ticket session.
//!
//! Walks one ticket through its lifecycle: show the state, offer the legal
//! actions, ask for an action, comment and assignee, apply it, repeat until
//! the ticket is terminal or the user exits. Prints the history at the end.

use crate::render;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::error::Error;
use std::io::Write;
use ticketflow_core::TicketEngine;

/// A source of user answers. `None` means the input ended.
pub trait Prompt {
    fn ask(&mut self, question: &str) -> Result<Option<String>, Box<dyn Error>>;
}

/// Reads answers from the terminal.
pub struct LinePrompt {
    editor: DefaultEditor,
}

impl LinePrompt {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl Prompt for LinePrompt {
    fn ask(&mut self, question: &str) -> Result<Option<String>, Box<dyn Error>> {
        match self.editor.readline(question) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Runs the guided session for an existing ticket.
pub fn run(
    engine: &TicketEngine,
    ticket_id: &str,
    prompt: &mut impl Prompt,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let ticket = engine.get_ticket(ticket_id)?;
    writeln!(out, "Created ticket: {} - {}", ticket.id.cyan(), ticket.title)?;
    writeln!(out, "Initial state: {}", ticket.current_state)?;

    loop {
        let state = engine.get_ticket(ticket_id)?.current_state;
        writeln!(out, "\nCurrent State: {}", state.to_string().yellow())?;

        let actions = engine.available_actions(ticket_id)?;
        if actions.is_empty() {
            writeln!(
                out,
                "This ticket is in a terminal state. No further actions are possible."
            )?;
            break;
        }
        writeln!(
            out,
            "Available actions: {}",
            render::format_action_names(&actions)
        )?;

        let Some(action) = prompt.ask("Enter an action (or 'exit' to quit): ")? else {
            break;
        };
        let action = action.trim().to_lowercase();
        if action == "exit" {
            break;
        }

        let comment = prompt
            .ask("Enter a comment for this action: ")?
            .unwrap_or_default();
        let assignee = prompt
            .ask("Enter assigned agent (leave blank if not applicable): ")?
            .unwrap_or_default();

        match engine.transition(ticket_id, &action, comment.trim(), Some(assignee.as_str())) {
            Ok(outcome) => writeln!(out, "\nResult: {}", outcome)?,
            Err(err) => {
                tracing::debug!("Session action rejected: {}", err);
                writeln!(out, "\nResult: {}", render::format_error(&err))?;
                writeln!(out, "Please try again with a valid action.")?;
            }
        }
    }

    writeln!(out, "\n{}", "Ticket History:".bold())?;
    write!(out, "{}", render::format_history(&engine.history(ticket_id)))?;
    Ok(())
}
