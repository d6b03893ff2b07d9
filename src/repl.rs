//! Interactive multi-ticket REPL.

use crate::config::{ReplConfig, TicketDefaults};
use crate::render;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::error::Error;
use ticketflow_core::{TicketEngine, TicketPriority};

const HELP_TEXT: &str = r#"
Available commands:
  help                                   Show this help

  new [-p <priority>] <title> [| <description>]
                                         Create a ticket
  list                                   Tickets created in this session
  show <id>                              Show a ticket
  actions <id>                           Legal actions for a ticket

  do <id> <action> [@agent] [comment]    Apply an action

  history <id> [--json]                  Show a ticket's history
  table                                  Show the transition table

  quit, exit                             Exit the REPL
"#;

/// State carried across REPL commands.
pub struct Repl {
    engine: TicketEngine,
    defaults: TicketDefaults,
    /// IDs created in this session, in creation order.
    created: Vec<String>,
}

impl Repl {
    pub fn new(engine: TicketEngine, defaults: TicketDefaults) -> Self {
        Self {
            engine,
            defaults,
            created: Vec::new(),
        }
    }

    /// Executes one command line. Returns `None` when the user asked to exit.
    pub fn execute(&mut self, line: &str) -> Result<Option<String>, Box<dyn Error>> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(Some(String::new()));
        }

        let cmd = parts[0].to_lowercase();
        let args = &parts[1..];

        match cmd.as_str() {
            "help" | "?" => Ok(Some(HELP_TEXT.to_string())),

            "quit" | "exit" | "q" => Ok(None),

            "new" | "n" => {
                let (priority, rest) = match args {
                    ["-p" | "--priority", p, rest @ ..] => (p.parse::<TicketPriority>()?, rest),
                    _ => (self.defaults.default_priority, args),
                };
                if rest.is_empty() {
                    return Ok(Some(
                        "Usage: new [-p <priority>] <title> [| <description>]".to_string(),
                    ));
                }
                let text = rest.join(" ");
                let (title, description) = match text.split_once('|') {
                    Some((t, d)) => (t.trim().to_string(), d.trim().to_string()),
                    None => (text.trim().to_string(), String::new()),
                };

                let id = self.defaults.generate_id();
                let ticket = self
                    .engine
                    .create_ticket(&id, &title, &description, priority)?;
                self.created.push(ticket.id.clone());
                Ok(Some(format!(
                    "{} {} [{}] (state: {})",
                    "Created".green(),
                    ticket.id.cyan(),
                    ticket.priority,
                    ticket.current_state.to_string().yellow()
                )))
            }

            "list" | "ls" => {
                if self.created.is_empty() {
                    return Ok(Some("No tickets".yellow().to_string()));
                }
                let mut output = String::new();
                for id in &self.created {
                    let ticket = self.engine.get_ticket(id)?;
                    output.push_str(&format!(
                        "  {} {:<12} {}\n",
                        id.cyan(),
                        ticket.current_state.as_str(),
                        ticket.title
                    ));
                }
                Ok(Some(output))
            }

            "show" | "s" => {
                let [id] = args else {
                    return Ok(Some("Usage: show <id>".to_string()));
                };
                Ok(Some(render::format_ticket(&self.engine.get_ticket(id)?)))
            }

            "actions" | "a" => {
                let [id] = args else {
                    return Ok(Some("Usage: actions <id>".to_string()));
                };
                let actions = self.engine.available_actions(id)?;
                Ok(Some(render::format_actions(&actions)))
            }

            "do" | "d" => {
                let [id, action, rest @ ..] = args else {
                    return Ok(Some(
                        "Usage: do <id> <action> [@agent] [comment]".to_string(),
                    ));
                };
                let (assignee, comment) = match rest {
                    [first, comment @ ..] if first.starts_with('@') => {
                        (Some(&first[1..]), comment.join(" "))
                    }
                    _ => (None, rest.join(" ")),
                };

                let action = action.trim().to_lowercase();
                match self.engine.transition(id, &action, &comment, assignee) {
                    Ok(outcome) => Ok(Some(render::format_outcome(&outcome))),
                    Err(err) => Ok(Some(render::format_error(&err))),
                }
            }

            "history" | "h" => {
                let (id, json) = match args {
                    [id] => (*id, false),
                    [id, "--json"] => (*id, true),
                    _ => return Ok(Some("Usage: history <id> [--json]".to_string())),
                };
                if !self.engine.contains(id) {
                    return Ok(Some(format!("{}: no ticket {}", "Warning".yellow(), id)));
                }
                let history = self.engine.history(id);
                if json {
                    Ok(Some(render::format_json(&history)))
                } else {
                    Ok(Some(render::format_history(&history)))
                }
            }

            "table" | "t" => Ok(Some(render::format_table(self.engine.table()))),

            _ => Ok(Some(format!(
                "Unknown command: {}. Type 'help' for help.",
                cmd
            ))),
        }
    }
}

/// Runs the REPL until the user exits.
pub fn run(mut repl: Repl, config: &ReplConfig) -> Result<(), Box<dyn Error>> {
    println!("{}", "ticketflow".bold().cyan());

    let rl_config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(rl_config)?;

    let history_path = config.history_path();
    if let Err(e) = rl.load_history(&history_path) {
        tracing::debug!("No REPL history loaded from {}: {}", history_path.display(), e);
    }

    println!("Type 'help' for available commands.\n");

    loop {
        let prompt = format!("{} ", "ticketflow>".cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match repl.execute(line) {
                    Ok(Some(output)) => println!("{}\n", output),
                    Ok(None) => break,
                    Err(e) => println!("{}: {}\n", "Error".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    if let Err(e) = rl.save_history(&history_path) {
        tracing::warn!("Failed to save REPL history to {}: {}", history_path.display(), e);
    }

    Ok(())
}
