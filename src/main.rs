//! ticketflow - Support ticket lifecycle tracker
//!
//! Drives the ticket engine interactively: a guided single-ticket session or
//! a multi-ticket REPL.

mod config;
mod render;
mod repl;
mod session;

use clap::{Parser, Subcommand};
use colored::Colorize;
use config::Config;
use std::path::PathBuf;
use ticketflow_core::{TicketEngine, TicketPriority};
use tracing_subscriber::EnvFilter;

const DEMO_TITLE: &str = "Login Issue";
const DEMO_DESCRIPTION: &str = "User cannot login to the application";

#[derive(Parser)]
#[command(name = "ticketflow")]
#[command(about = "Track support tickets through their lifecycle")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, env = "TICKETFLOW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk one ticket through its lifecycle (default)
    Session {
        /// Ticket ID (defaults to <prefix>-001)
        #[arg(long)]
        id: Option<String>,

        /// Ticket title
        #[arg(short, long, default_value = DEMO_TITLE)]
        title: String,

        /// Ticket description
        #[arg(short, long, default_value = DEMO_DESCRIPTION)]
        description: String,

        /// Ticket priority (low, medium, high)
        #[arg(short, long)]
        priority: Option<TicketPriority>,
    },

    /// Start the interactive multi-ticket REPL
    Repl,

    /// Print the transition table
    Table,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            return Err(e.into());
        }
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    let engine = TicketEngine::new();

    match cli.command {
        Some(Commands::Table) => {
            print!("{}", render::format_table(engine.table()));
        }
        Some(Commands::Repl) => {
            repl::run(repl::Repl::new(engine, config.tickets.clone()), &config.repl)?;
        }
        Some(Commands::Session {
            id,
            title,
            description,
            priority,
        }) => {
            run_session(&engine, &config, id, &title, &description, priority)?;
        }
        None => {
            run_session(
                &engine,
                &config,
                None,
                DEMO_TITLE,
                DEMO_DESCRIPTION,
                Some(TicketPriority::High),
            )?;
        }
    }

    Ok(())
}

fn run_session(
    engine: &TicketEngine,
    config: &Config,
    id: Option<String>,
    title: &str,
    description: &str,
    priority: Option<TicketPriority>,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = id.unwrap_or_else(|| config.tickets.session_id());
    let priority = priority.unwrap_or(config.tickets.default_priority);
    engine.create_ticket(&id, title, description, priority)?;

    let mut prompt = session::LinePrompt::new()?;
    session::run(engine, &id, &mut prompt, &mut std::io::stdout())
}
