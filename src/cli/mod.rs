use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod check;
pub mod config;
pub mod connect;
pub mod serve;

use crate::engine::connect::Action;

#[derive(Subcommand)]
enum Command {
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "2222")]
        port: String,
    },
    /// Handle a phone check-in, check-out or emergency call
    Connect {
        #[arg(long, value_enum)]
        action: Action,

        /// Caller's phone number
        #[arg(long)]
        number: Option<String>,
    },
    /// Sweep the calendar for missed check-ins and check-outs
    Check {},
    /// Validate a settings file
    Config {
        #[arg(long)]
        path: String,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await?;
        }
        Some(Command::Connect { action, number }) => {
            connect::run(action, number).await?;
        }
        Some(Command::Check {}) => {
            check::run().await?;
        }
        Some(Command::Config { path }) => {
            config::run(&path)?;
        }
        None => {}
    }

    Ok(())
}
