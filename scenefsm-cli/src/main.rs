//! scenefsm-cli - Command-line tools for scenefsm programs
//!
//! Checks, inspects, and interactively steps state machine programs.

mod commands;
mod repl;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scenefsm-cli")]
#[command(about = "Check, inspect, and step scenefsm state machine programs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a program and report diagnostics
    Check {
        /// Program file
        file: PathBuf,
    },

    /// Print the token stream of a program
    Tokens {
        /// Program file
        file: PathBuf,
    },

    /// Print the parsed commands in normalized form
    Commands {
        /// Program file
        file: PathBuf,
    },

    /// Print the compiled state graph and transition table
    Graph {
        /// Program file
        file: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Step a program interactively
    Repl {
        /// Program file
        file: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Repl { file } => repl::run(file)?,
        cmd => match commands::execute(cmd) {
            Ok(output) => {
                if !output.text.is_empty() {
                    println!("{}", output.text);
                }
                if !output.success {
                    std::process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
