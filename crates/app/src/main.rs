mod render;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use services::{ChallengeStore, Clock};
use storage::json::DEFAULT_FILE_NAME;
use storage::repository::Storage;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::render::{Board, render_board};

#[derive(Parser)]
#[command(name = "challenge", about = "Track a group's progress toward a shared problem goal")]
struct Cli {
    /// JSON file holding the challenge
    #[arg(long, env = "CHALLENGE_DATA_FILE", default_value = DEFAULT_FILE_NAME, global = true)]
    data_file: PathBuf,

    /// Disable ANSI colors even on a terminal
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show goal, winners and every member's progress (default)
    Show,
    /// Add a member to the challenge
    Add { name: String },
    /// Remove a member from the challenge
    Remove { name: String },
    /// Record one solved problem for a member
    Inc { name: String },
    /// Take back one solved problem for a member
    Dec { name: String },
    /// Set the number of problems needed to win (values below 1 become 1)
    Goal {
        #[arg(allow_negative_numbers = true)]
        count: i64,
    },
    /// Wipe every member and start over
    Reset {
        /// Confirm that the whole challenge should be discarded
        #[arg(long)]
        yes: bool,
    },
}

fn run(cli: Cli) -> Result<()> {
    // One store per process; every command below goes through it.
    let storage = Storage::json_file(&cli.data_file);
    let mut store = ChallengeStore::open(Clock::system(), Arc::clone(&storage.state))
        .with_context(|| format!("Failed to open {}", cli.data_file.display()))?;
    debug!(path = %cli.data_file.display(), "store ready");

    let command = cli.command.unwrap_or(Command::Show);
    let save_context = || format!("Failed to save {}", cli.data_file.display());
    match command {
        Command::Show => {}
        Command::Add { name } => {
            if store.add_member(&name).with_context(save_context)? {
                println!("{name} added to the challenge!");
            } else {
                println!("Member already exists or invalid name");
            }
        }
        Command::Remove { name } => {
            if store.remove_member(&name).with_context(save_context)? {
                println!("{name} removed from the challenge");
            } else {
                println!("Invalid member selection");
            }
        }
        Command::Inc { name } => {
            if !store.increment_problems(&name).with_context(save_context)? {
                println!("Cannot add a problem for {name}: unknown member or goal already reached");
            }
        }
        Command::Dec { name } => {
            if !store.decrement_problems(&name).with_context(save_context)? {
                println!("Cannot remove a problem for {name}: unknown member or nothing solved");
            }
        }
        Command::Goal { count } => {
            let goal = store.set_total_goal(count).with_context(save_context)?;
            println!("Problem count updated to {goal}!");
        }
        Command::Reset { yes } => {
            if yes {
                store.reset_challenge().with_context(save_context)?;
                println!("The challenge has been completely reset!");
            } else {
                println!("Please confirm to reset the challenge (pass --yes).");
            }
        }
    }

    let winners = store.winners();
    let standings = store.standings();
    let board = Board {
        goal: store.state().total_goal(),
        winners: &winners,
        standings: &standings,
    };
    let ansi = !cli.no_color && std::io::stdout().is_terminal();
    println!();
    print!("{}", render_board(&board, ansi));
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("{err:#}");
        std::process::exit(2);
    }
}
