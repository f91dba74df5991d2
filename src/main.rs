//! envbot - access list and budget administration
//!
//! Loads the allowed identities and their budgets from the bot's env file
//! and applies list/add/delete/edit requests to it, rewriting the file after
//! every change.

mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod session;
mod store;

use std::sync::Arc;

use clap::Parser;
use tracing::{debug, error, info};

use crate::cli::{Cli, Commands, ConfigSubcommand};
use crate::commands::{render_listing, render_menu, Command, Dispatcher, Reply};
use crate::config::EnvbotConfig;
use crate::error::{Error, Result};
use crate::store::AccessStore;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        if e.is_fatal() {
            error!(error = %e.format_for_log(), "envbot cannot continue");
        }
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = EnvbotConfig::load(cli.config.as_deref())?;
    if let Some(ref path) = cli.env_file {
        config.set_env_file(path);
    }

    // Held until exit so file logs are flushed
    let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        env_file = %config.store.env_file,
        "Starting envbot"
    );

    match cli.command {
        Commands::Config { subcommand } => handle_config_command(subcommand, &config)?,
        Commands::Menu => println!("{}", render_menu()),
        Commands::List { json } => {
            let records = open_dispatcher(&config)?.store().list();
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                println!("{}", render_listing(&records));
            }
        }
        Commands::Add { user_id, budget } => {
            let command = Command::AddUser {
                identity: user_id,
                budget,
            };
            print_reply(open_dispatcher(&config)?.execute(&command)?);
        }
        Commands::Delete { user_id } => {
            let command = Command::DeleteUser { identity: user_id };
            print_reply(open_dispatcher(&config)?.execute(&command)?);
        }
        Commands::Edit { user_id, budget } => {
            let command = Command::EditBudget {
                identity: user_id,
                budget,
            };
            print_reply(open_dispatcher(&config)?.execute(&command)?);
        }
        Commands::Exec { request } => {
            let dispatcher = open_dispatcher(&config)?;
            // A single argument may be a whole quoted request line
            let reply = match request.as_slice() {
                [line] => dispatcher.handle_line(line),
                [name, rest @ ..] => {
                    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
                    dispatcher.handle_tokens(name, &args)
                }
                [] => dispatcher.handle_line(""),
            };
            print_reply(reply);
        }
        Commands::Serve => run_session(open_dispatcher(&config)?)?,
    }

    Ok(())
}

/// Load the access list; only commands that touch it need the env file
fn open_dispatcher(config: &EnvbotConfig) -> Result<Dispatcher> {
    let store = AccessStore::open(
        config.store.env_file_path(),
        config.store.env_keys(),
        config.store.budget_policy(),
    )?;
    Ok(Dispatcher::new(Arc::new(store)))
}

fn print_reply(reply: Reply) {
    println!("{}", reply.text);
}

/// Run the stdin session on a single-threaded runtime
fn run_session(dispatcher: Dispatcher) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))?;

    runtime.block_on(session::serve_stdio(dispatcher))
}

/// Handle configuration subcommands
fn handle_config_command(subcommand: ConfigSubcommand, config: &EnvbotConfig) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show => {
            print!("{}", toml::to_string_pretty(config)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let path = config::init_config(path.as_deref(), force)?;
            info!(path = %path.display(), "Configuration file created");
            println!("Configuration file created: {}", path.display());
        }
        ConfigSubcommand::Validate => {
            config.validate()?;
            println!("Configuration is valid.");
        }
    }

    Ok(())
}
