//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for envbot.

use clap::{Parser, Subcommand};

/// envbot - access list and budget administration
///
/// Manages the allowed identities and their budgets stored in the bot's
/// env file, either one command at a time or as an interactive session.
#[derive(Parser, Debug)]
#[command(name = "envbot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "ENVBOT_CONFIG")]
    pub config: Option<String>,

    /// Env file holding the access list (overrides the configuration)
    #[arg(short, long, global = true, env = "ENVBOT_ENV_FILE")]
    pub env_file: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List allowed users and their budgets
    List {
        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Allow a new user with a budget
    Add {
        /// Identity of the user
        user_id: String,
        /// Budget recorded for the user
        budget: String,
    },

    /// Remove a user
    Delete {
        /// Identity of the user
        user_id: String,
    },

    /// Change the budget of a user
    Edit {
        /// Identity of the user
        user_id: String,
        /// New budget
        budget: String,
    },

    /// Run one bot-style request, e.g. `exec /adduser 42 10`
    Exec {
        /// Request text
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        request: Vec<String>,
    },

    /// Read bot-style requests from stdin, one per line, until EOF or Ctrl+C
    Serve,

    /// Print the command menu
    Menu,

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the effective configuration
    Show,

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the configuration
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_add_command() {
        let cli = Cli::parse_from(["envbot", "add", "42", "10"]);
        match cli.command {
            Commands::Add { user_id, budget } => {
                assert_eq!(user_id, "42");
                assert_eq!(budget, "10");
            }
            _ => panic!("Expected Add command"),
        }
    }

    #[test]
    fn test_add_requires_budget() {
        assert!(Cli::try_parse_from(["envbot", "add", "42"]).is_err());
    }

    #[test]
    fn test_env_file_is_global() {
        let cli = Cli::parse_from(["envbot", "list", "--env-file", "/srv/bot/.env", "--json"]);
        assert_eq!(cli.env_file, Some("/srv/bot/.env".to_string()));
        assert!(matches!(cli.command, Commands::List { json: true }));
    }

    #[test]
    fn test_exec_collects_request_tokens() {
        let cli = Cli::parse_from(["envbot", "exec", "/editbudget", "7", "-3"]);
        match cli.command {
            Commands::Exec { request } => assert_eq!(request, vec!["/editbudget", "7", "-3"]),
            _ => panic!("Expected Exec command"),
        }
    }

    #[test]
    fn test_verbose_and_quiet() {
        let cli = Cli::parse_from(["envbot", "-vv", "menu"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
        assert!(matches!(cli.command, Commands::Menu));

        let cli = Cli::parse_from(["envbot", "--quiet", "serve"]);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Serve));
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::parse_from(["envbot", "config", "init", "--force"]);
        match cli.command {
            Commands::Config {
                subcommand: ConfigSubcommand::Init { path, force },
            } => {
                assert!(path.is_none());
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
