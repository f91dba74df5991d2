//! Request parsing
//!
//! A request is one line of transport text, e.g. `/adduser 42 10`,
//! `/showusers@MyBot` or the callback data of a menu button.

use crate::error::{Error, Result};

use super::menu::MenuAction;

pub const ADD_USAGE: &str = "Usage: /adduser <user_id> <budget>";
pub const DELETE_USAGE: &str = "Usage: /deleteuser <user_id>";
pub const EDIT_USAGE: &str = "Usage: /editbudget <user_id> <new_budget>";

/// A parsed access list command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the menu
    Start,
    ShowUsers,
    AddUser { identity: String, budget: String },
    DeleteUser { identity: String },
    EditBudget { identity: String, budget: String },
}

/// Something a requester sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Command(Command),
    Button(MenuAction),
}

impl Command {
    /// Build a command from its name and argument tokens.
    ///
    /// Missing arguments are a usage error; surplus arguments are ignored.
    pub fn from_tokens(name: &str, args: &[&str]) -> Result<Self> {
        let name = normalize_name(name);
        match name.as_str() {
            "start" | "menu" | "help" => Ok(Command::Start),
            "showusers" | "list" => Ok(Command::ShowUsers),
            "adduser" | "add" => match args {
                [identity, budget, ..] => Ok(Command::AddUser {
                    identity: identity.to_string(),
                    budget: budget.to_string(),
                }),
                _ => Err(Error::Usage { usage: ADD_USAGE }),
            },
            "deleteuser" | "delete" => match args {
                [identity, ..] => Ok(Command::DeleteUser {
                    identity: identity.to_string(),
                }),
                _ => Err(Error::Usage { usage: DELETE_USAGE }),
            },
            "editbudget" | "edit" => match args {
                [identity, budget, ..] => Ok(Command::EditBudget {
                    identity: identity.to_string(),
                    budget: budget.to_string(),
                }),
                _ => Err(Error::Usage { usage: EDIT_USAGE }),
            },
            _ => Err(Error::UnknownCommand { name }),
        }
    }

    /// Canonical command name, as a transport would register it
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::ShowUsers => "showusers",
            Command::AddUser { .. } => "adduser",
            Command::DeleteUser { .. } => "deleteuser",
            Command::EditBudget { .. } => "editbudget",
        }
    }

    /// Whether running the command can change the access list
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::AddUser { .. } | Command::DeleteUser { .. } | Command::EditBudget { .. }
        )
    }
}

impl Request {
    /// Parse one line of transport text
    pub fn parse(line: &str) -> Result<Self> {
        let mut tokens = line.split_whitespace();
        let Some(head) = tokens.next() else {
            return Err(Error::UnknownCommand {
                name: String::new(),
            });
        };
        let args: Vec<&str> = tokens.collect();
        Self::from_tokens(head, &args)
    }

    /// Command name and arguments as a transport delivers them; a name that
    /// is no command may still be a button's callback data
    pub fn from_tokens(name: &str, args: &[&str]) -> Result<Self> {
        match Command::from_tokens(name, args) {
            Err(Error::UnknownCommand { name }) => MenuAction::from_callback(&name)
                .map(Request::Button)
                .ok_or(Error::UnknownCommand { name }),
            other => other.map(Request::Command),
        }
    }
}

/// `/AddUser@MyBot` -> `adduser`
fn normalize_name(name: &str) -> String {
    let name = name.strip_prefix('/').unwrap_or(name);
    let name = name.split_once('@').map_or(name, |(cmd, _bot)| cmd);
    name.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slash_commands() {
        assert_eq!(
            Request::parse("/adduser 42 10").unwrap(),
            Request::Command(Command::AddUser {
                identity: "42".into(),
                budget: "10".into()
            })
        );
        assert_eq!(
            Request::parse("/deleteuser 7").unwrap(),
            Request::Command(Command::DeleteUser { identity: "7".into() })
        );
        assert_eq!(
            Request::parse("  /editbudget   7  3 ").unwrap(),
            Request::Command(Command::EditBudget {
                identity: "7".into(),
                budget: "3".into()
            })
        );
        assert_eq!(
            Request::parse("/showusers").unwrap(),
            Request::Command(Command::ShowUsers)
        );
    }

    #[test]
    fn test_bot_suffix_and_case_are_ignored() {
        assert_eq!(
            Request::parse("/ShowUsers@EnvBot").unwrap(),
            Request::Command(Command::ShowUsers)
        );
        assert_eq!(
            Request::parse("start").unwrap(),
            Request::Command(Command::Start)
        );
    }

    #[test]
    fn test_short_aliases() {
        assert_eq!(
            Command::from_tokens("add", &["1", "2"]).unwrap().name(),
            "adduser"
        );
        assert_eq!(
            Command::from_tokens("list", &[]).unwrap(),
            Command::ShowUsers
        );
    }

    #[test]
    fn test_missing_arguments_are_usage_errors() {
        match Command::from_tokens("adduser", &["1"]) {
            Err(Error::Usage { usage }) => assert_eq!(usage, ADD_USAGE),
            other => panic!("expected usage error, got {:?}", other),
        }
        assert!(matches!(
            Command::from_tokens("deleteuser", &[]),
            Err(Error::Usage { usage: DELETE_USAGE })
        ));
        assert!(matches!(
            Command::from_tokens("editbudget", &["1"]),
            Err(Error::Usage { usage: EDIT_USAGE })
        ));
    }

    #[test]
    fn test_extra_arguments_are_ignored() {
        assert_eq!(
            Command::from_tokens("deleteuser", &["1", "2", "3"]).unwrap(),
            Command::DeleteUser { identity: "1".into() }
        );
    }

    #[test]
    fn test_button_callbacks() {
        assert_eq!(
            Request::parse("show_users").unwrap(),
            Request::Button(MenuAction::ShowUsers)
        );
        assert_eq!(
            Request::parse("edit_budget").unwrap(),
            Request::Button(MenuAction::EditBudget)
        );
    }

    #[test]
    fn test_unknown_command() {
        match Request::parse("/frobnicate 1") {
            Err(Error::UnknownCommand { name }) => assert_eq!(name, "frobnicate"),
            other => panic!("expected unknown command, got {:?}", other),
        }
        assert!(Request::parse("   ").is_err());
    }

    #[test]
    fn test_mutation_flag() {
        assert!(!Command::ShowUsers.is_mutation());
        assert!(Command::DeleteUser { identity: "1".into() }.is_mutation());
    }
}
