//! Command dispatch
//!
//! Routes parsed requests to the [`AccessStore`] and turns every outcome,
//! failures included, into reply text for the requester.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::store::{AccessStore, Record};

use super::menu::{render_menu, MenuAction};
use super::request::{Command, Request};

pub const LISTING_HEADER: &str = "Allowed Users and Budgets:";
pub const USER_ADDED: &str = "User added successfully.";
pub const USER_DELETED: &str = "User deleted successfully.";
pub const BUDGET_UPDATED: &str = "User's budget updated successfully.";
pub const USER_EXISTS: &str = "User already exists.";
pub const USER_NOT_FOUND: &str = "User not found.";
pub const SAVE_FAILED: &str = "Failed to save changes. The user list was not modified.";

/// Text sent back for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// The menu should be shown again after this reply
    pub show_menu: bool,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            show_menu: false,
        }
    }

    fn with_menu(mut self) -> Self {
        self.show_menu = true;
        self
    }
}

/// Listing text: header followed by one `User: <id>, Budget: <b>` line per record
pub fn render_listing(records: &[Record]) -> String {
    let mut out = String::from(LISTING_HEADER);
    for record in records {
        out.push('\n');
        out.push_str(&record.to_string());
    }
    out
}

/// Reply text for a failed request
pub fn reply_for_error(err: &Error) -> String {
    match err {
        Error::Usage { usage } => usage.to_string(),
        Error::UserExists { .. } => USER_EXISTS.to_string(),
        Error::UserNotFound { .. } => USER_NOT_FOUND.to_string(),
        Error::InvalidArgument { .. } => err.to_string(),
        Error::UnknownCommand { name } => {
            format!("Unknown command: {}. Send /start to see the menu.", name)
        }
        Error::StoreWrite { .. } | Error::StoreRead { .. } | Error::Io(_) => {
            SAVE_FAILED.to_string()
        }
        _ => format!("Request failed: {}", err),
    }
}

/// A duplicate add or a malformed argument ends the exchange without the
/// menu; a lookup miss or a failed save offers it again
fn menu_after_failure(err: &Error) -> bool {
    matches!(
        err,
        Error::UserNotFound { .. } | Error::StoreWrite { .. } | Error::StoreRead { .. }
    )
}

/// Executes requests against a shared store
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<AccessStore>,
}

impl Dispatcher {
    pub fn new(store: Arc<AccessStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &AccessStore {
        &self.store
    }

    /// Run one command; store outcomes are returned as errors
    pub fn execute(&self, command: &Command) -> Result<Reply> {
        debug!(command = command.name(), "Executing command");

        match command {
            Command::Start => Ok(Reply::text(render_menu())),
            Command::ShowUsers => Ok(Reply::text(render_listing(&self.store.list())).with_menu()),
            Command::AddUser { identity, budget } => {
                self.store.add(identity, budget)?;
                Ok(Reply::text(USER_ADDED).with_menu())
            }
            Command::DeleteUser { identity } => {
                self.store.delete(identity)?;
                Ok(Reply::text(USER_DELETED).with_menu())
            }
            Command::EditBudget { identity, budget } => {
                self.store.edit(identity, budget)?;
                Ok(Reply::text(BUDGET_UPDATED).with_menu())
            }
        }
    }

    /// Resolve a menu button press
    pub fn press(&self, action: MenuAction) -> Reply {
        match action {
            MenuAction::ShowUsers => self.run(&Command::ShowUsers),
            MenuAction::Start => self.run(&Command::Start),
            other => Reply::text(other.hint().unwrap_or_default()),
        }
    }

    /// Run one command, rendering failures as reply text
    pub fn run(&self, command: &Command) -> Reply {
        match self.execute(command) {
            Ok(reply) => reply,
            Err(e) => {
                log_failure(command.name(), &e);
                Reply {
                    text: reply_for_error(&e),
                    show_menu: command.is_mutation() && menu_after_failure(&e),
                }
            }
        }
    }

    /// Handle a request given as name plus argument tokens
    pub fn handle_tokens(&self, name: &str, args: &[&str]) -> Reply {
        self.handle(Request::from_tokens(name, args), name)
    }

    /// Handle one line of transport text
    pub fn handle_line(&self, line: &str) -> Reply {
        self.handle(Request::parse(line), line.trim())
    }

    fn handle(&self, request: Result<Request>, raw: &str) -> Reply {
        match request {
            Ok(Request::Command(command)) => self.run(&command),
            Ok(Request::Button(action)) => self.press(action),
            Err(e) => {
                log_failure(raw, &e);
                Reply::text(reply_for_error(&e))
            }
        }
    }
}

fn log_failure(command: &str, err: &Error) {
    if err.is_recoverable() {
        debug!(command, outcome = %err, "Request rejected");
    } else if matches!(err, Error::StoreWrite { .. }) {
        error!(command, error = %err.format_for_log(), "Request failed");
    } else {
        warn!(command, error = %err.format_for_log(), "Request failed");
    }
}
