//! Command layer between a messaging transport and the access list
//!
//! The transport hands over a request (a text line or name plus tokens),
//! the [`Dispatcher`] runs it against the store and returns the reply text.

pub mod dispatch;
pub mod menu;
pub mod request;

pub use dispatch::{render_listing, Dispatcher, Reply};
pub use menu::render_menu;
pub use request::Command;
