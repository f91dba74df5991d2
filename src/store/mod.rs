//! Allow-list and budget store
//!
//! The access list is an ordered sequence of (identity, budget) records kept
//! in two aligned comma-separated lines of an env file.

pub mod access;
pub mod envfile;
pub mod record;

pub use access::AccessStore;
pub use envfile::{EnvKeys, DEFAULT_BUDGET_KEY, DEFAULT_IDENTITY_KEY};
pub use record::{BudgetPolicy, Record};
