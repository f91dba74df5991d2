//! File-backed access list
//!
//! `AccessStore` owns the ordered record list and the env file it came from.
//! Every mutation runs check, mutate and persist under one lock and only
//! commits the new list in memory once the file rewrite has succeeded, so a
//! failed write never leaves memory and disk disagreeing.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::envfile::{self, EnvKeys};
use super::record::{validate_budget, validate_identity, BudgetPolicy, Record};
use crate::error::{Error, Result};

/// Previous budget of an edited record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetChange {
    pub identity: String,
    pub previous: String,
    pub current: String,
}

/// Access list backed by an env file
pub struct AccessStore {
    path: PathBuf,
    keys: EnvKeys,
    policy: BudgetPolicy,
    records: Mutex<Vec<Record>>,
}

impl AccessStore {
    /// Load the access list from `path`.
    ///
    /// A missing or unreadable file is an error; the bot must not start with
    /// an undefined access list.
    pub fn open(path: impl Into<PathBuf>, keys: EnvKeys, policy: BudgetPolicy) -> Result<Self> {
        let path = path.into();
        let content = read_env_file(&path)?;
        let records = envfile::parse_records(&content, &keys, &path)?;

        info!(
            path = %path.display(),
            records = records.len(),
            "Access list loaded"
        );

        Ok(Self {
            path,
            keys,
            policy,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current records, in file order
    pub fn list(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Append a new identity with its budget
    pub fn add(&self, identity: &str, budget: &str) -> Result<Record> {
        let record = Record::new(identity, budget, self.policy)?;

        let added = self.mutate(|records| {
            if records.iter().any(|r| r.identity == record.identity) {
                return Err(Error::user_exists(&record.identity));
            }
            records.push(record.clone());
            Ok(record)
        })?;

        info!(identity = %added.identity, budget = %added.budget, "User added");
        Ok(added)
    }

    /// Remove an identity and its budget
    pub fn delete(&self, identity: &str) -> Result<Record> {
        let removed = self.mutate(|records| {
            let index = position(records, identity)?;
            Ok(records.remove(index))
        })?;

        info!(identity = %removed.identity, "User deleted");
        Ok(removed)
    }

    /// Replace the budget of an existing identity
    pub fn edit(&self, identity: &str, budget: &str) -> Result<BudgetChange> {
        validate_budget(budget, self.policy)?;

        let change = self.mutate(|records| {
            let index = position(records, identity)?;
            let previous = std::mem::replace(&mut records[index].budget, budget.to_string());
            Ok(BudgetChange {
                identity: identity.to_string(),
                previous,
                current: budget.to_string(),
            })
        })?;

        info!(
            identity = %change.identity,
            previous = %change.previous,
            budget = %change.current,
            "User budget updated"
        );
        Ok(change)
    }

    /// Run `op` against a copy of the records, persist the copy, then commit it.
    fn mutate<T>(&self, op: impl FnOnce(&mut Vec<Record>) -> Result<T>) -> Result<T> {
        let mut guard = self.records.lock();
        let mut next = guard.clone();
        let out = op(&mut next)?;

        if let Err(e) = self.persist(&next) {
            warn!(error = %e.format_for_log(), "Access list change discarded");
            return Err(e);
        }

        *guard = next;
        Ok(out)
    }

    /// Rewrite the reserved keys, keeping every other line as it is on disk now
    fn persist(&self, records: &[Record]) -> Result<()> {
        let current = read_env_file(&self.path).map_err(|e| match e {
            Error::StoreRead { path, source } => Error::StoreWrite { path, source },
            other => other,
        })?;
        let rendered = envfile::render(&current, &self.keys, records);

        envfile::write_atomic(&self.path, &rendered).map_err(|source| Error::StoreWrite {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), records = records.len(), "Env file rewritten");
        Ok(())
    }
}

fn position(records: &[Record], identity: &str) -> Result<usize> {
    validate_identity(identity)?;
    records
        .iter()
        .position(|r| r.identity == identity)
        .ok_or_else(|| Error::user_not_found(identity))
}

fn read_env_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::StoreRead {
        path: path.to_path_buf(),
        source,
    })
}
