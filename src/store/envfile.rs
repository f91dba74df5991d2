//! Env file codec
//!
//! The access list lives in two lines of a `KEY=value` file:
//!
//! ```text
//! MY_TELEGRAM_BOT_TOKEN=123:abc
//! ALLOWED_TELEGRAM_USER_IDS=42,7
//! USER_BUDGETS=10,3
//! ```
//!
//! Everything that is not one of the two reserved keys is carried through
//! byte for byte, line endings included.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::record::{validate_budget, validate_identity, BudgetPolicy, Record};
use crate::error::{Error, Result};

pub const DEFAULT_IDENTITY_KEY: &str = "ALLOWED_TELEGRAM_USER_IDS";
pub const DEFAULT_BUDGET_KEY: &str = "USER_BUDGETS";

/// Names of the two reserved keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvKeys {
    pub identity: String,
    pub budget: String,
}

impl Default for EnvKeys {
    fn default() -> Self {
        Self {
            identity: DEFAULT_IDENTITY_KEY.to_string(),
            budget: DEFAULT_BUDGET_KEY.to_string(),
        }
    }
}

/// Split a physical line into its content and its terminator
fn split_ending(line: &str) -> (&str, &str) {
    let body = line.trim_end_matches(['\r', '\n']);
    (body, &line[body.len()..])
}

/// Key of a `KEY=value` line, if the line has one
fn line_key(body: &str) -> Option<(&str, &str)> {
    body.split_once('=').map(|(k, v)| (k.trim(), v))
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Comma-separated list value; an empty value is an empty list.
///
/// Every item must be a token a request could have supplied, so whatever
/// is loaded can be written back and deleted again.
fn parse_list(
    value: &str,
    check: impl Fn(&str) -> Result<()>,
) -> std::result::Result<Vec<String>, String> {
    let value = unquote(value).trim();
    if value.is_empty() {
        return Ok(Vec::new());
    }
    let items: Vec<String> = value.split(',').map(|s| s.trim().to_string()).collect();
    for item in &items {
        if item.is_empty() {
            return Err("has an empty entry".to_string());
        }
        check(item.as_str()).map_err(|e| format!("has a malformed entry: {}", e))?;
    }
    Ok(items)
}

/// Parse the access list out of env file content.
///
/// A key that appears more than once takes its last value. Lists of unequal
/// length, malformed items and repeated identities are rejected rather than
/// repaired.
pub fn parse_records(content: &str, keys: &EnvKeys, path: &Path) -> Result<Vec<Record>> {
    let mut identities: Vec<String> = Vec::new();
    let mut budgets: Vec<String> = Vec::new();

    for (idx, line) in content.split_inclusive('\n').enumerate() {
        let (body, _) = split_ending(line);
        let Some((key, value)) = line_key(body) else {
            continue;
        };
        let (target, parsed) = if key == keys.identity {
            (&mut identities, parse_list(value, validate_identity))
        } else if key == keys.budget {
            let check = |b: &str| validate_budget(b, BudgetPolicy::Opaque);
            (&mut budgets, parse_list(value, check))
        } else {
            continue;
        };
        *target = parsed.map_err(|reason| {
            Error::store_corrupt(path, format!("line {}: {} {}", idx + 1, key, reason))
        })?;
    }

    if identities.len() != budgets.len() {
        return Err(Error::store_corrupt(
            path,
            format!(
                "{} lists {} identities but {} lists {} budgets",
                keys.identity,
                identities.len(),
                keys.budget,
                budgets.len()
            ),
        ));
    }

    {
        let mut seen = HashSet::new();
        if let Some(dup) = identities.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(Error::store_corrupt(
                path,
                format!("identity {} appears more than once", dup),
            ));
        }
    }

    Ok(identities
        .into_iter()
        .zip(budgets)
        .map(|(identity, budget)| Record { identity, budget })
        .collect())
}

/// Render env file content with the reserved keys set from `records`.
///
/// Every occurrence of a reserved key is rewritten in place; a reserved key
/// missing from `content` is appended at the end.
pub fn render(content: &str, keys: &EnvKeys, records: &[Record]) -> String {
    let identity_line = format!(
        "{}={}",
        keys.identity,
        records.iter().map(|r| r.identity.as_str()).collect::<Vec<_>>().join(",")
    );
    let budget_line = format!(
        "{}={}",
        keys.budget,
        records.iter().map(|r| r.budget.as_str()).collect::<Vec<_>>().join(",")
    );

    let mut out = String::with_capacity(content.len() + identity_line.len() + budget_line.len());
    let mut wrote_identity = false;
    let mut wrote_budget = false;

    for line in content.split_inclusive('\n') {
        let (body, ending) = split_ending(line);
        match line_key(body) {
            Some((key, _)) if key == keys.identity => {
                out.push_str(&identity_line);
                out.push_str(ending);
                wrote_identity = true;
            }
            Some((key, _)) if key == keys.budget => {
                out.push_str(&budget_line);
                out.push_str(ending);
                wrote_budget = true;
            }
            _ => out.push_str(line),
        }
    }

    for (written, line) in [
        (wrote_identity, &identity_line),
        (wrote_budget, &budget_line),
    ] {
        if written {
            continue;
        }
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(line);
        out.push('\n');
    }

    out
}

/// Replace `path` with `contents` via a temp file in the same directory.
///
/// The file keeps its permissions, and a symlinked env file is written
/// through to its target. The directory is synced after the rename so the
/// new entry survives a crash.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let target: PathBuf = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;

    if let Ok(meta) = fs::metadata(&target) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }

    tmp.persist(&target).map_err(|e| e.error)?;
    sync_directory(dir)
}

#[cfg(unix)]
fn sync_directory(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_directory(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
