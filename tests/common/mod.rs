//! Common test utilities and fixtures
//!
//! Every fixture owns a temporary directory holding the env file, and
//! commands run with that directory as working directory so no config file
//! from the host is picked up by accident.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub const TOKEN_LINE: &str = "MY_TELEGRAM_BOT_TOKEN=123456:secret";

/// Temporary env file for driving the binary
pub struct EnvFixture {
    dir: TempDir,
    env_path: PathBuf,
}

impl EnvFixture {
    pub fn new(content: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let env_path = dir.path().join(".env");
        fs::write(&env_path, content).unwrap();
        Self { dir, env_path }
    }

    /// Env file with a token line and the given aligned lists
    pub fn with_users(ids: &str, budgets: &str) -> Self {
        Self::new(&format!(
            "{}\nALLOWED_TELEGRAM_USER_IDS={}\nUSER_BUDGETS={}\n",
            TOKEN_LINE, ids, budgets
        ))
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn env_path(&self) -> &Path {
        &self.env_path
    }

    pub fn content(&self) -> String {
        fs::read_to_string(&self.env_path).unwrap()
    }

    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// `envbot --env-file <fixture>` isolated from the caller's environment
    pub fn cmd(&self) -> Command {
        let mut cmd = envbot_cmd();
        cmd.current_dir(self.dir.path()).arg("--env-file").arg(&self.env_path);
        cmd
    }
}

/// Bare `envbot` command with all ENVBOT_* variables cleared
pub fn envbot_cmd() -> Command {
    let mut cmd = Command::cargo_bin("envbot").unwrap();
    for var in [
        "ENVBOT_CONFIG",
        "ENVBOT_ENV_FILE",
        "ENVBOT_IDENTITY_KEY",
        "ENVBOT_BUDGET_KEY",
        "ENVBOT_STRICT_BUDGETS",
        "ENVBOT_LOG_LEVEL",
        "ENVBOT_LOG_FILE",
        "ENVBOT_LOG_JSON",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}
