#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use witness::WitnessContext;

/// Isolated home, store, config and watched directory for one test.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub store: PathBuf,
    pub config: PathBuf,
}

impl TestEnv {
    /// Create the environment with an empty watched root.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("root");
        fs::create_dir_all(&root)?;
        let store = temp_dir.path().join("store");
        let config = temp_dir.path().join(".config/witness/config.toml");

        Ok(Self {
            temp_dir,
            root,
            store,
            config,
        })
    }

    /// The `witness` binary with all paths pointed into the environment.
    pub fn cmd(&self) -> Result<Command> {
        let mut cmd = Command::cargo_bin("witness")?;
        cmd.env("HOME", self.temp_dir.path())
            .env(witness::CONFIG_PATH_ENV, &self.config)
            .env(witness::STORE_PATH_ENV, &self.store)
            .env_remove(witness::LOG_ENV);
        Ok(cmd)
    }

    /// Library context over the same paths.
    pub fn context(&self) -> Result<WitnessContext> {
        WitnessContext::new_explicit(self.store.clone(), self.config.clone())
    }

    /// Write `content` at `relative` under the root, creating parents.
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        write_file(&self.root, relative, content)
    }
}

/// Write `content` at `relative` under `base`, creating parents.
pub fn write_file(base: &Path, relative: &str, content: &str) -> Result<PathBuf> {
    let path = base.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)?;
    Ok(path)
}
