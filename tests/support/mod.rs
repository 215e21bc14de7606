//! Test support utilities for stagehand integration tests.
//!
//! Provides isolated test environments and helper commands. Commands that
//! touch a cloud always run with `--dry-run`.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test environment with isolated temp directories.
///
/// Each test gets its own working dir and home dir. Child processes use
/// `.current_dir()` so tests can safely run in parallel.
pub struct Test {
    /// Working directory for the command
    pub dir: TempDir,
    /// Temporary home directory
    pub home: TempDir,
}

impl Test {
    /// Create a new empty test environment.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");

        Self { dir, home }
    }

    /// Create a test environment with the shipped personality templates in
    /// `./bootstrap/personality`.
    pub fn with_templates() -> Self {
        let t = Self::new();
        let dest = t.personality_dir();
        std::fs::create_dir_all(&dest).expect("failed to create personality dir");
        for name in PERSONALITY_FILES {
            std::fs::copy(shipped_templates().join(name), dest.join(name))
                .expect("failed to copy template");
        }
        t
    }

    /// Default personality directory inside the test dir.
    pub fn personality_dir(&self) -> PathBuf {
        self.dir.path().join("bootstrap").join("personality")
    }

    /// Write `./stagehand.toml`.
    pub fn write_config(&self, contents: &str) {
        std::fs::write(self.dir.path().join("stagehand.toml"), contents)
            .expect("failed to write config");
    }
}

/// Templates shipped with the crate.
pub fn shipped_templates() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/bootstrap/personality"))
}
