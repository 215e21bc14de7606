//! Command helper methods for Test.

use super::{Test, CONFIG_ENV_VARS};
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create a stagehand command with an isolated environment.
    ///
    /// Returns a Command configured with:
    /// - HOME and the config dir pointing at the temporary home
    /// - every configuration variable cleared
    /// - NO_COLOR set
    /// - current directory set to the test dir
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("stagehand").expect("failed to find stagehand binary");
        cmd.env("HOME", self.home.path());
        // Windows uses USERPROFILE instead of HOME for home directory
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("XDG_CONFIG_HOME", self.home.path().join(".config"));
        cmd.env("NO_COLOR", "1");
        for var in CONFIG_ENV_VARS {
            cmd.env_remove(var);
        }
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Run `stagehand --dry-run <args>`.
    pub fn dry_run(&self, args: &[&str]) -> Output {
        self.cmd()
            .arg("--dry-run")
            .args(args)
            .output()
            .expect("failed to run stagehand")
    }

    /// Shortcut for `stagehand --dry-run create APP ENV`.
    pub fn create(&self, app: &str, env: &str, extra: &[&str]) -> Output {
        let mut args = vec!["create", app, env];
        args.extend_from_slice(extra);
        self.dry_run(&args)
    }

    /// Shortcut for `stagehand --dry-run scale APP ENV`.
    pub fn scale(&self, app: &str, env: &str, extra: &[&str]) -> Output {
        let mut args = vec!["scale", app, env];
        args.extend_from_slice(extra);
        self.dry_run(&args)
    }

    /// Shortcut for `stagehand --dry-run destroy APP ENV`.
    pub fn destroy(&self, app: &str, env: &str, extra: &[&str]) -> Output {
        let mut args = vec!["destroy", app, env];
        args.extend_from_slice(extra);
        self.dry_run(&args)
    }

    /// Shortcut for `stagehand --dry-run nodes APP ENV`.
    pub fn nodes(&self, app: &str, env: &str) -> Output {
        self.dry_run(&["nodes", app, env])
    }
}
