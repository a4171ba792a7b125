//! External front-end build step.
//!
//! The build is opaque: a command run in the project root that either exits
//! zero or fails with captured output.
use crate::error::DashError;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

pub const BUILD_COMMAND_ENV: &str = "DASHPACK_BUILD_COMMAND";
pub const DEFAULT_BUILD_COMMAND: &str = "npm run build";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    pub argv: Vec<String>,
    pub cwd: PathBuf,
}

impl BuildCommand {
    /// Resolve the build command: explicit flag, then the environment, then
    /// `npm run build`.
    pub fn resolve(flag: Option<&str>, cwd: &Path) -> Result<Self> {
        let from_env = env::var(BUILD_COMMAND_ENV).ok();
        let raw = flag
            .or(from_env.as_deref())
            .unwrap_or(DEFAULT_BUILD_COMMAND);
        Self::parse(raw, cwd)
    }

    pub fn parse(raw: &str, cwd: &Path) -> Result<Self> {
        let argv = shell_words::split(raw).with_context(|| format!("parse build command: {raw}"))?;
        if argv.is_empty() {
            return Err(anyhow!("build command is empty"));
        }
        Ok(Self {
            argv,
            cwd: cwd.to_path_buf(),
        })
    }

    pub fn display(&self) -> String {
        shell_words::join(&self.argv)
    }

    /// Run the build to completion, capturing both streams.
    pub fn run(&self) -> Result<(), DashError> {
        let command = self.display();
        let Some((program, args)) = self.argv.split_first() else {
            return Err(self.failure(None, "build command is empty".to_string()));
        };
        let program = which::which_in(program, env::var_os("PATH"), &self.cwd)
            .map_err(|err| self.failure(None, format!("{program}: {err}")))?;

        eprintln!("Building the UI with `{command}`");
        let start = Instant::now();
        let output = Command::new(&program)
            .args(args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|err| self.failure(None, format!("spawn {}: {err}", program.display())))?;
        let elapsed_ms = start.elapsed().as_millis();

        tracing::info!(
            command = %command,
            elapsed_ms,
            status = ?output.status.code(),
            "build step finished"
        );
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!(stdout = %stdout.trim(), "build output");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(self.failure(output.status.code(), stderr));
        }
        eprintln!("Build completed successfully");
        Ok(())
    }

    fn failure(&self, code: Option<i32>, stderr: String) -> DashError {
        DashError::BuildFailed {
            command: self.display(),
            code,
            stderr,
        }
    }
}
