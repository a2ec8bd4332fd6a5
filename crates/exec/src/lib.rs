//! External tool discovery and invocation.
//!
//! Every piece of real work scandoc does happens in somebody else's process:
//! `scanimage` talks to the hardware, ImageMagick merges pages and Ghostscript
//! shrinks the result. This crate finds those executables and runs them one at
//! a time, blocking until they exit. There is no timeout unless one is
//! explicitly configured; scanners are slow and operators are slower.

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};
use tracing::instrument;

/// How often a child process is polled when a timeout is configured.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A resolved external executable.
#[derive(Clone, Debug)]
pub struct Tool {
    name: String,
    path: PathBuf,
    /// Arguments placed before anything the caller adds, for tools that are
    /// launched through a wrapper (`flatpak run <app>`, `sh -c <script>`).
    leading: Vec<OsString>,
    timeout: Option<Duration>,
}

impl Tool {
    /// Search `PATH` for the first executable in `candidates`.
    pub fn discover(candidates: &[&str]) -> Result<Self> {
        for exe in candidates {
            if let Ok(path) = which::which(exe) {
                tracing::trace!(tool = exe, path = %path.display(), "Discovered executable");
                return Ok(Self { name: exe.to_string(), path, leading: Vec::new(), timeout: None });
            }
        }
        tracing::info!(candidates = ?candidates, "No candidate executable found in PATH");
        exn::bail!(ErrorKind::NotFound(candidates.join(", ")));
    }

    /// Use an explicitly configured executable if there is one, otherwise
    /// fall back to [`discover()`](Self::discover).
    ///
    /// The configured value may be a bare program name (looked up in `PATH`)
    /// or a path to the executable.
    pub fn resolve(configured: Option<&Path>, candidates: &[&str]) -> Result<Self> {
        let Some(configured) = configured else {
            return Self::discover(candidates);
        };
        let path = which::which(configured)
            .or_raise(|| ErrorKind::NotFound(configured.display().to_string()))?;
        let name = configured
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| configured.display().to_string());
        Ok(Self { name, path, leading: Vec::new(), timeout: None })
    }

    /// Always pass `args` first.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading = args.into_iter().map(Into::into).collect();
        self
    }

    /// Report this tool under a different name in logs and errors.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Kill the tool if it runs for longer than `timeout`. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A fresh [`Command`] for this tool. Arguments and stdio redirection are
    /// up to the caller; hand it back to [`run()`](Self::run) to execute.
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.path);
        command.args(&self.leading);
        command
    }

    /// Spawn `command` and block until it exits.
    ///
    /// Succeeds only on exit code zero.
    #[instrument(skip_all, fields(tool = %self.name))]
    pub fn run(&self, command: &mut Command) -> Result<()> {
        tracing::debug!(command = ?command, "Invoking external tool");
        let mut child = command.spawn().or_raise(|| ErrorKind::Spawn(self.name.clone()))?;
        let status = match self.timeout {
            None => child.wait().or_raise(|| ErrorKind::Io)?,
            Some(limit) => self.wait_with_timeout(&mut child, limit)?,
        };
        match status.code() {
            Some(0) => Ok(()),
            Some(code) => {
                tracing::debug!(code, "External tool failed");
                exn::bail!(ErrorKind::Failed { tool: self.name.clone(), code })
            },
            None => exn::bail!(ErrorKind::Terminated(self.name.clone())),
        }
    }

    fn wait_with_timeout(&self, child: &mut Child, limit: Duration) -> Result<ExitStatus> {
        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait().or_raise(|| ErrorKind::Io)? {
                return Ok(status);
            }
            if started.elapsed() >= limit {
                tracing::warn!(timeout = ?limit, "External tool exceeded timeout; killing it");
                // The child may have exited between the poll and the kill.
                let _ = child.kill();
                let _ = child.wait();
                exn::bail!(ErrorKind::Timeout(self.name.clone()));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}
