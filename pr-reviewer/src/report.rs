//! Failure and output reporting.
//!
//! A run has one reporting channel:
//! - failures are logged and emitted as `::error::` workflow commands on stdout
//! - outputs are appended to the `GITHUB_OUTPUT` file as `name=value`
//!
//! The in-memory sink records the same information without touching stdout
//! or the filesystem, which is what the tests assert on.

use std::{
    fs::OpenOptions,
    io::Write,
    path::PathBuf,
    sync::{Mutex, MutexGuard},
};

use tracing::{error, info, warn};

/// Name of the single output produced by the bot.
pub const TEXT_OUTPUT: &str = "text";

#[derive(Debug)]
enum Sink {
    Actions { output_file: Option<PathBuf> },
    Memory,
}

#[derive(Debug, Default)]
struct State {
    failures: Vec<String>,
    outputs: Vec<(String, String)>,
}

/// Records failures and outputs for one run. Safe to share across the
/// per-file review tasks.
#[derive(Debug)]
pub struct Reporter {
    sink: Sink,
    state: Mutex<State>,
}

impl Reporter {
    /// Reporter wired to the Actions runner (`GITHUB_OUTPUT` may be unset
    /// when running locally).
    pub fn github_actions(output_file: Option<PathBuf>) -> Self {
        Self {
            sink: Sink::Actions { output_file },
            state: Mutex::new(State::default()),
        }
    }

    pub fn from_env() -> Self {
        let output_file = std::env::var_os("GITHUB_OUTPUT")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::github_actions(output_file)
    }

    pub fn in_memory() -> Self {
        Self {
            sink: Sink::Memory,
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Marks the run as failed with `message`.
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        error!(%message, "run failure reported");
        if let Sink::Actions { .. } = self.sink {
            println!("::error::{}", escape_command_data(&message));
        }
        self.state().failures.push(message);
    }

    /// Sets output `name`; the last value written wins.
    pub fn set_output(&self, name: &str, value: &str) {
        if let Sink::Actions { output_file } = &self.sink {
            match output_file {
                Some(path) => {
                    if let Err(e) = append_output(path, name, value) {
                        warn!(error = %e, path = %path.display(), "failed to write step output");
                        self.fail(format!("failed to write output '{name}': {e}"));
                    }
                }
                None => info!(name, value, "step output (GITHUB_OUTPUT not set)"),
            }
        }
        self.state().outputs.push((name.to_string(), value.to_string()));
    }

    pub fn has_failed(&self) -> bool {
        !self.state().failures.is_empty()
    }

    pub fn failures(&self) -> Vec<String> {
        self.state().failures.clone()
    }

    /// Last value written for output `name`.
    pub fn output(&self, name: &str) -> Option<String> {
        self.state()
            .outputs
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }
}

fn append_output(path: &PathBuf, name: &str, value: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if value.contains('\n') || value.contains('\r') {
        let delimiter = format!("ghadelimiter_{}", std::process::id());
        writeln!(file, "{name}<<{delimiter}")?;
        writeln!(file, "{value}")?;
        writeln!(file, "{delimiter}")
    } else {
        writeln!(file, "{name}={value}")
    }
}

/// Escapes workflow command data (`%`, CR, LF).
fn escape_command_data(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}
