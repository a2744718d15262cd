//! External fetch tool invocation.
//!
//! The fetch tool (`manga-py` by default) is a black box: it is handed a
//! destination directory, a title name, a source URL and a fixed set of
//! output flags, and it downloads whatever is new into the title folder. Its
//! stdout/stderr are passed straight through to the terminal; nothing is
//! parsed out of them.
//!
//! A non-zero exit from the tool is deliberately *not* an error here — the
//! tool reports "nothing new" and several failure modes through the same
//! status with no way to tell them apart, so the status is recorded on the
//! [`FetchOutcome`] and left for the caller's diagnostics. Only faults that
//! prevent the tool from running to completion at all (missing executable,
//! spawn failure, death by signal) surface as errors.

pub mod error;
mod tool;

use crate::error::{ErrorKind, Result};
use crate::tool::Tool;
use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tankobon_config::FetcherSettings;
use tracing::instrument;

/// A resolved, ready-to-invoke fetch tool plus its fixed invocation policy.
pub struct Fetcher {
    tool: Tool,
    flags: Vec<String>,
    language: String,
    interactive_hosts: Vec<String>,
}

/// The result of a fetch invocation that ran to completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchOutcome {
    /// The tool's exit code, untouched.
    pub code: i32,
}
impl FetchOutcome {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

impl Fetcher {
    /// Locates the configured tool on `PATH` and captures the invocation
    /// policy. Fails fast at startup when the tool is missing.
    pub fn new(settings: &FetcherSettings) -> Result<Self> {
        Ok(Self {
            tool: Tool::discover(&settings.command)?,
            flags: settings.flags.clone(),
            language: settings.language.clone(),
            interactive_hosts: settings.interactive_hosts.clone(),
        })
    }

    /// Invokes the tool for one title and blocks until it exits.
    ///
    /// `destination` is the parent of the title folder and `name` the folder's
    /// base name; the tool recreates `destination/name` itself. For sources in
    /// an interactive family, one line — the preferred language code — is
    /// written to the tool's stdin prompt.
    #[instrument(skip(self))]
    pub fn fetch(&self, destination: &Path, name: &str, url: &str) -> Result<FetchOutcome> {
        let interactive = self.is_interactive(url);
        let mut command = self.tool.command();
        command.args(arguments(destination, name, url, &self.flags));
        command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        command.stdin(if interactive { Stdio::piped() } else { Stdio::inherit() });
        self.run(command, interactive)
    }

    fn run(&self, mut command: Command, interactive: bool) -> Result<FetchOutcome> {
        let mut child = command.spawn().map_err(ErrorKind::Spawn)?;
        if interactive
            && let Some(mut stdin) = child.stdin.take()
            && let Err(err) = writeln!(stdin, "{}", self.language)
        {
            // Reap the child before bailing; it may already have exited
            // without ever reading the prompt.
            let _ = child.wait();
            exn::bail!(ErrorKind::Prompt(err));
        }
        let status = child.wait().map_err(ErrorKind::Spawn)?;
        match status.code() {
            Some(code) => {
                tracing::debug!(code, "Fetch tool exited");
                Ok(FetchOutcome { code })
            },
            None => exn::bail!(ErrorKind::Signalled),
        }
    }

    /// Whether the tool will prompt for a language when fetching this URL.
    pub fn is_interactive(&self, url: &str) -> bool {
        self.interactive_hosts.iter().any(|host| url.contains(host.as_str()))
    }
}

/// The tool's full argument list for one title.
fn arguments(destination: &Path, name: &str, url: &str, flags: &[String]) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--destination".into(),
        destination.as_os_str().to_os_string(),
        "--name".into(),
        name.into(),
        url.into(),
    ];
    args.extend(flags.iter().map(OsString::from));
    args
}
