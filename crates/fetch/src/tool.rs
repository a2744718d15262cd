use crate::error::{ErrorKind, Result};
use std::path::PathBuf;
use std::process::Command;

/// A fetch tool executable resolved on this machine.
#[derive(Clone, Debug)]
pub(crate) struct Tool {
    path: PathBuf,
}
impl Tool {
    /// Locates the configured executable on `PATH`.
    pub(crate) fn discover(command: &str) -> Result<Self> {
        match which::which(command) {
            Ok(path) => {
                tracing::debug!(tool = %path.display(), "Fetch tool located");
                Ok(Self { path })
            },
            Err(_) => {
                tracing::info!(command, "Fetch tool not found in PATH");
                exn::bail!(ErrorKind::ToolNotFound(command.to_string()));
            },
        }
    }

    pub(crate) fn command(&self) -> Command {
        Command::new(&self.path)
    }

    #[cfg(test)]
    pub(crate) fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_missing_tool() {
        let err = Tool::discover("definitely-not-a-real-fetch-tool").unwrap_err();
        assert!(matches!(&*err, ErrorKind::ToolNotFound(_)));
    }
}
