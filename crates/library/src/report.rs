//! Structured reporting events.
//!
//! The reconciliation core never writes to the terminal; it emits events and
//! lets the caller decide how (and whether) to render them. Diagnostics that
//! are about *faults* go through `tracing` at the fault site; events here are
//! the user-facing narrative of a run.

use crate::resolve::Origin;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One step in the narrative of an update run.
#[derive(Debug)]
pub enum Event<'a> {
    /// About to process title `position` of `total` (1-based).
    Progress { position: usize, total: usize },
    /// A title folder is being processed.
    Folder { path: &'a Path },
    /// The title's source URL was resolved.
    Resolved {
        url: &'a str,
        origin: Origin,
        /// The volume the URL was (or would have been) inferred from.
        most_recent: Option<&'a str>,
    },
    /// The folder holds no volumes; nothing to reconcile.
    EmptyFolder { path: &'a Path },
    /// No source URL could be determined; the title is excluded this run.
    Unresolved { path: &'a Path },
    /// A symlinked child was excluded from discovery.
    SymlinkExcluded { path: &'a Path },
    /// The resolved URL matched the skip list; no fetch was dispatched.
    Skipped { url: &'a str },
    /// The fetch tool could not be run to completion.
    FetchFailed { url: &'a str, error: &'a tankobon_fetch::error::Error },
    /// Volumes present before the fetch are gone afterwards.
    VolumesMissing { missing: &'a BTreeSet<String> },
    /// The per-title diff after a fetch attempt, plus the running total.
    TitleDiff { new: &'a BTreeSet<String>, aggregate_total: usize },
    /// Wall-clock time one title took to reconcile.
    Elapsed { duration: Duration, slow: bool },
    /// Every volume acquired across the whole run.
    Summary { volumes: &'a BTreeSet<PathBuf> },
}

/// Sink for [`Event`]s.
pub trait Reporter {
    fn emit(&mut self, event: Event<'_>);
}

/// Discards every event. For headless use and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullReporter;
impl Reporter for NullReporter {
    fn emit(&mut self, _event: Event<'_>) {}
}
