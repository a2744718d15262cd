//! Library discovery and the update run.
//!
//! A library is one or more base directories holding one title folder per
//! comic. Discovery orders titles most-recently-touched first (likely-active
//! titles surface earlier in a long run) with a name tie-break so the order
//! is reproducible. The run itself is strictly sequential: one title is
//! fully reconciled before the next begins.

use crate::error::{ErrorKind, Result};
use crate::report::{Event, Reporter};
use crate::title::{Fetch, State, Title};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tankobon_config::LibrarySettings;
use time::OffsetDateTime;
use tracing::instrument;

/// The ordered collection of titles discovered from the base directories,
/// plus the run's accumulated diff.
#[derive(Debug)]
pub struct Library {
    titles: Vec<Title>,
    aggregate: BTreeSet<PathBuf>,
}

impl Library {
    /// Enumerates the title folders under each base directory.
    ///
    /// Children that are symlinks are excluded with a diagnostic event;
    /// children that cannot be opened as titles (e.g. a stray plain file)
    /// are logged and dropped. Neither aborts discovery.
    #[instrument(skip_all, fields(base_dirs = base_dirs.len()))]
    pub fn discover(base_dirs: &[PathBuf], reporter: &mut dyn Reporter) -> Result<Self> {
        let mut titles = Vec::new();
        for base in base_dirs {
            let base = expand(base)?;
            for path in ordered_children(&base, reporter)? {
                match Title::open(path) {
                    Ok(title) => titles.push(title),
                    Err(err) => tracing::warn!(error = ?err, "Skipping unusable library entry"),
                }
            }
        }
        tracing::info!(titles = titles.len(), "Library discovered");
        Ok(Self { titles, aggregate: BTreeSet::new() })
    }

    /// Reconciles every title in discovery order, accumulating the diff.
    ///
    /// A fault in one title never stops the ones after it. Returns the
    /// aggregate set of newly acquired volumes (full paths).
    pub fn update(&mut self, fetcher: &dyn Fetch, settings: &LibrarySettings, reporter: &mut dyn Reporter) -> &BTreeSet<PathBuf> {
        let total = self.titles.len();
        for (index, title) in self.titles.iter_mut().enumerate() {
            reporter.emit(Event::Progress { position: index + 1, total });
            let new = title.update(fetcher, settings, reporter);
            self.aggregate.extend(new.iter().map(|name| title.path().join(name)));
            if matches!(title.state(), State::Reconciled | State::Failed) {
                reporter.emit(Event::TitleDiff { new: &new, aggregate_total: self.aggregate.len() });
                if settings.delay_seconds > 0 {
                    std::thread::sleep(Duration::from_secs(settings.delay_seconds));
                }
            }
        }
        reporter.emit(Event::Summary { volumes: &self.aggregate });
        &self.aggregate
    }

    pub fn titles(&self) -> &[Title] {
        &self.titles
    }

    /// Union of every title's new volumes so far; monotonic across the run.
    pub fn aggregate_new_volumes(&self) -> &BTreeSet<PathBuf> {
        &self.aggregate
    }
}

/// Immediate children of a base directory, most recently modified first,
/// ties broken by name ascending. Symlinks are reported and excluded.
fn ordered_children(base: &Path, reporter: &mut dyn Reporter) -> Result<Vec<PathBuf>> {
    let mut children: Vec<(OffsetDateTime, String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(base).map_err(ErrorKind::Io)? {
        let entry = entry.map_err(ErrorKind::Io)?;
        let path = entry.path();
        if entry.file_type().map_err(ErrorKind::Io)?.is_symlink() {
            reporter.emit(Event::SymlinkExcluded { path: &path });
            continue;
        }
        let metadata = entry.metadata().map_err(ErrorKind::Io)?;
        let modified = metadata.modified().map_err(ErrorKind::Io)?.into();
        children.push((modified, entry.file_name().to_string_lossy().into_owned(), path));
    }
    children.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    Ok(children.into_iter().map(|(_, _, path)| path).collect())
}

/// Tilde-expands and canonicalizes a base directory.
fn expand(path: &Path) -> Result<PathBuf> {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => match directories::BaseDirs::new() {
            Some(dirs) => dirs.home_dir().join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    };
    match expanded.canonicalize() {
        Ok(canonical) => Ok(canonical),
        Err(_) => exn::bail!(ErrorKind::MissingBaseDir(expanded)),
    }
}
