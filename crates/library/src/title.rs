//! One title's reconciliation.
//!
//! A title is a folder of volumes plus whatever source URL resolution found
//! for it. It is constructed fresh each run (resolution happens at
//! construction), updated at most once, and forgotten — only the source
//! record outlives the process.

use crate::error::{ErrorKind, Result};
use crate::record;
use crate::report::{Event, Reporter};
use crate::resolve::{self, Origin, ResolvedSource};
use crate::scan::{self, VolumeFile};
use crate::skip::should_skip;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tankobon_config::LibrarySettings;
use tankobon_fetch::{FetchOutcome, Fetcher};
use tracing::instrument;

/// How far a title has progressed through one run.
///
/// States never regress within a run; every run starts from scratch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// No source URL; terminal for this run.
    Unresolved,
    /// URL known, fetch not yet attempted.
    Resolved(Origin),
    /// URL matched the skip list; terminal.
    Skipped,
    /// The fetch tool has been invoked.
    Dispatched,
    /// The tool ran to completion (whatever its exit status) and the folder
    /// was rescanned.
    Reconciled,
    /// The tool could not be run to completion; the folder was still
    /// rescanned so a partial download is credited.
    Failed,
}

/// Seam for the external fetch tool, so reconciliation can be driven by a
/// test double instead of a real child process.
pub trait Fetch {
    fn fetch(&self, destination: &Path, name: &str, url: &str) -> tankobon_fetch::error::Result<FetchOutcome>;
}
impl Fetch for Fetcher {
    fn fetch(&self, destination: &Path, name: &str, url: &str) -> tankobon_fetch::error::Result<FetchOutcome> {
        Fetcher::fetch(self, destination, name, url)
    }
}

/// One comic's local folder, resolved source and volume sets.
#[derive(Debug)]
pub struct Title {
    path: PathBuf,
    config_path: PathBuf,
    pre_volumes: BTreeSet<String>,
    most_recent: Option<VolumeFile>,
    source: Option<ResolvedSource>,
    post_volumes: Option<BTreeSet<String>>,
    state: State,
}

impl Title {
    /// Opens a title folder: scans its volumes and resolves its source.
    ///
    /// A path that does not exist yet is created as a new, empty title. A
    /// symlink is refused — symlinked titles are never auto-managed, to
    /// avoid accidental cross-title aliasing. An empty folder skips
    /// resolution entirely; there is no archive to infer from and nothing
    /// will be fetched for it this run anyway.
    #[instrument(skip_all, fields(title = %path.display()))]
    pub fn open(path: PathBuf) -> Result<Self> {
        if path.is_symlink() {
            exn::bail!(ErrorKind::SymlinkedTitle(path));
        }
        let volumes = if path.is_dir() {
            scan::scan(&path)?
        } else if path.exists() {
            exn::bail!(ErrorKind::NotADirectory(path));
        } else {
            tracing::info!("Creating new title folder");
            std::fs::create_dir(&path).map_err(ErrorKind::Io)?;
            Vec::new()
        };
        let config_path = path.join(record::TITLE_CONFIG_FILE);
        let most_recent = scan::most_recent(&volumes).cloned();
        let source = if volumes.is_empty() {
            None
        } else {
            resolve::resolve(&path, &config_path, most_recent.as_ref())
        };
        let state = match &source {
            Some(source) => State::Resolved(source.origin),
            None => State::Unresolved,
        };
        Ok(Self {
            path,
            config_path,
            pre_volumes: scan::names(&volumes),
            most_recent,
            source,
            post_volumes: None,
            state,
        })
    }

    /// Runs one reconciliation pass: skip-check, fetch, rescan, diff.
    ///
    /// Returns the volumes that are new since construction. Faults from the
    /// fetch tool are absorbed here — they mark the title [`State::Failed`]
    /// and the folder is rescanned regardless, but they never propagate.
    pub fn update(&mut self, fetcher: &dyn Fetch, settings: &LibrarySettings, reporter: &mut dyn Reporter) -> BTreeSet<String> {
        let started = Instant::now();
        reporter.emit(Event::Folder { path: &self.path });
        if self.pre_volumes.is_empty() {
            reporter.emit(Event::EmptyFolder { path: &self.path });
            return BTreeSet::new();
        }
        let Some(source) = self.source.clone() else {
            reporter.emit(Event::Unresolved { path: &self.path });
            return BTreeSet::new();
        };
        reporter.emit(Event::Resolved {
            url: &source.url,
            origin: source.origin,
            most_recent: self.most_recent.as_ref().map(|volume| volume.name.as_str()),
        });
        if should_skip(&source.url, &settings.skip_hosts) {
            self.state = State::Skipped;
            reporter.emit(Event::Skipped { url: &source.url });
            return BTreeSet::new();
        }

        self.state = State::Dispatched;
        let destination = self.path.parent().unwrap_or_else(|| Path::new("."));
        let name = self.path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
        match fetcher.fetch(destination, &name, &source.url) {
            Ok(outcome) => {
                self.state = State::Reconciled;
                if !outcome.success() {
                    // The tool reports "nothing new" and real failures through
                    // the same status; an empty diff below is all we can say.
                    tracing::warn!(code = outcome.code, url = %source.url, "Fetch tool exited non-zero");
                }
            },
            Err(err) => {
                self.state = State::Failed;
                reporter.emit(Event::FetchFailed { url: &source.url, error: &err });
            },
        }

        let new = self.rescan(reporter);
        let duration = started.elapsed();
        let slow = duration > Duration::from_secs(settings.slow_after_minutes * 60);
        reporter.emit(Event::Elapsed { duration, slow });
        new
    }

    /// Fresh post-fetch scan and diff against the construction-time set.
    fn rescan(&mut self, reporter: &mut dyn Reporter) -> BTreeSet<String> {
        let post = match scan::scan(&self.path) {
            Ok(volumes) => scan::names(&volumes),
            Err(err) => {
                tracing::warn!(error = ?err, "Could not rescan title folder; assuming no change");
                self.pre_volumes.clone()
            },
        };
        // Fetching only ever adds volumes; anything that disappeared is an
        // anomaly worth surfacing, not something to silently diff away.
        let missing: BTreeSet<String> = self.pre_volumes.difference(&post).cloned().collect();
        if !missing.is_empty() {
            reporter.emit(Event::VolumesMissing { missing: &missing });
        }
        let new: BTreeSet<String> = post.difference(&self.pre_volumes).cloned().collect();
        self.post_volumes = Some(post);
        new
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where this title's source record lives.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn source(&self) -> Option<&ResolvedSource> {
        self.source.as_ref()
    }

    pub fn pre_volumes(&self) -> &BTreeSet<String> {
        &self.pre_volumes
    }

    /// Volumes present after the fetch attempt but not before; empty when no
    /// update has run.
    pub fn new_volumes(&self) -> BTreeSet<String> {
        match &self.post_volumes {
            Some(post) => post.difference(&self.pre_volumes).cloned().collect(),
            None => BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NullReporter;
    use std::cell::RefCell;
    use std::io::Write;

    /// Test double: records invocations and plants files per instruction.
    struct FakeFetch {
        calls: RefCell<Vec<String>>,
        plant: Vec<&'static str>,
        outcome: std::result::Result<FetchOutcome, ()>,
    }
    impl FakeFetch {
        fn succeeding(plant: &[&'static str]) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                plant: plant.to_vec(),
                outcome: Ok(FetchOutcome { code: 0 }),
            }
        }

        fn failing(plant: &[&'static str]) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                plant: plant.to_vec(),
                outcome: Err(()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.borrow().len()
        }
    }
    impl Fetch for FakeFetch {
        fn fetch(&self, destination: &Path, name: &str, url: &str) -> tankobon_fetch::error::Result<FetchOutcome> {
            self.calls.borrow_mut().push(url.to_string());
            for file in &self.plant {
                std::fs::write(destination.join(name).join(file), b"archive").unwrap();
            }
            match self.outcome {
                Ok(outcome) => Ok(outcome),
                Err(()) => exn::bail!(tankobon_fetch::error::ErrorKind::Signalled),
            }
        }
    }

    fn write_archive(folder: &Path, name: &str, site: &str) {
        let file = std::fs::File::create(folder.join(name)).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("info.txt", options).unwrap();
        writer.write_all(format!("Site: {site}\n").as_bytes()).unwrap();
        writer.finish().unwrap();
    }

    fn settings() -> LibrarySettings {
        LibrarySettings::default()
    }

    fn title_folder(base: &Path, name: &str, site: &str) -> PathBuf {
        let folder = base.join(name);
        std::fs::create_dir(&folder).unwrap();
        write_archive(&folder, "v01.cbz", site);
        folder
    }

    #[test]
    fn test_update_computes_the_diff() {
        let base = tempfile::tempdir().unwrap();
        let folder = title_folder(base.path(), "Some Comic", "https://example.test/comic");
        let mut title = Title::open(folder.clone()).unwrap();
        assert_eq!(title.state(), State::Resolved(Origin::Inferred));
        assert_eq!(title.config_path(), folder.join("info.json"));

        let fetch = FakeFetch::succeeding(&["v02.cbz", "v03.cbz"]);
        let new = title.update(&fetch, &settings(), &mut NullReporter);
        assert_eq!(title.state(), State::Reconciled);
        assert_eq!(new, BTreeSet::from(["v02.cbz".to_string(), "v03.cbz".to_string()]));
        assert_eq!(title.new_volumes(), new);
        assert_eq!(fetch.calls(), 1);
    }

    #[test]
    fn test_update_passes_parent_and_name_to_the_tool() {
        let base = tempfile::tempdir().unwrap();
        let folder = title_folder(base.path(), "Some Comic", "https://example.test/comic");
        let mut title = Title::open(folder.clone()).unwrap();
        // The fake plants into destination/name: only correct arguments will
        // land the file inside the title folder.
        let fetch = FakeFetch::succeeding(&["v02.cbz"]);
        let new = title.update(&fetch, &settings(), &mut NullReporter);
        assert_eq!(new.len(), 1);
        assert!(folder.join("v02.cbz").is_file());
    }

    #[test]
    fn test_empty_folder_short_circuits() {
        let base = tempfile::tempdir().unwrap();
        let folder = base.path().join("Brand New");
        std::fs::create_dir(&folder).unwrap();
        let mut title = Title::open(folder).unwrap();
        assert_eq!(title.state(), State::Unresolved);

        let fetch = FakeFetch::succeeding(&["v01.cbz"]);
        let new = title.update(&fetch, &settings(), &mut NullReporter);
        assert!(new.is_empty());
        assert_eq!(fetch.calls(), 0);
    }

    #[test]
    fn test_missing_folder_is_created() {
        let base = tempfile::tempdir().unwrap();
        let folder = base.path().join("Not Yet");
        let title = Title::open(folder.clone()).unwrap();
        assert!(folder.is_dir());
        assert!(title.pre_volumes().is_empty());
    }

    #[test]
    fn test_plain_file_is_refused() {
        let base = tempfile::tempdir().unwrap();
        let path = base.path().join("stray.txt");
        std::fs::write(&path, b"not a folder").unwrap();
        let err = Title::open(path).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotADirectory(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_is_refused() {
        let base = tempfile::tempdir().unwrap();
        let target = base.path().join("Real");
        std::fs::create_dir(&target).unwrap();
        let link = base.path().join("Alias");
        std::os::unix::fs::symlink(&target, &link).unwrap();
        let err = Title::open(link).unwrap_err();
        assert!(matches!(&*err, ErrorKind::SymlinkedTitle(_)));
    }

    #[test]
    fn test_unresolved_title_never_fetches() {
        let base = tempfile::tempdir().unwrap();
        let folder = base.path().join("Mystery");
        std::fs::create_dir(&folder).unwrap();
        // A volume with no usable metadata: resolution fails, folder is not empty.
        std::fs::write(folder.join("v01.cbz"), b"not a zip container").unwrap();
        let mut title = Title::open(folder).unwrap();
        assert_eq!(title.state(), State::Unresolved);

        let fetch = FakeFetch::succeeding(&["v02.cbz"]);
        let new = title.update(&fetch, &settings(), &mut NullReporter);
        assert!(new.is_empty());
        assert_eq!(fetch.calls(), 0);
    }

    #[test]
    fn test_skip_short_circuits_before_the_tool() {
        let base = tempfile::tempdir().unwrap();
        let folder = title_folder(base.path(), "Some Comic", "https://blocked.example/x");
        let mut title = Title::open(folder).unwrap();

        let fetch = FakeFetch::succeeding(&["v02.cbz"]);
        let mut settings = settings();
        settings.skip_hosts = vec!["blocked".to_string()];
        let new = title.update(&fetch, &settings, &mut NullReporter);
        assert_eq!(title.state(), State::Skipped);
        assert!(new.is_empty());
        assert_eq!(fetch.calls(), 0);
    }

    #[test]
    fn test_failed_fetch_still_credits_partial_downloads() {
        let base = tempfile::tempdir().unwrap();
        let folder = title_folder(base.path(), "Some Comic", "https://example.test/comic");
        let mut title = Title::open(folder).unwrap();

        // The tool dies by signal after writing one file.
        let fetch = FakeFetch::failing(&["v02.cbz"]);
        let new = title.update(&fetch, &settings(), &mut NullReporter);
        assert_eq!(title.state(), State::Failed);
        assert_eq!(new, BTreeSet::from(["v02.cbz".to_string()]));
    }

    #[test]
    fn test_disappeared_volumes_are_surfaced_not_diffed() {
        struct DeletingFetch;
        impl Fetch for DeletingFetch {
            fn fetch(&self, destination: &Path, name: &str, _url: &str) -> tankobon_fetch::error::Result<FetchOutcome> {
                std::fs::remove_file(destination.join(name).join("v01.cbz")).unwrap();
                std::fs::write(destination.join(name).join("v02.cbz"), b"archive").unwrap();
                Ok(FetchOutcome { code: 0 })
            }
        }

        struct MissingSpy(Vec<String>);
        impl Reporter for MissingSpy {
            fn emit(&mut self, event: Event<'_>) {
                if let Event::VolumesMissing { missing } = event {
                    self.0.extend(missing.iter().cloned());
                }
            }
        }

        let base = tempfile::tempdir().unwrap();
        let folder = title_folder(base.path(), "Some Comic", "https://example.test/comic");
        let mut title = Title::open(folder).unwrap();
        let mut spy = MissingSpy(Vec::new());
        let new = title.update(&DeletingFetch, &settings(), &mut spy);
        // The diff is still the honest set difference...
        assert_eq!(new, BTreeSet::from(["v02.cbz".to_string()]));
        // ...and the disappearance was reported as an anomaly.
        assert_eq!(spy.0, vec!["v01.cbz".to_string()]);
    }

    #[test]
    fn test_new_volumes_empty_before_update() {
        let base = tempfile::tempdir().unwrap();
        let folder = title_folder(base.path(), "Some Comic", "https://example.test/comic");
        let title = Title::open(folder).unwrap();
        assert!(title.new_volumes().is_empty());
    }
}
