//! Terminal rendering of reconciliation events.
//!
//! The library core emits structured events; this is the one place they are
//! turned into lines on a screen. Faults and diagnostics go through
//! `tracing` (to stderr) instead, so piping stdout still yields a clean run
//! narrative.

use std::collections::BTreeSet;
use tankobon_library::{Event, Origin, Reporter};

#[derive(Debug, Default)]
pub(crate) struct ConsoleReporter;

impl ConsoleReporter {
    pub(crate) fn new() -> Self {
        Self
    }
}

impl Reporter for ConsoleReporter {
    fn emit(&mut self, event: Event<'_>) {
        match event {
            Event::Progress { position, total } => println!("({position}/{total})"),
            Event::Folder { path } => println!("\t📂 file://{}", path.display()),
            Event::Resolved { url, origin, most_recent } => {
                if let Some(volume) = most_recent {
                    println!("\t🗎 {volume}");
                }
                match origin {
                    Origin::Config => println!("\t🔗 {url}"),
                    Origin::Inferred => println!("\t🔗 {url} 🗜"),
                }
            },
            Event::EmptyFolder { .. } => println!("No *.cbz here!"),
            Event::Unresolved { .. } => println!("No url available"),
            Event::SymlinkExcluded { path } => println!("Symlink: {}", path.display()),
            Event::Skipped { url } => println!("Skipped {url}"),
            Event::FetchFailed { url, error } => println!("Could not fetch {url}: {error:?}"),
            Event::VolumesMissing { missing } => {
                println!("\t⚠ volumes disappeared during the run: {}", join(missing));
            },
            Event::TitleDiff { new, aggregate_total } => {
                let previous = aggregate_total - new.len();
                println!("\tTotal downloaded: ({previous} + {} = {aggregate_total})\n", new.len());
            },
            Event::Elapsed { duration, slow } => {
                if slow {
                    println!("\t⏰ {duration:?} (slow)");
                } else {
                    println!("\t⏰ {duration:?}");
                }
            },
            Event::Summary { volumes } => {
                println!("\nFiles downloaded:");
                for volume in volumes {
                    println!("{}", volume.display());
                }
            },
        }
    }
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join(", ")
}
