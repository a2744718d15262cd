//! Source URL extraction from comic archive metadata.
//!
//! Fetch tools embed a plain-text `info.txt` entry into every archive they
//! package, recording (among other things) the page the download came from as
//! a `Site: <url>` line. When a title folder has no persisted source record,
//! that line is the only way to reconnect the folder to its remote source.
//!
//! Inspection is strictly best-effort: every failure mode (not a zip, no
//! metadata entry, no matching line) is a typed error the caller is expected
//! to log and recover from.

mod consts;
pub mod error;

use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::instrument;

/// Fixed name of the embedded metadata entry.
pub const METADATA_ENTRY: &str = "info.txt";

/// Extracts the source URL embedded in an archive's metadata entry.
///
/// Opens the zip container, reads [`METADATA_ENTRY`], and searches its text
/// for the first `Site: <url>` line. The entry is decoded lossily; metadata
/// written by older tool versions is not guaranteed to be valid UTF-8.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a zip container, has
/// no metadata entry, or the entry has no `Site:` line. None of these are
/// fatal to an update run.
#[instrument(skip(archive), fields(archive = %archive.display()))]
pub fn site_url(archive: &Path) -> Result<String> {
    let file = File::open(archive).map_err(ErrorKind::Io)?;
    let mut container = zip::ZipArchive::new(file).map_err(ErrorKind::Container)?;
    let mut entry = match container.by_name(METADATA_ENTRY) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => exn::bail!(ErrorKind::MissingEntry(METADATA_ENTRY)),
        Err(err) => exn::bail!(ErrorKind::Container(err)),
    };
    let mut raw = Vec::new();
    entry.read_to_end(&mut raw).map_err(ErrorKind::Io)?;
    let text = String::from_utf8_lossy(&raw);
    let captures = consts::SITE_REGEX.captures(&text).ok_or_raise(|| ErrorKind::NoSiteLine)?;
    Ok(captures[1].trim().to_string())
}
