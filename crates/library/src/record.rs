//! Per-title source record.
//!
//! Each title folder may carry a small JSON record naming the remote source
//! it is mirrored from. The record is the only thing this system ever
//! persists (besides the archives the fetch tool writes), and it is written
//! whole in a single call so there is no partially-written state to recover
//! from.

use crate::error::{ErrorKind, Result};
use std::path::Path;

/// Fixed name of the record file inside a title folder.
pub const TITLE_CONFIG_FILE: &str = "info.json";

#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
struct TitleRecord {
    url: String,
}

/// Reads the source URL recorded for a title, if any.
///
/// A missing file is `Ok(None)`. A file that exists but cannot be parsed is
/// an error; callers are expected to log it and carry on as if no record
/// existed.
pub(crate) fn load(config_path: &Path) -> Result<Option<String>> {
    let raw = match std::fs::read_to_string(config_path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => exn::bail!(ErrorKind::Io(err)),
    };
    let record: TitleRecord =
        facet_json::from_str(raw.trim()).map_err(|err| ErrorKind::Record(err.to_string()))?;
    Ok(Some(record.url))
}

/// Writes the whole record in one call, with a stable field layout.
pub(crate) fn save(config_path: &Path, url: &str) -> Result<()> {
    let record = TitleRecord { url: url.to_string() };
    let json = facet_json::to_string(&record).map_err(|err| ErrorKind::Record(err.to_string()))?;
    std::fs::write(config_path, format!("{json}\n")).map_err(ErrorKind::Io)?;
    Ok(())
}
