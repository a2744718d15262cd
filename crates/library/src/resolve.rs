//! Source resolution policy.
//!
//! A title's remote source comes from one of two places, in strict order:
//! the persisted per-title record, or — as a heuristic fallback — the
//! metadata embedded in the most recently modified archive. The record
//! always wins, even when stale: it is an explicit operator statement,
//! while inference is a guess.
//!
//! An inferred URL is persisted immediately, so inference happens at most
//! once per title across runs: the next run reads it back as a record.

use crate::record;
use crate::scan::VolumeFile;
use std::path::Path;
use tracing::instrument;

/// Where a resolved URL came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum Origin {
    /// Read from the persisted per-title record.
    #[display("config")]
    Config,
    /// Extracted from archive metadata and persisted this run.
    #[display("inferred")]
    Inferred,
}

/// A title's resolved remote source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSource {
    pub url: String,
    pub origin: Origin,
}

/// Resolves a title's source URL, or `None` if the title is unresolvable.
///
/// Every fault along the way (unreadable record, unreadable archive, no
/// metadata match, failed persist) is reported as a diagnostic here and
/// recovered: resolution degrades, it never propagates an error.
#[instrument(skip_all, fields(title = %path.display()))]
pub(crate) fn resolve(path: &Path, config_path: &Path, most_recent: Option<&VolumeFile>) -> Option<ResolvedSource> {
    match record::load(config_path) {
        Ok(Some(url)) if !url.trim().is_empty() => {
            return Some(ResolvedSource { url, origin: Origin::Config });
        },
        // An empty url can never be fetched; treat it as absent so inference
        // gets a chance to repair the record.
        Ok(Some(_)) => {
            tracing::warn!(record = %config_path.display(), "Title record has an empty url; ignoring it");
        },
        Ok(None) => {},
        Err(err) => {
            tracing::warn!(record = %config_path.display(), error = ?err, "Unreadable title record; ignoring it");
        },
    }

    let volume = most_recent?;
    let url = match tankobon_inspect::site_url(&path.join(&volume.name)) {
        Ok(url) => url,
        Err(err) => {
            tracing::warn!(volume = %volume.name, error = ?err, "Could not infer a source from archive metadata");
            return None;
        },
    };
    tracing::info!(url = %url, volume = %volume.name, "Inferred source from archive metadata");
    if let Err(err) = record::save(config_path, &url) {
        // The inference still stands for this run; it just isn't durable,
        // so the next run will have to infer again.
        tracing::warn!(record = %config_path.display(), error = ?err, "Failed to persist inferred source");
    }
    Some(ResolvedSource { url, origin: Origin::Inferred })
}
