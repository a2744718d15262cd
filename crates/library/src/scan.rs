//! Volume scanning.
//!
//! A volume is one packaged archive file directly inside a title folder;
//! identity is the file name. Scans are always non-recursive and always
//! fresh — the fetch tool is an opaque external process, so the only way to
//! know what it produced is to look again afterwards.

use crate::error::{ErrorKind, Result};
use std::collections::BTreeSet;
use std::path::Path;
use time::OffsetDateTime;

/// The single supported archive packaging extension.
pub const VOLUME_EXTENSION: &str = "cbz";

/// One volume file found in a title folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolumeFile {
    /// File name within the title folder; the unit of volume identity.
    pub name: String,
    /// Modification timestamp, made explicit so ordering decisions are
    /// visible in the API instead of re-reading the filesystem ambiently.
    pub modified: OffsetDateTime,
}

/// Lists the volumes directly inside a folder.
///
/// Subdirectories, other extensions and symlinks are ignored.
pub fn scan(folder: &Path) -> Result<Vec<VolumeFile>> {
    let mut volumes = Vec::new();
    for entry in std::fs::read_dir(folder).map_err(ErrorKind::Io)? {
        let entry = entry.map_err(ErrorKind::Io)?;
        if entry.path().extension().and_then(|ext| ext.to_str()) != Some(VOLUME_EXTENSION) {
            continue;
        }
        // DirEntry::metadata does not traverse symlinks, so a symlinked
        // archive fails the is_file check and drops out here.
        let metadata = entry.metadata().map_err(ErrorKind::Io)?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().map_err(ErrorKind::Io)?.into();
        volumes.push(VolumeFile {
            name: entry.file_name().to_string_lossy().into_owned(),
            modified,
        });
    }
    Ok(volumes)
}

/// The set of volume identifiers in a scan result.
pub(crate) fn names(volumes: &[VolumeFile]) -> BTreeSet<String> {
    volumes.iter().map(|volume| volume.name.clone()).collect()
}

/// The volume with the greatest modification timestamp; timestamp ties break
/// by name so the choice is deterministic.
pub(crate) fn most_recent(volumes: &[VolumeFile]) -> Option<&VolumeFile> {
    volumes.iter().max_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.name.cmp(&b.name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, SystemTime};

    fn touch(folder: &Path, name: &str, seconds: u64) {
        let file = File::create(folder.join(name)).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(seconds)).unwrap();
    }

    #[test]
    fn test_scan_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "v01.cbz", 100);
        touch(dir.path(), "v02.cbz", 200);
        touch(dir.path(), "notes.txt", 300);
        touch(dir.path(), "cover.jpg", 300);
        let volumes = scan(dir.path()).unwrap();
        assert_eq!(names(&volumes), BTreeSet::from(["v01.cbz".to_string(), "v02.cbz".to_string()]));
    }

    #[test]
    fn test_scan_is_not_recursive() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "v01.cbz", 100);
        std::fs::create_dir(dir.path().join("extras")).unwrap();
        touch(&dir.path().join("extras"), "v99.cbz", 100);
        let volumes = scan(dir.path()).unwrap();
        assert_eq!(names(&volumes), BTreeSet::from(["v01.cbz".to_string()]));
    }

    #[test]
    fn test_scan_ignores_directories_with_volume_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("weird.cbz")).unwrap();
        touch(dir.path(), "v01.cbz", 100);
        let volumes = scan(dir.path()).unwrap();
        assert_eq!(names(&volumes), BTreeSet::from(["v01.cbz".to_string()]));
    }

    #[test]
    fn test_scan_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan(&dir.path().join("gone")).is_err());
    }

    #[test]
    fn test_most_recent_by_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "v01.cbz", 100);
        touch(dir.path(), "v03.cbz", 300);
        touch(dir.path(), "v02.cbz", 200);
        let volumes = scan(dir.path()).unwrap();
        assert_eq!(most_recent(&volumes).unwrap().name, "v03.cbz");
    }

    #[test]
    fn test_most_recent_tie_breaks_by_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.cbz", 100);
        touch(dir.path(), "a.cbz", 100);
        let volumes = scan(dir.path()).unwrap();
        assert_eq!(most_recent(&volumes).unwrap().name, "b.cbz");
    }

    #[test]
    fn test_most_recent_of_nothing() {
        assert_eq!(most_recent(&[]), None);
    }
}
