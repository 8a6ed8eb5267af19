use crate::rules::is_excluded;
use crate::types::{SourceEntries, SourceEntry};
use camino::Utf8Path;
use regex::Regex;
use std::fs::Metadata;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Returns the immediate children of `root`, oldest first, so frames are handled in the order
/// they were captured. Names caught by `excludes` are dropped. If `pattern` is given, only files
/// whose names match it are returned. A root which does not exist gives an empty list.
///
pub fn list_candidates(
    root: &Utf8Path,
    excludes: &[String],
    pattern: Option<&Regex>,
) -> SourceEntries {
    let entries = match root.read_dir_utf8() {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut ret: SourceEntries = entries
        .filter_map(Result::ok)
        .filter(|entry| !is_excluded(entry.file_name(), excludes))
        .filter_map(|entry| source_entry(entry.path()).ok())
        .filter(|entry| match pattern {
            Some(re) => !entry.is_dir && re.is_match(&entry.name),
            None => true,
        })
        .collect();

    ret.sort_by_key(|entry| entry.created);
    ret
}

/// Every capture session folder under any of the given roots, newest first. Roots which aren't
/// there are skipped: a card reader may only have one of them mounted.
///
pub fn session_folders(roots: &[impl AsRef<Utf8Path>], excludes: &[String]) -> SourceEntries {
    let mut ret: SourceEntries = roots
        .iter()
        .map(|root| root.as_ref())
        .filter(|root| root.is_dir())
        .flat_map(|root| list_candidates(root, excludes, None))
        .filter(|entry| entry.is_dir)
        .collect();

    ret.sort_by_key(|entry| std::cmp::Reverse(entry.created));
    ret
}

/// Stats a single path.
///
pub fn source_entry(path: &Utf8Path) -> io::Result<SourceEntry> {
    let metadata = path.metadata()?;

    Ok(SourceEntry {
        path: path.to_owned(),
        name: path.file_name().unwrap_or(path.as_str()).to_string(),
        created: created_time(&metadata),
        size: metadata.len(),
        is_dir: metadata.is_dir(),
    })
}

// ctime is the closest thing to a creation time every unix filesystem gives us. The camera never
// touches a frame's metadata after it's written, so it's good enough.
fn created_time(metadata: &Metadata) -> SystemTime {
    match u64::try_from(metadata.ctime()) {
        Ok(secs) => UNIX_EPOCH + Duration::new(secs, metadata.ctime_nsec() as u32),
        Err(_) => UNIX_EPOCH,
    }
}
