use crate::types::{CopyOutcome, SourceEntry, SyncConfig};
use camino::{Utf8Path, Utf8PathBuf};
use std::time::SystemTime;

/// Where a frame lands under the chosen session folder.
///
pub fn primary_destination(
    source_file: &SourceEntry,
    target_root: &Utf8Path,
    config: &SyncConfig,
) -> Utf8PathBuf {
    target_root
        .join(&config.target_subfolder)
        .join(&source_file.name)
}

/// Where the operator puts frames they've thrown out. Anything here is never copied again.
///
pub fn quarantine_destination(
    source_file: &SourceEntry,
    target_root: &Utf8Path,
    config: &SyncConfig,
) -> Utf8PathBuf {
    target_root
        .join(&config.quarantine_subfolder)
        .join(&source_file.name)
}

/// Works out what to do with one source file. The first rule to match wins:
///
/// 1. a destination copy of the same size means it's already done
/// 2. a copy in the quarantine folder, of any size, means the operator rejected it
/// 3. a file younger than the stability window may still be being written
/// 4. anything else is due to be copied
///
pub fn decide(
    source_file: &SourceEntry,
    target_root: &Utf8Path,
    config: &SyncConfig,
    now: SystemTime,
) -> CopyOutcome {
    let primary = primary_destination(source_file, target_root, config);

    if primary.is_file() && file_size(&primary) == Some(source_file.size) {
        CopyOutcome::SkippedAlreadyExists
    } else if quarantine_destination(source_file, target_root, config).is_file() {
        CopyOutcome::SkippedQuarantined
    } else if !is_stable(source_file.created, now, config) {
        CopyOutcome::SkippedNotStable
    } else {
        CopyOutcome::Copied
    }
}

// A creation time in the future is treated as brand new.
fn is_stable(created: SystemTime, now: SystemTime, config: &SyncConfig) -> bool {
    match now.duration_since(created) {
        Ok(age) => age >= config.stability_window,
        Err(_) => false,
    }
}

fn file_size(path: &Utf8Path) -> Option<u64> {
    path.metadata().ok().map(|m| m.len())
}
