use crate::decision::{decide, primary_destination};
use crate::file_copier::copy_file;
use crate::scanner::list_candidates;
use crate::types::{CopyOutcome, PassSummary, SourceEntry, SyncConfig};
use crate::verbose;
use camino::Utf8Path;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::SystemTime;

/// Gets told about each copy as it happens. The unit type stays quiet.
pub trait CopyObserver {
    fn copy_started(&mut self, _entry: &SourceEntry) {}
    fn copy_progress(&mut self, _copied: u64, _total: u64) {}
    fn copy_finished(&mut self, _entry: &SourceEntry, _bytes: u64) {}
}

impl CopyObserver for () {}

/// Runs the copy rules over `entries`, in order, copying everything that's due. A file which
/// fails to copy is reported and counted, and will be tried again on the next pass. `interrupt` is
/// checked before each file: once it fires, the pass stops and the summary is marked interrupted.
///
pub fn sync_files(
    entries: &[SourceEntry],
    target_root: &Utf8Path,
    config: &SyncConfig,
    now: SystemTime,
    observer: &mut dyn CopyObserver,
    interrupt: Option<&Receiver<()>>,
) -> PassSummary {
    let mut summary = PassSummary::default();

    for entry in entries {
        if interrupt.is_some_and(interrupted) {
            verbose!(config, "interrupted, stopping before {}", entry.name);
            summary.interrupted = true;
            break;
        }

        let outcome = decide(entry, target_root, config, now);

        if outcome != CopyOutcome::Copied {
            verbose!(config, "{}: {}", entry.name, skip_reason(outcome));
            summary.record(outcome);
            continue;
        }

        let dest = primary_destination(entry, target_root, config);

        if config.noop {
            println!("{} -> {}", entry.path, dest);
            summary.record(outcome);
            continue;
        }

        observer.copy_started(entry);

        let result = copy_file(&entry.path, &dest, config.chunk_size, &mut |copied, total| {
            observer.copy_progress(copied, total)
        });

        match result {
            Ok(bytes) => {
                observer.copy_finished(entry, bytes);
                summary.record(outcome);
                summary.bytes += bytes;
            }
            Err(e) => {
                eprintln!("ERROR: failed to copy {} to {}: {}", entry.path, dest, e);
                summary.failed += 1;
            }
        }
    }

    summary
}

/// One look at the source folder: every frame in it, oldest first, through `sync_files()`.
///
pub fn sync_pass(
    source_dir: &Utf8Path,
    target_root: &Utf8Path,
    config: &SyncConfig,
    now: SystemTime,
    observer: &mut dyn CopyObserver,
    interrupt: Option<&Receiver<()>>,
) -> PassSummary {
    let entries = list_candidates(source_dir, &config.excludes, Some(&config.file_pattern));
    verbose!(config, "{} candidate files in {}", entries.len(), source_dir);
    sync_files(&entries, target_root, config, now, observer, interrupt)
}

/// Keeps running passes until something arrives on `interrupt`, or it hangs up. An interrupt
/// cuts short the wait between passes, or the pass itself once the current copy is done.
///
pub fn run(
    source_dir: &Utf8Path,
    target_root: &Utf8Path,
    config: &SyncConfig,
    observer: &mut dyn CopyObserver,
    interrupt: &Receiver<()>,
) {
    loop {
        let now = SystemTime::now();
        let summary = sync_pass(source_dir, target_root, config, now, observer, Some(interrupt));

        if summary.interrupted {
            break;
        }

        if summary.copied > 0 || summary.failed > 0 {
            verbose!(
                config,
                "pass done: copied {}, failed {}, not ready {}",
                summary.copied,
                summary.failed,
                summary.not_stable
            );
        }

        println!("Waiting for new files ... (Ctrl+C to exit)");

        match interrupt.recv_timeout(config.poll_interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// True once something has been sent, or nothing ever can be.
///
pub fn interrupted(interrupt: &Receiver<()>) -> bool {
    !matches!(interrupt.try_recv(), Err(TryRecvError::Empty))
}

pub fn skip_reason(outcome: CopyOutcome) -> &'static str {
    match outcome {
        CopyOutcome::Copied => "copied",
        CopyOutcome::SkippedAlreadyExists => "already copied",
        CopyOutcome::SkippedQuarantined => "in quarantine",
        CopyOutcome::SkippedNotStable => "too new, may still be being written",
    }
}
