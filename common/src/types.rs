use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::time::{Duration, SystemTime};
use time::UtcOffset;

pub type SourceEntries = Vec<SourceEntry>;
pub type ExcludeRules = Vec<String>;

pub const DEFAULT_SOURCE_ROOTS: [&str; 2] = [
    "/Volumes/TF Images/ASIAIR/Autorun/Light",
    "/Volumes/TF Images/ASIAIR/Plan/Light",
];
pub const DEFAULT_TARGET_PARENT: &str = "/Volumes/PortableSSD/Astrophotography";
pub const DEFAULT_FILE_PATTERN: &str = r"^(.+)\.((fit)|(fits))$";

/// A snapshot of one directory entry, taken when its parent was scanned. Files grow and new ones
/// appear, so these are thrown away and re-read on every pass.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceEntry {
    pub path: Utf8PathBuf,
    pub name: String,
    pub created: SystemTime,
    pub size: u64,
    pub is_dir: bool,
}

/// One line in the destination menu.
#[derive(Clone, Debug, PartialEq)]
pub enum FolderChoice {
    Suggested { path: Utf8PathBuf, exists: bool },
    PromptForName,
    Existing(Utf8PathBuf),
}

impl FolderChoice {
    pub fn label(&self) -> String {
        match self {
            FolderChoice::Suggested { path, exists } => {
                let name = path.file_name().unwrap_or(path.as_str());
                if *exists {
                    name.to_string()
                } else {
                    format!("(NEW) {}", name)
                }
            }
            FolderChoice::PromptForName => "Input folder name".to_string(),
            FolderChoice::Existing(path) => path.file_name().unwrap_or(path.as_str()).to_string(),
        }
    }

    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            FolderChoice::Suggested { path, .. } | FolderChoice::Existing(path) => Some(path),
            FolderChoice::PromptForName => None,
        }
    }
}

/// What happened, or is due to happen, to one source file in a pass. When it comes out of
/// `decide()`, `Copied` means the file is due to be copied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    SkippedAlreadyExists,
    SkippedQuarantined,
    SkippedNotStable,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub copied: usize,
    pub already_exists: usize,
    pub quarantined: usize,
    pub not_stable: usize,
    pub failed: usize,
    pub bytes: u64,
    /// The pass stopped early because the operator asked it to
    pub interrupted: bool,
}

impl PassSummary {
    pub fn record(&mut self, outcome: CopyOutcome) {
        match outcome {
            CopyOutcome::Copied => self.copied += 1,
            CopyOutcome::SkippedAlreadyExists => self.already_exists += 1,
            CopyOutcome::SkippedQuarantined => self.quarantined += 1,
            CopyOutcome::SkippedNotStable => self.not_stable += 1,
        }
    }
}

pub struct SyncConfig {
    pub source_roots: Vec<Utf8PathBuf>,
    pub target_parent: Utf8PathBuf,
    pub target_subfolder: String,
    pub quarantine_subfolder: String,
    pub excludes: ExcludeRules,
    pub file_pattern: Regex,
    /// A file younger than this may still be being written by the camera
    pub stability_window: Duration,
    pub poll_interval: Duration,
    pub chunk_size: usize,
    /// Subtracted from creation times so that frames taken after midnight belong to the night
    /// they started in
    pub night_offset: Duration,
    pub utc_offset: UtcOffset,
    pub verbose: bool,
    pub noop: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source_roots: DEFAULT_SOURCE_ROOTS.iter().map(Utf8PathBuf::from).collect(),
            target_parent: Utf8PathBuf::from(DEFAULT_TARGET_PARENT),
            target_subfolder: "lights".to_string(),
            quarantine_subfolder: "lights/trash".to_string(),
            excludes: vec![".DS_Store".to_string()],
            file_pattern: Regex::new(DEFAULT_FILE_PATTERN).unwrap(),
            stability_window: Duration::from_secs(10),
            poll_interval: Duration::from_secs(30),
            chunk_size: 64 * 1024,
            night_offset: Duration::from_secs(12 * 60 * 60),
            utc_offset: UtcOffset::UTC,
            verbose: false,
            noop: false,
        }
    }
}
