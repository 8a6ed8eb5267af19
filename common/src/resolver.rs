//! Choosing where to copy from and where to copy to.
//!
use crate::rules::{is_excluded, is_hidden};
use crate::scanner::{list_candidates, session_folders};
use crate::types::{FolderChoice, SourceEntry, SyncConfig};
use crate::verbose;
use anyhow::{Context, anyhow, bail};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::time::SystemTime;
use time::{OffsetDateTime, UtcOffset};

/// Whatever puts a list in front of the operator and gets an answer back.
pub trait Prompter {
    /// Returns the index of the chosen label, or None if the operator backed out.
    fn show_menu(&mut self, labels: &[String]) -> anyhow::Result<Option<usize>>;
    fn read_line(&mut self, prompt: &str) -> anyhow::Result<String>;
}

/// The calendar date of the night a timestamp belongs to. An observing night runs past midnight,
/// so `offset` (normally twelve hours) is taken off before the date is read.
///
pub fn night_label(
    created: SystemTime,
    utc_offset: UtcOffset,
    offset: std::time::Duration,
) -> String {
    let local = OffsetDateTime::from(created).to_offset(utc_offset);
    let shifted = local.checked_sub(offset.try_into().unwrap_or(time::Duration::ZERO));
    shifted.unwrap_or(local).date().to_string()
}

pub fn suggested_name(source: &SourceEntry, config: &SyncConfig) -> String {
    format!(
        "{} - {}",
        night_label(source.created, config.utc_offset, config.night_offset),
        source.name
    )
}

/// Asks the operator which capture session to follow.
///
pub fn choose_source(
    config: &SyncConfig,
    prompter: &mut dyn Prompter,
) -> anyhow::Result<SourceEntry> {
    let mut folders = session_folders(&config.source_roots, &config.excludes);

    if folders.is_empty() {
        bail!("No folders found!");
    }

    verbose!(config, "Found {} session folders", folders.len());

    let labels: Vec<String> = folders
        .iter()
        .map(|folder| {
            format!(
                "{} - {}",
                night_label(folder.created, config.utc_offset, config.night_offset),
                folder.path
            )
        })
        .collect();

    let index = menu_choice(prompter, &labels)?;
    Ok(folders.swap_remove(index))
}

/// The menu for `source`: the suggested folder, the custom name option, then every existing
/// session folder under the target parent, newest first.
///
pub fn folder_choices(source: &SourceEntry, config: &SyncConfig) -> Vec<FolderChoice> {
    let parent = &config.target_parent;
    let suggested = parent.join(suggested_name(source, config));
    let suggested_name = suggested.file_name().unwrap_or_default().to_string();

    let mut choices = vec![
        FolderChoice::Suggested {
            exists: suggested.is_dir(),
            path: suggested,
        },
        FolderChoice::PromptForName,
    ];

    let mut existing = list_candidates(parent, &config.excludes, None);
    existing.reverse();

    choices.extend(
        existing
            .into_iter()
            .filter(|entry| {
                entry.is_dir && !is_hidden(&entry.name) && entry.name != suggested_name
            })
            .map(|entry| FolderChoice::Existing(entry.path)),
    );

    choices
}

/// Asks the operator where `source` should be copied to, creating the folder if need be.
///
pub fn resolve(
    source: &SourceEntry,
    config: &SyncConfig,
    prompter: &mut dyn Prompter,
) -> anyhow::Result<Utf8PathBuf> {
    let parent = &config.target_parent;

    if !parent.is_dir() {
        bail!("Target folder {} does not exist!", parent);
    }

    let choices = folder_choices(source, config);
    let labels: Vec<String> = choices.iter().map(FolderChoice::label).collect();
    let index = menu_choice(prompter, &labels)?;

    let target = match choices[index].path() {
        Some(path) => path.to_owned(),
        None => custom_folder(parent, &config.excludes, prompter)?,
    };

    if !target.is_dir() {
        verbose!(config, "Creating {}", target);
        fs::create_dir(&target).with_context(|| format!("Failed to create {}", target))?;
    }

    Ok(target)
}

fn custom_folder(
    parent: &Utf8Path,
    excludes: &[String],
    prompter: &mut dyn Prompter,
) -> anyhow::Result<Utf8PathBuf> {
    let name = prompter.read_line("Enter new folder name")?;
    let name = name.trim();

    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        bail!("'{}' is not a usable folder name", name);
    }

    if is_excluded(name, excludes) {
        bail!("'{}' is excluded", name);
    }

    Ok(parent.join(name))
}

fn menu_choice(prompter: &mut dyn Prompter, labels: &[String]) -> anyhow::Result<usize> {
    match prompter.show_menu(labels)? {
        Some(index) if index < labels.len() => Ok(index),
        Some(index) => Err(anyhow!("Cannot find requested item {}", index)),
        None => Err(anyhow!("No selection made")),
    }
}
