use byte_unit::{Byte, UnitType};
use camino::Utf8Path;
use colored::Colorize;
use common::poll_loop::CopyObserver;
use common::resolver::Prompter;
use common::types::{PassSummary, SourceEntry};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str = "{msg} ... [{bar:50}] {percent}%";

/// Menus and questions on the controlling terminal.
#[derive(Default)]
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl Prompter for TerminalPrompter {
    fn show_menu(&mut self, labels: &[String]) -> anyhow::Result<Option<usize>> {
        let choice = Select::with_theme(&self.theme)
            .items(labels)
            .default(0)
            .interact_opt()?;
        Ok(choice)
    }

    fn read_line(&mut self, prompt: &str) -> anyhow::Result<String> {
        let line = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(line)
    }
}

/// Draws a bar for the frame being copied, and a line for each one that lands.
#[derive(Default)]
pub struct ProgressReporter {
    bar: Option<ProgressBar>,
}

impl CopyObserver for ProgressReporter {
    fn copy_started(&mut self, entry: &SourceEntry) {
        if let Some(old) = self.bar.take() {
            old.abandon();
        }

        let bar = ProgressBar::new(entry.size);
        bar.set_style(bar_style());
        bar.set_message(format!("Copying {}", entry.name));
        self.bar = Some(bar);
    }

    fn copy_progress(&mut self, copied: u64, total: u64) {
        if let Some(bar) = &self.bar {
            bar.set_length(total.max(copied));
            bar.set_position(copied);
        }
    }

    fn copy_finished(&mut self, entry: &SourceEntry, bytes: u64) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }

        println!("{} {} ({})", "Copied".green(), entry.name, format_size(bytes));
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .map(|style| style.progress_chars("#> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

pub fn format_size(bytes: u64) -> String {
    format!(
        "{:.2}",
        Byte::from_u64(bytes).get_appropriate_unit(UnitType::Binary)
    )
}

pub fn print_selection(source: &Utf8Path, target: &Utf8Path) {
    println!("Using source {}!", source.to_string().bold());
    println!("Using target {}!", target.to_string().bold());
}

pub fn summary_line(summary: &PassSummary) -> String {
    format!(
        "copied {} ({}), already there {}, quarantined {}, not ready {}, failed {}",
        summary.copied,
        format_size(summary.bytes),
        summary.already_exists,
        summary.quarantined,
        summary.not_stable,
        summary.failed
    )
}
