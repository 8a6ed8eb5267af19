mod user_interaction;

use crate::user_interaction::{ProgressReporter, TerminalPrompter};
use anyhow::{Context, bail};
use camino::Utf8PathBuf;
use clap::Parser;
use common::poll_loop::interrupted;
use common::resolver::Prompter;
use common::types::{SourceEntry, SyncConfig};
use common::{poll_loop, resolver, verbose};
use regex::Regex;
use std::process::exit;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, SystemTime};
use time::UtcOffset;

#[derive(Parser)]
#[clap(
    version,
    about = "Copies finished FITS frames off a capture device into a session folder"
)]
struct Cli {
    /// Folder holding capture sessions. May be repeated. Folders which don't exist are skipped
    #[clap(short, long = "source", env = "FITS_SYNC_SOURCES", value_delimiter = ',')]
    sources: Vec<String>,
    /// Folder under which session folders live
    #[clap(short, long, env = "FITS_SYNC_TARGET")]
    target: Option<String>,
    /// Seconds to wait between looks at the source folder
    #[clap(short, long, default_value_t = 30)]
    interval: u64,
    /// Seconds a frame must have existed before it is copied
    #[clap(short = 'w', long, default_value_t = 10)]
    stability_window: u64,
    /// Bytes copied between progress updates
    #[clap(long, default_value_t = 64 * 1024)]
    chunk_size: usize,
    /// Regex which frame file names must match
    #[clap(long)]
    pattern: Option<String>,
    /// Names to ignore, on top of .DS_Store. Accepts 'name', 'prefix*', '*suffix', '*contains*'
    #[clap(short = 'x', long = "exclude")]
    excludes: Vec<String>,
    /// Copy whatever is ready, then exit
    #[clap(long)]
    once: bool,
    /// Print what would happen, without doing it
    #[clap(short, long)]
    noop: bool,
    /// Be verbose
    #[clap(short, long)]
    verbose: bool,
}

fn sync_config(cli: &Cli, utc_offset: UtcOffset) -> anyhow::Result<SyncConfig> {
    if cli.chunk_size == 0 {
        bail!("chunk size must be at least one byte");
    }

    let mut config = SyncConfig {
        stability_window: Duration::from_secs(cli.stability_window),
        poll_interval: Duration::from_secs(cli.interval),
        chunk_size: cli.chunk_size,
        utc_offset,
        verbose: cli.verbose,
        noop: cli.noop,
        ..Default::default()
    };

    if !cli.sources.is_empty() {
        config.source_roots = cli.sources.iter().map(Utf8PathBuf::from).collect();
    }

    if let Some(target) = &cli.target {
        config.target_parent = Utf8PathBuf::from(target);
    }

    if let Some(pattern) = &cli.pattern {
        config.file_pattern =
            Regex::new(pattern).with_context(|| format!("invalid file pattern '{}'", pattern))?;
    }

    config.excludes.extend(cli.excludes.iter().cloned());

    Ok(config)
}

/// The operator's choice of source and destination, or `None` if they hit Ctrl+C part way
/// through choosing.
fn choose(
    config: &SyncConfig,
    prompter: &mut dyn Prompter,
    interrupt: &Receiver<()>,
) -> anyhow::Result<Option<(SourceEntry, Utf8PathBuf)>> {
    let choice = resolver::choose_source(config, prompter)
        .and_then(|source| resolver::resolve(&source, config, prompter).map(|t| (source, t)));

    match choice {
        Ok(_) if interrupted(interrupt) => Ok(None),
        Ok(choice) => Ok(Some(choice)),
        Err(e) if interrupted(interrupt) || cancelled_at_terminal(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Dialoguer keeps the terminal raw, so Ctrl+C in a menu comes back as an interrupted read
/// rather than a signal.
fn cancelled_at_terminal(e: &anyhow::Error) -> bool {
    e.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::Interrupted)
    })
}

fn sync(
    cli: &Cli,
    config: &SyncConfig,
    prompter: &mut dyn Prompter,
    interrupt: &Receiver<()>,
) -> anyhow::Result<()> {
    let Some((source, target)) = choose(config, prompter, interrupt)? else {
        println!("Interrupted, nothing copied");
        return Ok(());
    };

    user_interaction::print_selection(&source.path, &target);

    let mut reporter = ProgressReporter::default();

    if cli.once {
        let now = SystemTime::now();
        let summary = poll_loop::sync_pass(
            &source.path,
            &target,
            config,
            now,
            &mut reporter,
            Some(interrupt),
        );
        println!("{}", user_interaction::summary_line(&summary));

        if summary.failed > 0 {
            bail!("{} frame(s) failed to copy", summary.failed);
        }

        return Ok(());
    }

    verbose!(config, "polling every {}s", config.poll_interval.as_secs());
    poll_loop::run(&source.path, &target, config, &mut reporter, interrupt);
    Ok(())
}

/// The first Ctrl+C asks the copy loop to stop once the frame in hand is safely written. A
/// second one quits on the spot.
fn interrupt_channel() -> anyhow::Result<Receiver<()>> {
    let (tx, rx) = mpsc::channel();
    let mut pressed = false;

    ctrlc::set_handler(move || {
        if pressed {
            exit(130);
        }

        pressed = true;
        eprintln!("Stopping after the current frame (Ctrl+C again to quit now)");
        let _ = tx.send(());
    })
    .context("failed to install Ctrl+C handler")?;

    Ok(rx)
}

fn main() {
    // The local offset can only be read safely while we're still single-threaded, and the Ctrl+C
    // handler starts a thread.
    let utc_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let cli = Cli::parse();

    let config = match sync_config(&cli, utc_offset) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            exit(1);
        }
    };

    let result = interrupt_channel().and_then(|interrupt| {
        sync(&cli, &config, &mut TerminalPrompter::default(), &interrupt)
    });

    if let Err(e) = result {
        eprintln!("ERROR: {:#}", e);
        exit(1);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use camino::Utf8Path;
    use camino_tempfile::tempdir;
    use clap::CommandFactory;
    use std::fs;
    use std::io::{self, Write};

    /// Always takes the first menu item.
    struct FirstItem;

    impl Prompter for FirstItem {
        fn show_menu(&mut self, _labels: &[String]) -> anyhow::Result<Option<usize>> {
            Ok(Some(0))
        }

        fn read_line(&mut self, _prompt: &str) -> anyhow::Result<String> {
            Ok(String::new())
        }
    }

    /// Behaves like a menu the operator hit Ctrl+C in.
    struct CtrlCAtMenu;

    impl Prompter for CtrlCAtMenu {
        fn show_menu(&mut self, _labels: &[String]) -> anyhow::Result<Option<usize>> {
            Err(io::Error::from(io::ErrorKind::Interrupted).into())
        }

        fn read_line(&mut self, _prompt: &str) -> anyhow::Result<String> {
            Ok(String::new())
        }
    }

    fn write_frame(dir: &Utf8Path, name: &str, size: usize) {
        fs::create_dir_all(dir).unwrap();
        let mut file = fs::File::create(dir.join(name)).unwrap();
        file.write_all(&vec![7_u8; size]).unwrap();
    }

    /// A card with one session holding two frames, and an empty place to put them.
    fn card_and_astro(root: &Utf8Path) -> (Cli, SyncConfig) {
        let card = root.join("card");
        let astro = root.join("astro");
        write_frame(&card.join("M31"), "frame001.fits", 3000);
        write_frame(&card.join("M31"), "frame002.fits", 4000);
        fs::create_dir(&astro).unwrap();

        let cli = parse(&["-s", card.as_str(), "-t", astro.as_str(), "-w", "0", "--once"]);
        let config = sync_config(&cli, UtcOffset::UTC).unwrap();
        (cli, config)
    }

    fn session_folders(astro: &Utf8Path) -> Vec<Utf8PathBuf> {
        astro
            .read_dir_utf8()
            .unwrap()
            .map(|entry| entry.unwrap().into_path())
            .collect()
    }

    #[test]
    fn test_sync_once_copies_into_suggested_folder() {
        let tmp = tempdir().unwrap();
        let (cli, config) = card_and_astro(tmp.path());
        let (_tx, rx) = mpsc::channel();

        sync(&cli, &config, &mut FirstItem, &rx).unwrap();

        let sessions = session_folders(&tmp.path().join("astro"));
        assert_eq!(1, sessions.len());
        assert!(sessions[0].as_str().ends_with(" - M31"));

        let lights = sessions[0].join("lights");
        assert_eq!(3000, fs::metadata(lights.join("frame001.fits")).unwrap().len());
        assert_eq!(4000, fs::metadata(lights.join("frame002.fits")).unwrap().len());
    }

    #[test]
    fn test_sync_interrupted_before_copying() {
        let tmp = tempdir().unwrap();
        let (cli, config) = card_and_astro(tmp.path());
        let (tx, rx) = mpsc::channel();
        tx.send(()).unwrap();

        assert!(sync(&cli, &config, &mut FirstItem, &rx).is_ok());
        for session in session_folders(&tmp.path().join("astro")) {
            assert!(!session.join("lights").exists());
        }
    }

    #[test]
    fn test_sync_ctrl_c_at_menu_is_not_an_error() {
        let tmp = tempdir().unwrap();
        let (cli, config) = card_and_astro(tmp.path());
        let (_tx, rx) = mpsc::channel();

        assert!(sync(&cli, &config, &mut CtrlCAtMenu, &rx).is_ok());
        assert!(session_folders(&tmp.path().join("astro")).is_empty());
    }

    #[test]
    fn test_sync_reports_real_errors() {
        let tmp = tempdir().unwrap();
        let cli = parse(&["-s", tmp.path().join("nothing").as_str(), "--once"]);
        let config = sync_config(&cli, UtcOffset::UTC).unwrap();
        let (_tx, rx) = mpsc::channel();

        assert!(sync(&cli, &config, &mut FirstItem, &rx).is_err());
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("fits-sync").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_is_sane() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sync_config_defaults() {
        let cli = Cli {
            sources: vec![],
            target: None,
            interval: 30,
            stability_window: 10,
            chunk_size: 64 * 1024,
            pattern: None,
            excludes: vec![],
            once: false,
            noop: false,
            verbose: false,
        };

        let config = sync_config(&cli, UtcOffset::UTC).unwrap();

        assert_eq!(
            vec![
                Utf8PathBuf::from("/Volumes/TF Images/ASIAIR/Autorun/Light"),
                Utf8PathBuf::from("/Volumes/TF Images/ASIAIR/Plan/Light"),
            ],
            config.source_roots
        );
        assert_eq!(
            Utf8PathBuf::from("/Volumes/PortableSSD/Astrophotography"),
            config.target_parent
        );
        assert_eq!(Duration::from_secs(10), config.stability_window);
        assert_eq!(Duration::from_secs(30), config.poll_interval);
        assert_eq!(65536, config.chunk_size);
        assert_eq!(vec![".DS_Store".to_string()], config.excludes);
    }

    #[test]
    fn test_sync_config_from_args() {
        let cli = parse(&[
            "-s",
            "/media/card/Autorun/Light",
            "--source",
            "/media/card/Plan/Light",
            "-t",
            "/srv/astro",
            "-i",
            "5",
            "-w",
            "20",
            "--pattern",
            r"^.+\.xisf$",
            "-x",
            "._*",
            "--once",
            "-n",
            "-v",
        ]);

        let config = sync_config(&cli, UtcOffset::UTC).unwrap();

        assert_eq!(2, config.source_roots.len());
        assert_eq!(Utf8PathBuf::from("/srv/astro"), config.target_parent);
        assert_eq!(Duration::from_secs(5), config.poll_interval);
        assert_eq!(Duration::from_secs(20), config.stability_window);
        assert!(config.file_pattern.is_match("frame001.xisf"));
        assert!(!config.file_pattern.is_match("frame001.fits"));
        assert_eq!(
            vec![".DS_Store".to_string(), "._*".to_string()],
            config.excludes
        );
        assert!(cli.once);
        assert!(config.noop);
        assert!(config.verbose);
    }

    #[test]
    fn test_sync_config_rejects_bad_input() {
        let cli = parse(&["-t", "/srv/astro", "--pattern", "(unclosed"]);
        assert!(sync_config(&cli, UtcOffset::UTC).is_err());

        let cli = parse(&["-t", "/srv/astro", "--chunk-size", "0"]);
        assert!(sync_config(&cli, UtcOffset::UTC).is_err());
    }
}
