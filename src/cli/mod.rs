//! # CLI Module
//!
//! Command-line interface for the album scanner.
//!
//! ## Usage
//! ```bash
//! # Scan a user's library into the default database
//! album-scan scan ~/Photos --owner 1
//!
//! # Custom database and cache root
//! album-scan scan ~/Photos --owner 1 --db ./albums.db --cache-root ./photo_cache
//!
//! # JSON output
//! album-scan scan ~/Photos --owner 1 --output json
//! ```

use album_scanner::core::{
    AlbumCache, AlbumScanner, ScanOutcome, ScannerConfig, SqliteAlbumStore, User, UserId,
};
use album_scanner::error::{AlbumScanError, Result};
use album_scanner::events::{Event, EventChannel, ScanEvent};
use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Album Scanner - keep the album database in step with your folders
#[derive(Parser, Debug)]
#[command(name = "album-scan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a user's photo directory and update its albums
    Scan {
        /// Root directory of the user's photos
        root: PathBuf,

        /// Owner id the albums belong to
        #[arg(long)]
        owner: i64,

        /// Owner name used in messages
        #[arg(long, default_value = "photos")]
        name: String,

        /// Album database path
        #[arg(long)]
        db: Option<PathBuf>,

        /// Directory holding per-album cache folders
        #[arg(long, env = "PHOTO_CACHE")]
        cache_root: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            root,
            owner,
            name,
            db,
            cache_root,
            output,
            verbose,
        } => {
            if verbose {
                album_scanner::init_tracing();
            }
            run_scan(
                User::new(UserId(owner), name, root),
                db,
                ScannerConfig::from_cache_root(cache_root),
                output,
                verbose,
            )
        }
    }
}

fn run_scan(
    user: User,
    db_path: Option<PathBuf>,
    config: ScannerConfig,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();

    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Album Scanner").bold().cyan(),
            style(env!("CARGO_PKG_VERSION")).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let db_path = match db_path.or_else(default_db_path) {
        Some(path) => path,
        None => {
            return Err(AlbumScanError::Config(
                "No data directory on this system; pass --db".to_string(),
            ))
        }
    };
    let store = Arc::new(SqliteAlbumStore::open(&db_path)?);

    let (sender, receiver) = EventChannel::new();
    let scanner = AlbumScanner::builder(store)
        .config(config)
        .events(sender)
        .build();

    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {pos} albums {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(pb) = progress_clone.as_ref() else {
                continue;
            };
            match event {
                Event::Scan(ScanEvent::AlbumFound { path, .. }) => {
                    pb.inc(1);
                    if verbose {
                        pb.set_message(path.display().to_string());
                    }
                }
                Event::Notification(n) if n.negative => {
                    pb.println(format!("{} {}", style("!").red().bold(), n.content));
                }
                Event::Scan(ScanEvent::Completed(_)) => pb.finish_and_clear(),
                _ => {}
            }
        }
    });

    let cache = AlbumCache::new();
    let result = scanner.scan_user(&user, &cache);

    // Dropping the scanner closes the channel and ends the event thread
    drop(scanner);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let outcome = result?;

    match output {
        OutputFormat::Pretty => print_pretty_results(&term, &user, &outcome),
        OutputFormat::Json => print_json_results(&user, &outcome),
    }

    Ok(())
}

fn default_db_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("album-scanner").join("albums.db"))
}

fn print_pretty_results(term: &Term, user: &User, outcome: &ScanOutcome) {
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} albums in {} ({:.1}s)",
        style(outcome.albums.len()).cyan(),
        user.root_path.display(),
        outcome.duration_ms as f64 / 1000.0
    ))
    .ok();

    if !outcome.deleted.is_empty() {
        term.write_line(&format!(
            "  {} old albums removed",
            style(outcome.deleted.len()).yellow()
        ))
        .ok();
    }

    if outcome.errors.is_empty() {
        return;
    }

    term.write_line("").ok();
    term.write_line(&format!(
        "{}",
        style(format!("{} problems:", outcome.errors.len())).bold().red()
    ))
    .ok();
    for error in &outcome.errors {
        term.write_line(&format!("  {} {}", style("○").dim(), error)).ok();
    }
}

fn print_json_results(user: &User, outcome: &ScanOutcome) {
    let output = serde_json::json!({
        "owner": user.id,
        "root": user.root_path,
        "albums": outcome.albums,
        "deleted": outcome.deleted,
        "errors": outcome.errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        "duration_ms": outcome.duration_ms,
    });

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize results: {e}"),
    }
}
