//! # CLI Module
//!
//! Command-line interface for the media organizer.
//!
//! ## Usage
//! ```bash
//! # Organize two folders into an archive
//! media-organize run ~/Inbox ~/Downloads --dest ~/Archive
//!
//! # Choose folder layout and duplicate policy
//! media-organize run ~/Inbox --dest ~/Archive --structure year-month-day --policy keep-largest
//!
//! # List undoable sessions, then roll one back
//! media-organize sessions ~/Archive
//! media-organize undo 20240115-093000123 ~/Archive
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use media_organizer::core::journal;
use media_organizer::core::{
    DuplicatePolicy, FolderStructure, Organizer, OrganizeRunConfig, UndoEngine,
};
use media_organizer::error::{OrganizerError, Result};
use media_organizer::events::{Event, EventChannel, FileEvent, RunEvent, RunSummary};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::thread;

/// Media Organizer - dated archive layout with safe duplicate handling
#[derive(Parser, Debug)]
#[command(name = "media-organize")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Organize source directories into the archive
    Run {
        /// Directories to organize
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Archive destination directory
        #[arg(short, long)]
        dest: PathBuf,

        /// Folder layout under the archive
        #[arg(long, default_value = "year-month")]
        structure: Structure,

        /// Duplicate resolution policy
        #[arg(long, default_value = "quality")]
        policy: Policy,

        /// Skip files an interrupted run already processed
        #[arg(long)]
        resume: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List undoable sessions under an archive
    Sessions {
        /// Archive directory the sessions were recorded in
        base: PathBuf,
    },

    /// Reverse one session's filesystem changes
    Undo {
        /// Session id (see `sessions`)
        session_id: String,

        /// Archive directory the session was recorded in
        base: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Structure {
    /// Year/Month folders (2024/01 - January)
    YearMonth,
    /// Year/Month/Day folders (2024/01/15)
    YearMonthDay,
    /// Flat Year-Month folders (2024-01)
    YearMonthFlat,
}

impl From<Structure> for FolderStructure {
    fn from(value: Structure) -> Self {
        match value {
            Structure::YearMonth => FolderStructure::YearMonth,
            Structure::YearMonthDay => FolderStructure::YearMonthDay,
            Structure::YearMonthFlat => FolderStructure::YearMonthFlat,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Full quality ladder (default)
    Quality,
    /// Keep the larger file
    KeepLargest,
    /// Keep the earlier capture date
    KeepOldest,
    /// Keep the later capture date
    KeepNewest,
    /// Never file anything as a duplicate
    KeepBoth,
}

impl From<Policy> for DuplicatePolicy {
    fn from(value: Policy) -> Self {
        match value {
            Policy::Quality => DuplicatePolicy::Quality,
            Policy::KeepLargest => DuplicatePolicy::KeepLargest,
            Policy::KeepOldest => DuplicatePolicy::KeepOldest,
            Policy::KeepNewest => DuplicatePolicy::KeepNewest,
            Policy::KeepBoth => DuplicatePolicy::KeepBoth,
        }
    }
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
    media_organizer::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            sources,
            dest,
            structure,
            policy,
            resume,
            output,
            verbose,
        } => run_organize(sources, dest, structure.into(), policy.into(), resume, output, verbose),
        Commands::Sessions { base } => run_sessions(&base),
        Commands::Undo {
            session_id,
            base,
            output,
        } => run_undo(&session_id, &base, output),
    }
}

fn run_organize(
    sources: Vec<PathBuf>,
    dest: PathBuf,
    structure: FolderStructure,
    policy: DuplicatePolicy,
    resume: bool,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();

    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Media Organizer").bold().cyan(),
            style("v0.1.0").dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let mut config = OrganizeRunConfig::new(sources, dest);
    config.structure = structure;
    config.policy = policy;
    config.resume = resume;

    let (sender, receiver) = EventChannel::new();

    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Run(RunEvent::Started { total_files }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_length(total_files as u64);
                    }
                }
                Event::Run(RunEvent::Progress(p)) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_position(p.completed as u64);
                        if verbose {
                            pb.set_message(
                                p.current_path
                                    .file_name()
                                    .unwrap_or_default()
                                    .to_string_lossy()
                                    .into_owned(),
                            );
                        }
                    }
                }
                Event::File(FileEvent::Failed { path, message }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.println(format!("  ! {}: {}", path.display(), message));
                    }
                }
                Event::Run(RunEvent::Completed(_)) => {
                    if let Some(ref pb) = progress_clone {
                        pb.finish_and_clear();
                    }
                }
                _ => {}
            }
        }
    });

    let organizer = Organizer::new(config);
    let cancel = AtomicBool::new(false);
    let result = organizer.run(&cancel, &sender);

    drop(sender);
    event_thread.join().ok();

    let summary = result?;
    match output {
        OutputFormat::Pretty => print_pretty_summary(&term, &summary),
        OutputFormat::Json => print_json_summary(&summary),
    }

    Ok(())
}

fn print_pretty_summary(term: &Term, summary: &RunSummary) {
    term.write_line("").ok();
    term.write_line(&format!(
        "{} Run Complete",
        style("✓").green().bold()
    ))
    .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} files processed in {:.1}s",
        style(summary.total_files).cyan(),
        summary.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} new originals, {} upgraded",
        style(summary.new_originals).cyan(),
        style(summary.replaced_originals).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} duplicates filed",
        style(summary.duplicates).yellow()
    ))
    .ok();

    if summary.skipped > 0 {
        term.write_line(&format!("  {} skipped", style(summary.skipped).dim()))
            .ok();
    }
    if summary.failed > 0 {
        term.write_line(&format!(
            "  {} files left unresolved",
            style(summary.failed).red()
        ))
        .ok();
    }
    if summary.cancelled {
        term.write_line(&format!("  {}", style("Run was cancelled").yellow()))
            .ok();
    }

    term.write_line("").ok();
    term.write_line(&format!(
        "  Session {} — undo with: media-organize undo {} <archive>",
        style(&summary.session_id).bold(),
        summary.session_id
    ))
    .ok();
}

fn print_json_summary(summary: &RunSummary) {
    println!(
        "{}",
        serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string())
    );
}

fn run_sessions(base: &PathBuf) -> Result<()> {
    let sessions = journal::list_sessions(base).map_err(OrganizerError::Journal)?;

    if sessions.is_empty() {
        println!("No sessions recorded under {}", base.display());
        return Ok(());
    }

    for id in sessions {
        match journal::load_session(&id, base) {
            Ok(session) => {
                let completed = session.operations.iter().filter(|op| op.completed).count();
                println!(
                    "{}  {} operations ({} completed)",
                    id,
                    session.operations.len(),
                    completed
                );
            }
            Err(_) => println!("{}  (unreadable)", id),
        }
    }
    Ok(())
}

fn run_undo(session_id: &str, base: &PathBuf, output: OutputFormat) -> Result<()> {
    let report = UndoEngine::undo(session_id, base).map_err(OrganizerError::Undo)?;

    match output {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Pretty => {
            let term = Term::stderr();
            let marker = if report.success {
                style("✓").green().bold()
            } else {
                style("!").yellow().bold()
            };
            term.write_line(&format!(
                "{} Undo of {}: {} restored, {} failed, {} skipped",
                marker,
                report.session_id,
                report.undone_count,
                report.failed_count,
                report.skipped_count
            ))
            .ok();
            if let Some(error) = &report.error {
                term.write_line(&format!("  first failure: {}", error)).ok();
            }
        }
    }
    Ok(())
}
