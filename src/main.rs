//! xplorer - selection-aware file operations with live progress.
//!
//! Usage:
//!   xp copy SRC... --to DIR      Copy paths into DIR
//!   xp move SRC... --to DIR      Move paths into DIR
//!   xp delete PATH...            Delete paths recursively (asks first)
//!   xp rename PATH NEW_NAME      Rename a path in place
//!   xp touch DIR NAME            Create an empty file
//!   xp mkdir DIR NAME            Create an empty folder
//!   xp --help                    Show help

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, Context, Result};
use humansize::{format_size, BINARY};
use tracing_subscriber::EnvFilter;

use xplorer_ops::{
    FileOps, OperationEvent, OperationHandle, OperationSummary, OpsConfig, ProgressSnapshot,
};

/// How often the progress line is redrawn while a job runs.
const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(
    name = "xplorer",
    version,
    about = "Copy, move, delete, rename and create files with live progress",
    long_about = "xplorer drives the same file operations engine the browser uses.\n\n\
                  Paths are selected, staged on the clipboard and pasted, while a \
                  progress line shows throughput and time remaining."
)]
struct Cli {
    /// Print the operation summary as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Read/write chunk size in bytes for copies
    #[arg(long, global = true, default_value_t = xplorer_core::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Do not copy permission bits to copied files
    #[arg(long, global = true)]
    no_preserve_permissions: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy files or directories into a directory
    Copy {
        /// Paths to copy
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Destination directory
        #[arg(short, long)]
        to: PathBuf,
    },

    /// Move files or directories into a directory
    Move {
        /// Paths to move
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Destination directory
        #[arg(short, long)]
        to: PathBuf,
    },

    /// Delete files or directories recursively
    Delete {
        /// Paths to delete
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Rename a file or directory within its parent
    Rename {
        /// Path to rename
        path: PathBuf,

        /// New file name
        new_name: String,
    },

    /// Create an empty file
    Touch {
        /// Parent directory
        dir: PathBuf,

        /// File name
        name: String,
    },

    /// Create an empty folder
    Mkdir {
        /// Parent directory
        dir: PathBuf,

        /// Folder name
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let config = OpsConfig::builder()
        .chunk_size(cli.chunk_size)
        .preserve_permissions(!cli.no_preserve_permissions)
        .build()
        .context("Invalid options")?;
    let mut ops = FileOps::with_config(config);

    match cli.command {
        Command::Copy { sources, to } => {
            select(&mut ops, sources)?;
            ops.copy_selected();
            let summary = run_job(&mut ops, |ops| ops.start_paste(&to)).await?;
            report(&summary, cli.json)?;
        }
        Command::Move { sources, to } => {
            select(&mut ops, sources)?;
            ops.cut_selected();
            let summary = run_job(&mut ops, |ops| ops.start_paste(&to)).await?;
            report(&summary, cli.json)?;
        }
        Command::Delete { paths, yes } => {
            select(&mut ops, paths)?;
            let targets = ops.selection().all();
            if !yes && !confirm(&delete_prompt(&targets))? {
                eprintln!("Aborted");
                return Ok(());
            }
            let summary = run_job(&mut ops, |ops| ops.start_delete(targets)).await?;
            report(&summary, cli.json)?;
        }
        Command::Rename { path, new_name } => {
            let new_path = ops
                .rename(&path, &new_name)
                .with_context(|| format!("Cannot rename {}", path.display()))?;
            println!("{}", new_path.display());
        }
        Command::Touch { dir, name } => {
            let path = ops.create_file(&dir, &name).context("Cannot create file")?;
            println!("{}", path.display());
        }
        Command::Mkdir { dir, name } => {
            let path = ops.create_folder(&dir, &name).context("Cannot create folder")?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (warnings only by default).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .try_init();
}

/// Mark command-line paths the way the browser marks entries.
fn select(ops: &mut FileOps, paths: Vec<PathBuf>) -> Result<()> {
    for path in paths {
        let path = std::path::absolute(&path)
            .with_context(|| format!("Invalid path: {}", path.display()))?;
        if !ops.is_selected(&path) {
            ops.toggle_selection(path);
        }
    }
    tracing::debug!(count = ops.selection().len(), "selected paths");
    Ok(())
}

/// Start a background job and redraw its progress until it completes.
async fn run_job<F>(ops: &mut FileOps, start: F) -> Result<OperationSummary>
where
    F: FnOnce(&FileOps) -> xplorer_ops::OpsResult<OperationHandle>,
{
    let tracker = ops.progress();
    let mut handle = start(&*ops)?;
    let mut ticker = tokio::time::interval(REDRAW_INTERVAL);
    let draw = io::stderr().is_terminal();

    let completion = loop {
        tokio::select! {
            event = handle.recv() => match event {
                Some(OperationEvent::Complete(completion)) => break completion,
                Some(OperationEvent::Progress(snapshot)) => {
                    if draw {
                        draw_progress(&snapshot);
                    }
                }
                None => bail!("operation ended without reporting a result"),
            },
            _ = ticker.tick() => {
                if draw {
                    draw_progress(&tracker.snapshot());
                }
            }
        }
    };

    if draw {
        draw_progress(&tracker.snapshot());
        eprintln!();
    }
    tracker.clear();

    Ok(ops.finish(completion)?)
}

fn draw_progress(snapshot: &ProgressSnapshot) {
    if !snapshot.has_data() {
        return;
    }

    const WIDTH: usize = 24;
    let percent = snapshot.percent().min(100) as usize;
    let filled = percent * WIDTH / 100;
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(WIDTH - filled));

    let eta = snapshot.eta().as_secs();
    let line = format!(
        "{} [{}] {:>3}%  {}/{} files  {}/{}  {}/s  ETA {:02}:{:02}  {}",
        snapshot.operation,
        bar,
        percent,
        snapshot.processed_files,
        snapshot.total_files,
        format_size(snapshot.processed_bytes, BINARY),
        format_size(snapshot.total_bytes, BINARY),
        format_size(snapshot.throughput() as u64, BINARY),
        eta / 60,
        eta % 60,
        snapshot.current_file,
    );

    let mut stderr = io::stderr().lock();
    let _ = write!(stderr, "\r\x1b[2K{line}");
    let _ = stderr.flush();
}

fn delete_prompt(targets: &[PathBuf]) -> String {
    match targets {
        [single] => format!(
            "Delete {}?",
            single
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| single.display().to_string())
        ),
        many => format!("Delete {} files?", many.len()),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{prompt} [y/N] ");
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn report(summary: &OperationSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!(
            "{} in {:.2}s",
            summary.summary(),
            summary.elapsed.as_secs_f64()
        );
    }
    Ok(())
}
