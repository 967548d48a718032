//! Road Capture
//!
//! Command-line front end: run a live capture session, run one detection on a
//! saved screenshot, or try the zone search.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use road_capture::capture::{FrameSource, ImageSequenceSource};
use road_capture::catalog::{filter_zones, get_max_string, JsonZoneCatalog, ZoneCatalog};
use road_capture::config::{get_config, init_config};
use road_capture::detection::{DetectionCycle, DirectoryPreview, LogSink, TickOutcome};
use road_capture::ocr::probe_recognition;
use road_capture::session::CaptureSession;
use road_capture::{log, paths};

#[derive(Parser, Debug)]
#[command(name = "road-capture")]
#[command(about = "Detect Roads of Avalon portals from the game screen")]
struct Args {
    /// Config file (defaults to config.json next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the game (or a folder of screenshots) until Enter is pressed
    Run {
        /// Zone catalog (JSON array of zones)
        #[arg(long)]
        catalog: PathBuf,

        /// Replay screenshots from this folder instead of the game window
        #[arg(long)]
        frames: Option<PathBuf>,

        /// Save every intermediate crop to the debug folder
        #[arg(long)]
        debug: bool,
    },

    /// Run a single detection on a saved screenshot
    Detect {
        #[arg(long)]
        catalog: PathBuf,

        /// Screenshot to read
        image: PathBuf,

        #[arg(long)]
        debug: bool,
    },

    /// Filter zone names and show the type-ahead completion
    Search {
        #[arg(long)]
        catalog: PathBuf,

        /// Query tokens, matched against word starts
        #[arg(required = true)]
        query: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Log panics before the process goes away
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = panic_info
            .location()
            .map(|loc| format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();
        log(&format!("[PANIC]{} {}", location, msg));
    }));

    let args = Args::parse();

    paths::ensure_directories()?;
    init_config(args.config.as_deref());

    match args.command {
        Command::Run {
            catalog,
            frames,
            debug,
        } => run(catalog, frames, debug),
        Command::Detect {
            catalog,
            image,
            debug,
        } => detect(catalog, image, debug),
        Command::Search { catalog, query } => search(catalog, &query.join(" ")),
    }
}

fn frame_source(frames: Option<PathBuf>) -> Result<Box<dyn FrameSource>> {
    match frames {
        Some(dir) => Ok(Box::new(ImageSequenceSource::new(dir))),
        None => live_source(),
    }
}

#[cfg(windows)]
fn live_source() -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(road_capture::capture::WindowFrameSource::new(
        get_config().window_process.clone(),
    )))
}

#[cfg(not(windows))]
fn live_source() -> Result<Box<dyn FrameSource>> {
    Err(anyhow!("Live window capture needs Windows; pass --frames DIR"))
}

fn run(catalog: PathBuf, frames: Option<PathBuf>, debug: bool) -> Result<()> {
    let config = get_config();
    let zones = JsonZoneCatalog::new(catalog).list()?;
    let recognition = probe_recognition(&config.ocr);

    let mut session = CaptureSession::new(
        config.clone(),
        zones,
        recognition,
        frame_source(frames)?,
        Box::new(LogSink::default()),
    )
    .with_preview(Box::new(DirectoryPreview::new(paths::get_debug_dir())?));
    session.set_debug(debug);

    session.start()?;
    log("Press Enter to stop");
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    session.stop();

    println!("{}", session.status_line());
    Ok(())
}

fn detect(catalog: PathBuf, image: PathBuf, debug: bool) -> Result<()> {
    let config = get_config();
    let zones = JsonZoneCatalog::new(catalog).list()?;
    let recognizer = probe_recognition(&config.ocr).recognizer()?;

    let frame = image::open(&image)
        .with_context(|| format!("Failed to load {}", image.display()))?
        .to_rgba8();

    let mut cycle = DetectionCycle::new(config.clone(), zones, recognizer)?
        .with_preview(Box::new(DirectoryPreview::new(paths::get_debug_dir())?));
    cycle.set_debug(debug);

    let mut sink = LogSink::default();
    match cycle.run_tick(&frame, &mut sink, &AtomicBool::new(false)) {
        TickOutcome::Committed(candidate) => println!("{}", candidate.status_line()),
        TickOutcome::Incomplete(candidate) => println!("Incomplete: {:?}", candidate),
        TickOutcome::Discarded(candidate) => println!("Discarded: {:?}", candidate),
        TickOutcome::AnchorNotFound => println!("No \"{}\" overlay found", config.anchor_label),
        TickOutcome::Failed(reason) => return Err(anyhow!("Detection failed: {}", reason)),
    }
    Ok(())
}

fn search(catalog: PathBuf, query: &str) -> Result<()> {
    let zones = JsonZoneCatalog::new(catalog).list()?;
    let hits = filter_zones(&zones, query);
    for zone in &hits {
        println!("{}", zone.name);
    }

    let names: Vec<&str> = hits.iter().map(|z| z.name.as_str()).collect();
    println!("> {}", get_max_string(&names, query));
    Ok(())
}
