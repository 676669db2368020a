use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use midi_core::MidiFile;
use midi_to_strudel::{ConvertConfig, Layout, VoicePriority};

#[derive(Parser, Debug)]
#[command(name = "midi-to-strudel")]
#[command(about = "Convert MIDI tracks to Strudel trigger/sustain/rest sequences", long_about = None)]
struct Args {
    /// Path to the MIDI file (default: uses first .mid file in current directory)
    #[arg(short, long)]
    midi: Option<PathBuf>,

    /// Output file path (default: `<midi-name>.strudel`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print output to stdout instead of file
    #[arg(long)]
    stdout: bool,

    /// Suppress informational messages (only errors)
    #[arg(short, long)]
    quiet: bool,

    /// Show debug messages
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// JSON file with conversion settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid cells per quarter note (4 gives sixteenth notes)
    #[arg(short = 'g', long)]
    cells_per_quarter: Option<u32>,

    /// Cells per output line
    #[arg(short, long)]
    bar_cells: Option<usize>,

    /// Only print sequences longer than this many cells
    #[arg(long)]
    min_cells: Option<usize>,

    /// Which note represents a cell when several are sounding
    #[arg(long, value_enum)]
    voice: Option<VoiceArg>,

    /// Print the marker line and token lines only
    #[arg(long)]
    bare: bool,

    /// Emit the reduced tracks as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VoiceArg {
    Highest,
    Lowest,
    MostRecent,
}

impl From<VoiceArg> for VoicePriority {
    fn from(arg: VoiceArg) -> Self {
        match arg {
            VoiceArg::Highest => VoicePriority::Highest,
            VoiceArg::Lowest => VoicePriority::Lowest,
            VoiceArg::MostRecent => VoicePriority::MostRecent,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.quiet, args.verbose);

    let config = build_config(&args)?;

    // Find MIDI file
    let midi_path = if let Some(path) = args.midi.clone() {
        if !path.exists() {
            anyhow::bail!("MIDI file not found: {}", path.display());
        }
        path
    } else {
        find_first_midi_file()?
    };

    // Determine output path (use .strudel extension)
    let output_path = if let Some(path) = args.output.clone() {
        path
    } else {
        let stem = midi_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let extension = if args.json { "json" } else { "strudel" };
        PathBuf::from(format!("{}.{}", stem, extension))
    };

    info!("Processing MIDI file: {}", midi_path.display());

    let file = MidiFile::read(&midi_path)
        .with_context(|| format!("Failed to parse MIDI file: {}", midi_path.display()))?;
    for failure in &file.track_errors {
        warn!("Skipped {}", failure);
    }

    let reducer = config.reducer(file.division);
    debug!(grid_step = reducer.grid_step(), policy = ?reducer.policy(), "reducer ready");
    let encoder = config.encoder();
    let output = if args.json {
        encoder
            .build_output_json(&file, &reducer)
            .context("Failed to serialize JSON output")?
    } else {
        encoder.build_output(&file, &reducer)
    };

    if args.stdout {
        println!("{}", output);
    } else {
        fs::write(&output_path, format!("{}\n", output))
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        info!("Output saved to {}", output_path.display());
    }

    Ok(())
}

fn build_config(args: &Args) -> Result<ConvertConfig> {
    let mut config = match &args.config {
        Some(path) => ConvertConfig::from_file(path)?,
        None => ConvertConfig::default(),
    };

    if let Some(cells) = args.cells_per_quarter {
        config.cells_per_quarter = cells;
    }
    if let Some(bar_cells) = args.bar_cells {
        config.bar_cells = bar_cells;
    }
    if let Some(min_cells) = args.min_cells {
        config.min_cells = min_cells;
    }
    if let Some(voice) = args.voice {
        config.policy.voice = voice.into();
    }
    if args.bare {
        config.layout = Layout::Bare;
    }

    Ok(config)
}

fn init_logging(quiet: bool, verbose: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn find_first_midi_file() -> Result<PathBuf> {
    let entries = fs::read_dir(".").context("Failed to read current directory")?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        if matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("mid") | Some("midi")
        ) {
            return Ok(path);
        }
    }

    anyhow::bail!("No MIDI files found in current directory")
}
