use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use midi_core::transform::{self, melody_track};
use midi_core::{merge, Format, MidiFile, Track};

mod summary;

use summary::FileSummary;

#[derive(Parser)]
#[command(name = "midi-engine")]
#[command(about = "Inspect, merge and remix Standard MIDI Files", long_about = None)]
struct Cli {
    /// Suppress informational messages (only errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show debug messages
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the header and a summary of every track
    Info {
        /// MIDI file to inspect
        file: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Merge every track of the inputs into one single-track file
    Merge {
        /// MIDI files to layer, in order
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Ticks per quarter note of the output (default: first input's)
        #[arg(short, long)]
        division: Option<u16>,

        /// Take only the melody track from each input
        #[arg(long)]
        melody: bool,
    },
    /// Apply remix transforms to a file
    Transform {
        /// MIDI file to transform
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Shift notes by this many semitones
        #[arg(short, long, allow_hyphen_values = true)]
        transpose: Option<i32>,

        /// Mirror notes around this pitch (60 is middle C)
        #[arg(long)]
        invert: Option<u8>,

        /// Scale all ticks by this factor
        #[arg(long)]
        stretch: Option<f64>,

        /// Set every note-on to this velocity
        #[arg(long)]
        velocity: Option<u8>,

        /// Prepend a program change to this General MIDI program
        #[arg(long)]
        program: Option<u8>,

        /// Channel for --program
        #[arg(long, default_value = "0", requires = "program")]
        channel: u8,

        /// Keep only the track with the most notes
        #[arg(long)]
        melody: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    match cli.command {
        Commands::Info { file, json } => {
            let midi = read_midi(&file)?;
            let summary = FileSummary::new(&midi);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", summary);
            }
            Ok(())
        }
        Commands::Merge {
            inputs,
            output,
            division,
            melody,
        } => {
            let mut layers = Vec::new();
            let mut target = division;

            for path in &inputs {
                let midi = read_midi(path)?;
                let target = *target.get_or_insert(midi.division);
                let tracks = select_tracks(midi.tracks, melody, path);
                layers.extend(
                    tracks
                        .into_iter()
                        .map(|track| transform::rescale_division(track, midi.division, target)),
                );
            }

            let division = target.context("No input files")?;
            let merged = merge(layers);
            info!("Merged {} input(s) into {} events", inputs.len(), merged.len());

            MidiFile::with_tracks(Format::SingleTrack, division, vec![merged])
                .write(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Output saved to {}", output.display());
            Ok(())
        }
        Commands::Transform {
            input,
            output,
            transpose,
            invert,
            stretch,
            velocity,
            program,
            channel,
            melody,
        } => {
            let midi = read_midi(&input)?;
            let format = if melody { Format::SingleTrack } else { midi.format };
            let division = midi.division;

            let tracks = select_tracks(midi.tracks, melody, &input)
                .into_iter()
                .map(|mut track| {
                    if let Some(semitones) = transpose {
                        track = transform::transpose(track, semitones);
                    }
                    if let Some(pivot) = invert {
                        track = transform::invert(track, pivot);
                    }
                    if let Some(factor) = stretch {
                        track = transform::stretch(track, factor);
                    }
                    if let Some(velocity) = velocity {
                        track = transform::with_velocity(track, velocity);
                    }
                    if let Some(program) = program {
                        track = transform::with_program(track, channel, program);
                    }
                    track
                })
                .collect();

            MidiFile::with_tracks(format, division, tracks)
                .write(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Output saved to {}", output.display());
            Ok(())
        }
    }
}

fn read_midi(path: &Path) -> Result<MidiFile> {
    if !path.exists() {
        anyhow::bail!("MIDI file not found: {}", path.display());
    }
    info!("Reading MIDI file: {}", path.display());

    let midi = MidiFile::read(path)
        .with_context(|| format!("Failed to parse MIDI file: {}", path.display()))?;
    for failure in &midi.track_errors {
        warn!("{}: skipped {}", path.display(), failure);
    }
    Ok(midi)
}

/// All tracks, or just the melody track when `melody` is set.
fn select_tracks(tracks: Vec<Track>, melody: bool, path: &Path) -> Vec<Track> {
    if !melody {
        return tracks;
    }

    let probe = MidiFile::with_tracks(Format::Parallel, 0, tracks);
    match melody_track(&probe) {
        Some(index) => {
            let mut tracks = probe.tracks;
            vec![tracks.swap_remove(index)]
        }
        None => {
            warn!("{}: no track with notes", path.display());
            Vec::new()
        }
    }
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
