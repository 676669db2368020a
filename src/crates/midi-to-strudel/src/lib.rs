//! MIDI to Strudel converter library
//!
//! This library reduces the tracks of a MIDI file to monophonic
//! trigger/sustain/rest sequences on a fixed grid and renders them as Strudel
//! mini notation.

pub mod config;
pub mod grid;
pub mod note;
pub mod output;
pub mod token;
pub mod track;

// Re-export main types for convenience
pub use config::{ConfigError, ConvertConfig};
pub use grid::{GridReducer, ReductionPolicy, VoicePriority, FALLBACK_GRID_STEP, MAX_GRID_CELLS};
pub use output::{Layout, SymbolicEncoder};
pub use token::GridToken;
pub use track::{reduce_tracks, ReducedTrack};
