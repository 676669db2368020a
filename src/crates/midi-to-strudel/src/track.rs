use midi_core::MidiFile;
use serde::Serialize;
use tracing::debug;

use crate::grid::GridReducer;
use crate::token::GridToken;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReducedTrack {
    /// Chunk index of the track in the source file
    pub index: usize,
    pub name: Option<String>,
    pub tokens: Vec<GridToken>,
}

/// Reduce every track of `file`, skipping tracks without note events.
///
/// Tracks keep the chunk index they had in the file, so numbering survives
/// tracks dropped while parsing.
pub fn reduce_tracks(file: &MidiFile, reducer: &GridReducer) -> Vec<ReducedTrack> {
    file.indexed_tracks()
        .filter_map(|(index, track)| {
            let tokens = reducer.reduce(track);
            if tokens.is_empty() {
                debug!(index, "track has no notes, skipping");
                return None;
            }
            Some(ReducedTrack {
                index,
                name: track.name(),
                tokens,
            })
        })
        .collect()
}
