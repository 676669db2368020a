//! Grid quantizer and monophonic reducer
//!
//! Rasterizes a (possibly polyphonic) track onto a fixed tick grid and keeps
//! one voice per cell, producing a [`GridToken`] sequence.

use std::collections::BTreeMap;

use midi_core::{Event, Track};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::token::GridToken;

/// Grid step used when the requested step is zero.
pub const FALLBACK_GRID_STEP: u32 = 120;

/// Upper bound on cells produced for one track. Longer tracks are cut off.
pub const MAX_GRID_CELLS: u64 = 1 << 20;

/// Which of several sounding notes represents a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoicePriority {
    /// Highest pitch, which usually carries the melody
    #[default]
    Highest,
    /// Lowest pitch, for bass lines
    Lowest,
    /// Most recently struck note, highest pitch on ties
    MostRecent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReductionPolicy {
    pub voice: VoicePriority,
    /// A note counts as struck in a cell if it started less than this many
    /// ticks before the cell boundary. Defaults to the grid step.
    pub trigger_window: Option<u32>,
}

/// Ticks per cell for a division and a number of cells per quarter note
/// (4 gives sixteenth notes).
pub fn grid_step_for(division: u16, cells_per_quarter: u32) -> u32 {
    if cells_per_quarter == 0 {
        return FALLBACK_GRID_STEP;
    }
    u32::from(division) / cells_per_quarter
}

#[derive(Debug, Clone)]
pub struct GridReducer {
    grid_step: u32,
    policy: ReductionPolicy,
}

impl GridReducer {
    pub fn new(grid_step: u32, policy: ReductionPolicy) -> Self {
        let grid_step = if grid_step == 0 {
            debug!(fallback = FALLBACK_GRID_STEP, "grid step of 0 ticks, using fallback");
            FALLBACK_GRID_STEP
        } else {
            grid_step
        };
        Self { grid_step, policy }
    }

    pub fn for_division(division: u16, cells_per_quarter: u32, policy: ReductionPolicy) -> Self {
        Self::new(grid_step_for(division, cells_per_quarter), policy)
    }

    pub fn grid_step(&self) -> u32 {
        self.grid_step
    }

    pub fn policy(&self) -> &ReductionPolicy {
        &self.policy
    }

    /// Reduce a track to one token per grid cell.
    ///
    /// Cells start at tick 0 and continue until the last note event has been
    /// applied, up to [`MAX_GRID_CELLS`]. A track without note events yields
    /// no cells.
    pub fn reduce(&self, track: &Track) -> Vec<GridToken> {
        let Some(max_tick) = track
            .iter()
            .rev()
            .find(|e| e.event.is_note())
            .map(|e| u64::from(e.tick))
        else {
            return Vec::new();
        };

        let step = u64::from(self.grid_step);
        let window = u64::from(self.policy.trigger_window.unwrap_or(self.grid_step).max(1));
        let mut cells = max_tick.div_ceil(step) + 1;
        if cells > MAX_GRID_CELLS {
            warn!(cells, max = MAX_GRID_CELLS, "track too long for the grid, truncating");
            cells = MAX_GRID_CELLS;
        }

        // (pitch, channel) -> tick the note started
        let mut active: BTreeMap<(u8, u8), u64> = BTreeMap::new();
        let mut pending = track.iter().filter(|e| e.event.is_note()).peekable();
        let mut tokens = Vec::with_capacity(cells as usize);

        for cell in 0..cells {
            let boundary = cell * step;

            while let Some(timed) = pending.next_if(|e| u64::from(e.tick) <= boundary) {
                match timed.event {
                    Event::NoteOn { channel, pitch, .. } => {
                        active.insert((pitch, channel), u64::from(timed.tick));
                    }
                    Event::NoteOff { channel, pitch } => {
                        active.remove(&(pitch, channel));
                    }
                    _ => {}
                }
            }

            let token = match self.pick_voice(&active) {
                None => GridToken::Rest,
                Some((pitch, start)) if boundary - start < window => GridToken::Trigger(pitch),
                Some(_) => GridToken::Sustain,
            };
            tokens.push(token);
        }

        tokens
    }

    fn pick_voice(&self, active: &BTreeMap<(u8, u8), u64>) -> Option<(u8, u64)> {
        let entry = match self.policy.voice {
            VoicePriority::Highest => active.iter().next_back(),
            VoicePriority::Lowest => active.iter().next(),
            VoicePriority::MostRecent => active
                .iter()
                .max_by_key(|&(&(pitch, _), &start)| (start, pitch)),
        };
        entry.map(|(&(pitch, _), &start)| (pitch, start))
    }
}

impl Default for GridReducer {
    fn default() -> Self {
        Self::new(FALLBACK_GRID_STEP, ReductionPolicy::default())
    }
}
