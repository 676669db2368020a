use std::collections::BTreeSet;
use std::fmt;

use midi_core::{MidiFile, Track};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct TrackSummary {
    pub index: usize,
    pub name: Option<String>,
    pub events: usize,
    pub notes: usize,
    /// Tick of the last event
    pub length: u32,
    pub channels: Vec<u8>,
    pub end_of_track: bool,
}

impl TrackSummary {
    fn new(index: usize, track: &Track) -> Self {
        let channels: BTreeSet<u8> = track.iter().filter_map(|e| e.event.channel()).collect();
        Self {
            index,
            name: track.name(),
            events: track.len(),
            notes: track.note_on_count(),
            length: track.length(),
            channels: channels.into_iter().collect(),
            end_of_track: track.ends_with_end_of_track(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileSummary {
    pub format: u16,
    pub division: u16,
    /// Track count declared by the header
    pub track_count: usize,
    pub tracks: Vec<TrackSummary>,
    /// Tracks dropped while parsing
    pub skipped: Vec<String>,
}

impl FileSummary {
    pub fn new(file: &MidiFile) -> Self {
        Self {
            format: file.format.as_u16(),
            division: file.division,
            track_count: file.track_count,
            tracks: file
                .indexed_tracks()
                .map(|(index, track)| TrackSummary::new(index, track))
                .collect(),
            skipped: file.track_errors.iter().map(ToString::to_string).collect(),
        }
    }
}

impl fmt::Display for FileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Format: {}, Tracks: {}, Division: {}",
            self.format,
            self.track_count,
            self.division
        )?;

        for track in &self.tracks {
            let channels = track
                .channels
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(",");
            writeln!(
                f,
                "  Track {}: {} events, {} notes, {} ticks, channels [{}]{}{}",
                track.index,
                track.events,
                track.notes,
                track.length,
                channels,
                track
                    .name
                    .as_deref()
                    .map(|name| format!(", name {:?}", name))
                    .unwrap_or_default(),
                if track.end_of_track { "" } else { ", no end-of-track" }
            )?;
        }

        for skipped in &self.skipped {
            writeln!(f, "  Skipped {}", skipped)?;
        }
        Ok(())
    }
}
