//! Absolute-time event model shared by the decoder, merger and reducer

use serde::Serialize;

use crate::error::TrackError;

/// Meta event type for a track name.
pub const META_TRACK_NAME: u8 = 0x03;
/// Meta event type for end of track.
pub const META_END_OF_TRACK: u8 = 0x2F;
/// Meta event type for a tempo change.
pub const META_TEMPO: u8 = 0x51;

/// A decoded track event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    /// Also produced for a note-on with velocity 0.
    NoteOff { channel: u8, pitch: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    Meta { kind: u8, data: Vec<u8> },
    /// `status` is 0xF0, or 0xF7 for an escape sequence.
    SysEx { status: u8, data: Vec<u8> },
    /// Aftertouch, channel pressure, pitch bend and system common messages.
    Other { status: u8, data: Vec<u8> },
}

impl Event {
    pub fn end_of_track() -> Self {
        Event::Meta {
            kind: META_END_OF_TRACK,
            data: Vec::new(),
        }
    }

    pub fn track_name(name: &str) -> Self {
        Event::Meta {
            kind: META_TRACK_NAME,
            data: name.as_bytes().to_vec(),
        }
    }

    /// Tempo in microseconds per quarter note (24 bits).
    pub fn tempo(micros_per_quarter: u32) -> Self {
        let bytes = micros_per_quarter.min(0xFF_FFFF).to_be_bytes();
        Event::Meta {
            kind: META_TEMPO,
            data: bytes[1..].to_vec(),
        }
    }

    pub fn is_note(&self) -> bool {
        matches!(self, Event::NoteOn { .. } | Event::NoteOff { .. })
    }

    pub fn is_end_of_track(&self) -> bool {
        matches!(self, Event::Meta { kind, .. } if *kind == META_END_OF_TRACK)
    }

    pub fn channel(&self) -> Option<u8> {
        match self {
            Event::NoteOn { channel, .. }
            | Event::NoteOff { channel, .. }
            | Event::ControlChange { channel, .. }
            | Event::ProgramChange { channel, .. } => Some(*channel),
            Event::Other { status, .. } if *status < 0xF0 => Some(status & 0x0F),
            Event::Meta { .. } | Event::SysEx { .. } | Event::Other { .. } => None,
        }
    }

    /// Status byte this event is written with.
    pub fn status_byte(&self) -> u8 {
        match self {
            Event::NoteOn { channel, .. } => 0x90 | (channel & 0x0F),
            Event::NoteOff { channel, .. } => 0x80 | (channel & 0x0F),
            Event::ControlChange { channel, .. } => 0xB0 | (channel & 0x0F),
            Event::ProgramChange { channel, .. } => 0xC0 | (channel & 0x0F),
            Event::Meta { .. } => 0xFF,
            Event::SysEx { status, .. } => *status,
            Event::Other { status, .. } => *status,
        }
    }
}

/// An event at an absolute tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimedEvent {
    pub tick: u32,
    pub event: Event,
}

impl TimedEvent {
    pub fn new(tick: u32, event: Event) -> Self {
        Self { tick, event }
    }
}

/// Events of one track, kept in non-decreasing tick order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Track {
    events: Vec<TimedEvent>,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a track from events in any order.
    ///
    /// The sort is stable, so events sharing a tick keep their relative order.
    pub fn from_events(mut events: Vec<TimedEvent>) -> Self {
        events.sort_by_key(|e| e.tick);
        Self { events }
    }

    /// Accumulate `(delta, event)` pairs into absolute ticks.
    pub fn from_deltas<I>(deltas: I) -> Self
    where
        I: IntoIterator<Item = (u32, Event)>,
    {
        let mut tick: u32 = 0;
        let events = deltas
            .into_iter()
            .map(|(delta, event)| {
                tick = tick.saturating_add(delta);
                TimedEvent::new(tick, event)
            })
            .collect();
        Self { events }
    }

    /// Append an event, keeping tick order stable.
    pub fn push(&mut self, tick: u32, event: Event) {
        let at = self.events.partition_point(|e| e.tick <= tick);
        self.events.insert(at, TimedEvent::new(tick, event));
    }

    /// Delta time of each event against the previous one, starting from 0.
    pub fn to_deltas(&self) -> Vec<(u32, &Event)> {
        let mut previous = 0;
        self.events
            .iter()
            .map(|e| {
                let delta = e.tick - previous;
                previous = e.tick;
                (delta, &e.event)
            })
            .collect()
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<TimedEvent> {
        self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimedEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Tick of the last event, or 0 for an empty track.
    pub fn length(&self) -> u32 {
        self.events.last().map_or(0, |e| e.tick)
    }

    pub fn ends_with_end_of_track(&self) -> bool {
        self.events
            .last()
            .is_some_and(|e| e.event.is_end_of_track())
    }

    pub fn note_on_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.event, Event::NoteOn { .. }))
            .count()
    }

    /// First track name meta event, cleaned of padding.
    pub fn name(&self) -> Option<String> {
        self.events.iter().find_map(|e| match &e.event {
            Event::Meta { kind, data } if *kind == META_TRACK_NAME => {
                let name = String::from_utf8_lossy(data);
                let cleaned = name.trim_end_matches('\0').trim();
                (!cleaned.is_empty()).then(|| cleaned.to_string())
            }
            _ => None,
        })
    }
}

impl<'a> IntoIterator for &'a Track {
    type Item = &'a TimedEvent;
    type IntoIter = std::slice::Iter<'a, TimedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl FromIterator<TimedEvent> for Track {
    fn from_iter<I: IntoIterator<Item = TimedEvent>>(iter: I) -> Self {
        Track::from_events(iter.into_iter().collect())
    }
}

/// SMF header format field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Format {
    /// Format 0: one multi-channel track.
    SingleTrack,
    /// Format 1: simultaneous tracks sharing a time origin.
    #[default]
    Parallel,
    /// Format 2: independent sequential patterns.
    Sequential,
}

impl Format {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Format::SingleTrack),
            1 => Some(Format::Parallel),
            2 => Some(Format::Sequential),
            _ => None,
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Format::SingleTrack => 0,
            Format::Parallel => 1,
            Format::Sequential => 2,
        }
    }
}

/// A parsed Standard MIDI File.
#[derive(Debug, Default)]
pub struct MidiFile {
    pub format: Format,
    /// Ticks per quarter note.
    pub division: u16,
    /// Track count declared by the header. Can exceed `tracks.len()` when
    /// chunks were skipped or missing.
    pub track_count: usize,
    pub tracks: Vec<Track>,
    /// Chunk position of each entry of `tracks`. When shorter than `tracks`,
    /// the remaining tracks are numbered by position.
    pub track_indices: Vec<usize>,
    /// Tracks that failed to decode and were skipped.
    pub track_errors: Vec<TrackError>,
}

impl MidiFile {
    pub fn new(format: Format, division: u16) -> Self {
        Self {
            format,
            division,
            track_count: 0,
            tracks: Vec::new(),
            track_indices: Vec::new(),
            track_errors: Vec::new(),
        }
    }

    pub fn with_tracks(format: Format, division: u16, tracks: Vec<Track>) -> Self {
        Self {
            track_count: tracks.len(),
            tracks,
            ..Self::new(format, division)
        }
    }

    /// Chunk position of the track stored at `position`.
    pub fn track_index(&self, position: usize) -> usize {
        self.track_indices.get(position).copied().unwrap_or(position)
    }

    /// Tracks paired with their chunk position in the source file.
    pub fn indexed_tracks(&self) -> impl Iterator<Item = (usize, &Track)> + '_ {
        self.tracks
            .iter()
            .enumerate()
            .map(|(position, track)| (self.track_index(position), track))
    }
}
