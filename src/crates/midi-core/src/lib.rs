//! Standard MIDI File event engine
//!
//! This crate decodes Standard MIDI Files into absolute-time event streams,
//! merges independently generated streams, and writes them back out as
//! delta-time encoded files.
//!
//! # Examples
//!
//! ```
//! use midi_core::{merge, Event, Format, MidiFile, Track};
//!
//! let bass = Track::from_deltas(vec![
//!     (0, Event::NoteOn { channel: 0, pitch: 36, velocity: 100 }),
//!     (480, Event::NoteOff { channel: 0, pitch: 36 }),
//! ]);
//! let lead = Track::from_deltas(vec![
//!     (240, Event::NoteOn { channel: 1, pitch: 72, velocity: 90 }),
//!     (240, Event::NoteOff { channel: 1, pitch: 72 }),
//! ]);
//!
//! let file = MidiFile::with_tracks(Format::SingleTrack, 480, vec![merge([bass, lead])]);
//! let bytes = file.to_bytes().unwrap();
//! let parsed = MidiFile::parse(&bytes).unwrap();
//! assert_eq!(parsed.tracks[0].length(), 480);
//! ```
//!
//! # Main Components
//!
//! - **ByteCursor**: bounds-checked reads and variable-length quantities
//! - **MidiFile::parse**: header and track chunk parsing
//! - **decode_track**: running-status aware event decoding
//! - **merge** / **encode_track**: timeline merging and delta encoding
//! - **transform**: deterministic remix transforms

pub mod chunk;
pub mod cursor;
pub mod decode;
pub mod encode;
pub mod error;
pub mod event;
pub mod merge;
pub mod transform;

pub use chunk::Header;
pub use cursor::{write_var_len, ByteCursor, MAX_VAR_LEN};
pub use decode::{decode_track, decode_track_at};
pub use encode::{encode_track, EncodeOptions};
pub use error::{Error, Result, TrackError};
pub use event::{Event, Format, MidiFile, TimedEvent, Track};
pub use merge::merge;
