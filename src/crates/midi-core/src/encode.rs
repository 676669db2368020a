//! Delta-time encoding and SMF serialization

use std::path::Path;

use tracing::debug;

use crate::chunk::{HEADER_LEN, HEADER_TAG, TRACK_TAG};
use crate::cursor::write_var_len;
use crate::error::{Error, Result};
use crate::event::{Event, MidiFile, Track};

#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Omit repeated channel voice status bytes.
    pub running_status: bool,
    /// Append an end-of-track meta event when the track lacks one.
    pub end_of_track: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            running_status: true,
            end_of_track: true,
        }
    }
}

/// Serialize a track's events as an `MTrk` payload.
pub fn encode_track(track: &Track, options: EncodeOptions) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(track.len() * 4);
    let mut running_status: Option<u8> = None;

    for (delta, event) in track.to_deltas() {
        write_var_len(&mut out, delta)?;
        running_status = encode_event(&mut out, event, running_status, options.running_status)?;
    }

    if options.end_of_track && !track.ends_with_end_of_track() {
        out.push(0x00);
        encode_event(&mut out, &Event::end_of_track(), running_status, false)?;
    }

    Ok(out)
}

/// Write one event and return the running status in effect after it.
///
/// Meta, sysex and system messages clear the running status, so the next
/// channel message always carries its status byte. Any reader accepts that.
fn encode_event(
    out: &mut Vec<u8>,
    event: &Event,
    running_status: Option<u8>,
    compress: bool,
) -> Result<Option<u8>> {
    let status = event.status_byte();

    let data = match event {
        Event::Meta { kind, data } => {
            out.extend_from_slice(&[0xFF, *kind]);
            write_length(out, data.len())?;
            out.extend_from_slice(data);
            return Ok(None);
        }
        Event::SysEx { data, .. } => {
            out.push(status);
            write_length(out, data.len())?;
            out.extend_from_slice(data);
            return Ok(None);
        }
        Event::Other { data, .. } if status >= 0xF0 => {
            out.push(status);
            out.extend(data.iter().map(|b| b & 0x7F));
            return Ok(None);
        }
        Event::NoteOn { pitch, velocity, .. } => vec![*pitch, *velocity],
        Event::NoteOff { pitch, .. } => vec![*pitch, 0x00],
        Event::ControlChange {
            controller, value, ..
        } => vec![*controller, *value],
        Event::ProgramChange { program, .. } => vec![*program],
        Event::Other { data, .. } => data.clone(),
    };

    if !(compress && running_status == Some(status)) {
        out.push(status);
    }
    out.extend(data.into_iter().map(|b| b & 0x7F));

    Ok(Some(status))
}

fn write_length(out: &mut Vec<u8>, len: usize) -> Result<()> {
    let len = u32::try_from(len).map_err(|_| Error::ValueTooLarge { value: len as u64 })?;
    write_var_len(out, len)
}

impl MidiFile {
    /// Serialize the file with default [`EncodeOptions`].
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_bytes_with(EncodeOptions::default())
    }

    pub fn to_bytes_with(&self, options: EncodeOptions) -> Result<Vec<u8>> {
        let track_count = u16::try_from(self.tracks.len()).map_err(|_| Error::ValueTooLarge {
            value: self.tracks.len() as u64,
        })?;

        let mut out = Vec::new();
        out.extend_from_slice(HEADER_TAG);
        out.extend_from_slice(&HEADER_LEN.to_be_bytes());
        out.extend_from_slice(&self.format.as_u16().to_be_bytes());
        out.extend_from_slice(&track_count.to_be_bytes());
        out.extend_from_slice(&self.division.to_be_bytes());

        for track in &self.tracks {
            let payload = encode_track(track, options)?;
            let len = u32::try_from(payload.len()).map_err(|_| Error::ValueTooLarge {
                value: payload.len() as u64,
            })?;
            out.extend_from_slice(TRACK_TAG);
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(&payload);
        }

        debug!(tracks = self.tracks.len(), bytes = out.len(), "encoded file");
        Ok(out)
    }

    /// Serialize and write the file to disk.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
