//! Track chunk event decoder
//!
//! Walks the bytes of one `MTrk` payload and accumulates delta times into
//! absolute ticks. Running status is carried as a plain `Option<u8>` through
//! the loop, so nothing leaks between tracks.

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::event::{Event, TimedEvent, Track};

/// Decode a track payload that starts at file offset 0.
pub fn decode_track(payload: &[u8]) -> Result<Track> {
    decode_track_at(payload, 0)
}

/// Decode a track payload located at `base` within the file.
pub fn decode_track_at(payload: &[u8], base: usize) -> Result<Track> {
    let mut cursor = ByteCursor::with_base(payload, base);
    let mut events = Vec::new();
    let mut tick: u32 = 0;
    let mut running_status: Option<u8> = None;

    while !cursor.is_at_end() {
        let delta = cursor.read_var_len()?;
        tick = tick.saturating_add(delta);

        // A delta with nothing after it is padding.
        let Some(next) = cursor.peek_u8() else {
            break;
        };

        let status = if next & 0x80 != 0 {
            cursor.read_u8()?
        } else {
            running_status.ok_or(Error::NoRunningStatus {
                offset: cursor.offset(),
            })?
        };

        let (event, status_after) = decode_event(&mut cursor, status, running_status)?;
        running_status = status_after;
        events.push(TimedEvent::new(tick, event));
    }

    Ok(Track::from_events(events))
}

/// Decode the body of one event whose status byte is already known.
///
/// Returns the event together with the running status to use afterwards.
/// Only channel voice statuses replace it; meta, sysex and system messages
/// leave the previous one in place.
fn decode_event(
    cursor: &mut ByteCursor<'_>,
    status: u8,
    running_status: Option<u8>,
) -> Result<(Event, Option<u8>)> {
    let channel = status & 0x0F;

    let event = match status {
        0x80..=0x8F => {
            let [pitch, _velocity] = data_bytes::<2>(cursor)?;
            Event::NoteOff { channel, pitch }
        }
        0x90..=0x9F => {
            let [pitch, velocity] = data_bytes::<2>(cursor)?;
            if velocity == 0 {
                Event::NoteOff { channel, pitch }
            } else {
                Event::NoteOn {
                    channel,
                    pitch,
                    velocity,
                }
            }
        }
        0xB0..=0xBF => {
            let [controller, value] = data_bytes::<2>(cursor)?;
            Event::ControlChange {
                channel,
                controller,
                value,
            }
        }
        0xC0..=0xCF => {
            let [program] = data_bytes::<1>(cursor)?;
            Event::ProgramChange { channel, program }
        }
        0xD0..=0xDF => Event::Other {
            status,
            data: data_bytes::<1>(cursor)?.to_vec(),
        },
        0x80..=0xEF => Event::Other {
            status,
            data: data_bytes::<2>(cursor)?.to_vec(),
        },
        0xF0 | 0xF7 => {
            let len = cursor.read_var_len()? as usize;
            let data = cursor.read_bytes(len)?.to_vec();
            return Ok((Event::SysEx { status, data }, running_status));
        }
        0xFF => {
            let kind = cursor.read_u8()?;
            let len = cursor.read_var_len()? as usize;
            let data = cursor.read_bytes(len)?.to_vec();
            return Ok((Event::Meta { kind, data }, running_status));
        }
        _ => {
            let data = match status {
                0xF2 => data_bytes::<2>(cursor)?.to_vec(),
                0xF1 | 0xF3 => data_bytes::<1>(cursor)?.to_vec(),
                _ => Vec::new(),
            };
            return Ok((Event::Other { status, data }, running_status));
        }
    };

    Ok((event, Some(status)))
}

fn data_bytes<const N: usize>(cursor: &mut ByteCursor<'_>) -> Result<[u8; N]> {
    let mut bytes = cursor.read_array::<N>()?;
    for byte in &mut bytes {
        *byte &= 0x7F;
    }
    Ok(bytes)
}
