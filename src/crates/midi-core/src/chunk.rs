//! `MThd` / `MTrk` chunk parsing

use std::path::Path;

use tracing::{debug, warn};

use crate::cursor::ByteCursor;
use crate::decode::decode_track_at;
use crate::error::{Error, Result, TrackError};
use crate::event::{Format, MidiFile};

pub const HEADER_TAG: &[u8; 4] = b"MThd";
pub const TRACK_TAG: &[u8; 4] = b"MTrk";

/// Length of the three 16-bit header fields.
pub const HEADER_LEN: u32 = 6;

/// Fields of the `MThd` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub format: Format,
    pub track_count: u16,
    pub division: u16,
}

impl Header {
    /// Parse the header chunk, leaving the cursor on the first track chunk.
    pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let tag_offset = cursor.offset();
        let tag = cursor
            .read_array::<4>()
            .map_err(|_| Error::invalid_header(tag_offset, "file is shorter than a header tag"))?;
        if &tag != HEADER_TAG {
            return Err(Error::invalid_header(
                tag_offset,
                format!("expected tag {:?}, found {:?}", tag_str(HEADER_TAG), tag_str(&tag)),
            ));
        }

        let len_offset = cursor.offset();
        let header_len = cursor.read_u32_be().map_err(|e| header_read(e, "header length"))?;
        if header_len < HEADER_LEN {
            return Err(Error::invalid_header(
                len_offset,
                format!("header length {} is shorter than {}", header_len, HEADER_LEN),
            ));
        }

        let fields_offset = cursor.offset();
        let raw_format = cursor.read_u16_be().map_err(|e| header_read(e, "format"))?;
        let track_count = cursor.read_u16_be().map_err(|e| header_read(e, "track count"))?;
        let division = cursor.read_u16_be().map_err(|e| header_read(e, "division"))?;

        let format = Format::from_u16(raw_format).ok_or_else(|| {
            Error::invalid_header(fields_offset, format!("unknown format {}", raw_format))
        })?;

        if division & 0x8000 != 0 {
            return Err(Error::invalid_header(
                fields_offset + 4,
                format!("SMPTE division {:#06x} is not supported", division),
            ));
        }
        if division == 0 {
            return Err(Error::invalid_header(
                fields_offset + 4,
                "division must be at least one tick per quarter note",
            ));
        }

        // Newer revisions may append fields to the header.
        let extra = (header_len - HEADER_LEN) as usize;
        cursor.skip(extra).map_err(|e| header_read(e, "declared header length"))?;

        Ok(Self {
            format,
            track_count,
            division,
        })
    }
}

impl MidiFile {
    /// Parse a complete Standard MIDI File.
    ///
    /// Header problems abort the parse. A track chunk that fails to decode is
    /// dropped and recorded in [`MidiFile::track_errors`]; a missing or
    /// mistagged track chunk ends the parse but keeps the tracks read so far.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(data);
        let header = Header::parse(&mut cursor)?;
        let mut file = MidiFile::new(header.format, header.division);
        file.track_count = usize::from(header.track_count);

        debug!(
            format = header.format.as_u16(),
            tracks = header.track_count,
            division = header.division,
            "parsed header"
        );

        for index in 0..usize::from(header.track_count) {
            let chunk_offset = cursor.offset();
            let Ok(tag) = cursor.read_array::<4>() else {
                warn!(index, offset = chunk_offset, "file ends before track chunk");
                break;
            };
            if &tag != TRACK_TAG {
                warn!(
                    index,
                    offset = chunk_offset,
                    found = %tag_str(&tag),
                    "unexpected chunk tag, stopping"
                );
                break;
            }
            let Ok(declared) = cursor.read_u32_be() else {
                warn!(index, offset = chunk_offset, "truncated track chunk header");
                break;
            };

            let payload_offset = cursor.offset();
            let available = cursor.remaining();
            let len = (declared as usize).min(available);
            if len < declared as usize {
                warn!(
                    index,
                    declared,
                    available,
                    "track chunk runs past end of file"
                );
            }
            // `len` never exceeds what is left, so this read cannot fail.
            let payload = cursor.read_bytes(len)?;

            match decode_track_at(payload, payload_offset) {
                Ok(track) => {
                    debug!(index, events = track.len(), length = track.length(), "decoded track");
                    file.tracks.push(track);
                    file.track_indices.push(index);
                }
                Err(error) if error.is_track_local() => {
                    warn!(index, %error, "discarding track");
                    file.track_errors.push(TrackError { index, error });
                }
                Err(error) => return Err(error),
            }
        }

        Ok(file)
    }

    /// Read and parse a file from disk.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&data)
    }
}

fn header_read(error: Error, field: &str) -> Error {
    let offset = error.offset().unwrap_or_default();
    Error::invalid_header(offset, format!("cannot read {}", field))
}

fn tag_str(tag: &[u8]) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    fn header(format: u16, tracks: u16, division: u16) -> Vec<u8> {
        let mut out = b"MThd".to_vec();
        out.extend_from_slice(&6u32.to_be_bytes());
        out.extend_from_slice(&format.to_be_bytes());
        out.extend_from_slice(&tracks.to_be_bytes());
        out.extend_from_slice(&division.to_be_bytes());
        out
    }

    fn track_chunk(payload: &[u8]) -> Vec<u8> {
        let mut out = b"MTrk".to_vec();
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    const SIMPLE_TRACK: [u8; 12] = [
        0x00, 0x90, 0x3C, 0x64, //
        0x60, 0x80, 0x3C, 0x00, //
        0x00, 0xFF, 0x2F, 0x00,
    ];

    #[test]
    fn test_parse_header_and_tracks() {
        let mut data = header(1, 2, 480);
        data.extend(track_chunk(&SIMPLE_TRACK));
        data.extend(track_chunk(&SIMPLE_TRACK));

        let file = MidiFile::parse(&data).unwrap();
        assert_eq!(file.format, Format::Parallel);
        assert_eq!(file.division, 480);
        assert_eq!(file.tracks.len(), 2);
        assert!(file.track_errors.is_empty());
        assert_eq!(file.tracks[0].length(), 96);
    }

    #[test]
    fn test_bad_magic_is_invalid_header() {
        let data = b"RIFF\x00\x00\x00\x06\x00\x00\x00\x01\x01\xE0".to_vec();
        let err = MidiFile::parse(&data).unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { offset: 0, .. }));
        assert!(err.to_string().contains("MThd"));
    }

    #[test]
    fn test_short_header_is_invalid() {
        let err = MidiFile::parse(b"MThd\x00\x00").unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { .. }));
    }

    #[test]
    fn test_smpte_division_is_rejected() {
        let data = header(0, 0, 0xE728);
        assert!(matches!(
            MidiFile::parse(&data),
            Err(Error::InvalidHeader { offset: 12, .. })
        ));
    }

    #[test]
    fn test_extra_header_bytes_are_skipped() {
        let mut data = b"MThd".to_vec();
        data.extend_from_slice(&8u32.to_be_bytes());
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x01, 0x00, 0x60, 0xAA, 0xBB]);
        data.extend(track_chunk(&SIMPLE_TRACK));

        let file = MidiFile::parse(&data).unwrap();
        assert_eq!(file.format, Format::SingleTrack);
        assert_eq!(file.division, 96);
        assert_eq!(file.tracks.len(), 1);
    }

    #[test]
    fn test_tag_mismatch_keeps_earlier_tracks() {
        let mut data = header(1, 3, 96);
        data.extend(track_chunk(&SIMPLE_TRACK));
        data.extend_from_slice(b"XFIH\x00\x00\x00\x00");
        data.extend(track_chunk(&SIMPLE_TRACK));

        let file = MidiFile::parse(&data).unwrap();
        assert_eq!(file.tracks.len(), 1);
        assert!(file.track_errors.is_empty());
    }

    #[test]
    fn test_missing_tracks_stop_quietly() {
        let mut data = header(1, 4, 96);
        data.extend(track_chunk(&SIMPLE_TRACK));
        let file = MidiFile::parse(&data).unwrap();
        assert_eq!(file.tracks.len(), 1);
        assert_eq!(file.track_count, 4);
    }

    #[test]
    fn test_broken_track_is_dropped_and_later_tracks_parse() {
        let broken = [0x00, 0x3C, 0x64, 0x00, 0xFF, 0x2F, 0x00];
        let mut data = header(1, 3, 96);
        data.extend(track_chunk(&SIMPLE_TRACK));
        data.extend(track_chunk(&broken));
        data.extend(track_chunk(&SIMPLE_TRACK));

        let file = MidiFile::parse(&data).unwrap();
        assert_eq!(file.tracks.len(), 2);
        assert_eq!(file.track_count, 3);
        assert_eq!(file.track_indices, vec![0, 2]);
        assert_eq!(file.track_errors.len(), 1);
        assert_eq!(file.track_errors[0].index, 1);
        assert!(file.track_errors[0].error.is_track_local());
        assert!(matches!(
            file.track_errors[0].error,
            Error::NoRunningStatus { offset: 43 }
        ));
    }

    #[test]
    fn test_chunk_longer_than_file_is_decoded_from_available_bytes() {
        let mut data = header(0, 1, 96);
        data.extend_from_slice(b"MTrk");
        data.extend_from_slice(&100u32.to_be_bytes());
        data.extend_from_slice(&SIMPLE_TRACK);

        let file = MidiFile::parse(&data).unwrap();
        assert_eq!(file.tracks.len(), 1);
        assert!(matches!(
            file.tracks[0].events()[0].event,
            Event::NoteOn { pitch: 60, .. }
        ));
    }

    #[test]
    fn test_truncated_track_keeps_previous_tracks() {
        let mut data = header(1, 2, 96);
        data.extend(track_chunk(&SIMPLE_TRACK));
        data.extend_from_slice(b"MTrk");
        data.extend_from_slice(&4u32.to_be_bytes());
        data.extend_from_slice(&[0x00, 0x90, 0x3C]);

        let file = MidiFile::parse(&data).unwrap();
        assert_eq!(file.tracks.len(), 1);
        assert!(matches!(
            file.track_errors[0].error,
            Error::TruncatedInput { .. }
        ));
    }
}
