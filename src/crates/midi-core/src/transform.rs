//! Deterministic track transforms used to build remix layers
//!
//! Every transform takes an owned track and returns a new one. Events that a
//! transform does not concern pass through untouched.

use crate::event::{Event, MidiFile, TimedEvent, Track};

fn map_events<F>(track: Track, mut f: F) -> Track
where
    F: FnMut(TimedEvent) -> TimedEvent,
{
    Track::from_events(track.into_events().into_iter().map(&mut f).collect())
}

fn map_pitch<F>(track: Track, f: F) -> Track
where
    F: Fn(u8) -> u8,
{
    map_events(track, |mut timed| {
        match &mut timed.event {
            Event::NoteOn { pitch, .. } | Event::NoteOff { pitch, .. } => *pitch = f(*pitch),
            _ => {}
        }
        timed
    })
}

fn clamp_pitch(value: i32) -> u8 {
    value.clamp(0, 127) as u8
}

/// Shift every note by `semitones`, clamped to the MIDI range.
pub fn transpose(track: Track, semitones: i32) -> Track {
    map_pitch(track, |pitch| clamp_pitch(i32::from(pitch) + semitones))
}

/// Mirror every note around `pivot` (60 is middle C), clamped to the MIDI range.
pub fn invert(track: Track, pivot: u8) -> Track {
    let pivot = i32::from(pivot);
    map_pitch(track, |pitch| clamp_pitch(2 * pivot - i32::from(pitch)))
}

/// Scale every tick by `factor`, rounding to the nearest tick.
///
/// Non-positive or non-finite factors leave the track unchanged.
pub fn stretch(track: Track, factor: f64) -> Track {
    if !factor.is_finite() || factor <= 0.0 {
        return track;
    }
    map_events(track, |mut timed| {
        let scaled = (f64::from(timed.tick) * factor).round();
        timed.tick = scaled.min(f64::from(u32::MAX)) as u32;
        timed
    })
}

/// Re-time a track recorded at division `from` for a file at division `to`.
pub fn rescale_division(track: Track, from: u16, to: u16) -> Track {
    if from == to || from == 0 {
        return track;
    }
    map_events(track, |mut timed| {
        let scaled = u64::from(timed.tick) * u64::from(to) / u64::from(from);
        timed.tick = u32::try_from(scaled).unwrap_or(u32::MAX);
        timed
    })
}

/// Give every sounding note the same velocity (1..=127).
pub fn with_velocity(track: Track, velocity: u8) -> Track {
    let velocity = velocity.clamp(1, 127);
    map_events(track, |mut timed| {
        if let Event::NoteOn { velocity: v, .. } = &mut timed.event {
            *v = velocity;
        }
        timed
    })
}

/// Prepend a program change on `channel` at tick 0.
pub fn with_program(track: Track, channel: u8, program: u8) -> Track {
    let mut events = vec![TimedEvent::new(
        0,
        Event::ProgramChange {
            channel: channel & 0x0F,
            program: program & 0x7F,
        },
    )];
    events.extend(track.into_events());
    Track::from_events(events)
}

/// Index of the track with the most note-on events; the first wins ties.
pub fn melody_track(file: &MidiFile) -> Option<usize> {
    file.tracks
        .iter()
        .enumerate()
        .filter(|(_, track)| track.note_on_count() > 0)
        .fold(None, |best: Option<(usize, usize)>, (index, track)| {
            let count = track.note_on_count();
            match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((index, count)),
            }
        })
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Format;

    fn line() -> Track {
        Track::from_deltas(vec![
            (0, Event::track_name("line")),
            (0, Event::NoteOn { channel: 0, pitch: 62, velocity: 90 }),
            (100, Event::NoteOff { channel: 0, pitch: 62 }),
            (0, Event::NoteOn { channel: 0, pitch: 120, velocity: 40 }),
            (50, Event::NoteOff { channel: 0, pitch: 120 }),
        ])
    }

    fn pitches(track: &Track) -> Vec<u8> {
        track
            .iter()
            .filter_map(|e| match e.event {
                Event::NoteOn { pitch, .. } | Event::NoteOff { pitch, .. } => Some(pitch),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_transpose_clamps() {
        assert_eq!(pitches(&transpose(line(), 10)), vec![72, 72, 127, 127]);
        assert_eq!(pitches(&transpose(line(), -2)), vec![60, 60, 118, 118]);
    }

    #[test]
    fn test_invert_around_middle_c() {
        assert_eq!(pitches(&invert(line(), 60)), vec![58, 58, 0, 0]);
    }

    #[test]
    fn test_stretch_scales_ticks() {
        let ticks: Vec<_> = stretch(line(), 1.3).iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![0, 0, 130, 130, 195]);
        assert_eq!(stretch(line(), 0.0), line());
    }

    #[test]
    fn test_rescale_division() {
        let ticks: Vec<_> = rescale_division(line(), 96, 480)
            .iter()
            .map(|e| e.tick)
            .collect();
        assert_eq!(ticks, vec![0, 0, 500, 500, 750]);
    }

    #[test]
    fn test_with_velocity_and_program() {
        let track = with_program(with_velocity(line(), 55), 2, 4);
        assert_eq!(
            track.events()[0].event,
            Event::ProgramChange { channel: 2, program: 4 }
        );
        assert!(track
            .iter()
            .all(|e| !matches!(e.event, Event::NoteOn { velocity, .. } if velocity != 55)));
    }

    #[test]
    fn test_melody_track_picks_busiest() {
        let drums = Track::from_deltas(vec![(0, Event::NoteOn { channel: 9, pitch: 36, velocity: 100 })]);
        let file = MidiFile::with_tracks(Format::Parallel, 96, vec![Track::new(), drums, line(), line()]);
        assert_eq!(melody_track(&file), Some(2));
        assert_eq!(melody_track(&MidiFile::new(Format::Parallel, 96)), None);
    }
}
