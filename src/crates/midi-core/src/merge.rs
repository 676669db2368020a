//! Merging independently generated tracks onto one timeline

use crate::event::{Event, TimedEvent, Track};

/// Merge tracks that share a tick origin into one time-ordered track.
///
/// Events are concatenated in input order and stable-sorted by tick, so
/// events on the same tick keep the order of their inputs. End-of-track
/// events are collected into a single one at the latest tick seen.
pub fn merge<I>(tracks: I) -> Track
where
    I: IntoIterator<Item = Track>,
{
    let mut events: Vec<TimedEvent> = Vec::new();
    let mut end: Option<u32> = None;
    let mut last_tick = 0;

    for track in tracks {
        for timed in track.into_events() {
            last_tick = last_tick.max(timed.tick);
            if timed.event.is_end_of_track() {
                end = Some(end.map_or(timed.tick, |t| t.max(timed.tick)));
            } else {
                events.push(timed);
            }
        }
    }

    let mut merged = Track::from_events(events);
    if end.is_some() {
        merged.push(last_tick, Event::end_of_track());
    }
    merged
}
