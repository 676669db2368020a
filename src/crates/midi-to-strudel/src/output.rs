use midi_core::MidiFile;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grid::GridReducer;
use crate::token::{has_triggers, GridToken};
use crate::track::{reduce_tracks, ReducedTrack};

/// How each track block is wrapped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Marker line followed by the token lines
    Bare,
    /// Token lines wrapped in `s("midi").note("...")`
    #[default]
    Strudel,
}

pub struct SymbolicEncoder {
    bar_cells: usize,
    min_cells: usize,
    layout: Layout,
}

impl SymbolicEncoder {
    pub fn new(bar_cells: usize, min_cells: usize, layout: Layout) -> Self {
        Self {
            bar_cells: bar_cells.max(1),
            min_cells,
            layout,
        }
    }

    /// Render tokens as bar-sized lines.
    ///
    /// Returns `None` for sequences that never strike a note, and for
    /// sequences not longer than `min_cells`.
    pub fn render_tokens(&self, tokens: &[GridToken]) -> Option<Vec<String>> {
        if !has_triggers(tokens) || tokens.len() <= self.min_cells {
            return None;
        }

        let lines = tokens
            .chunks(self.bar_cells)
            .map(|bar| {
                bar.iter()
                    .map(GridToken::to_strudel)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        Some(lines)
    }

    /// Render one track block, or `None` if the track is elided.
    pub fn render_block(&self, index: usize, tokens: &[GridToken]) -> Option<String> {
        let lines = self.render_tokens(tokens)?;

        let mut output = vec![format!("// Track {} (Generated)", index)];
        match self.layout {
            Layout::Bare => output.extend(lines),
            Layout::Strudel => {
                output.push("s(\"midi\")".to_string());
                output.push(".note(\"".to_string());
                output.extend(lines);
                output.push("\")".to_string());
            }
        }

        Some(output.join("\n"))
    }

    pub fn build_output(&self, file: &MidiFile, reducer: &GridReducer) -> String {
        let mut output = vec![format!(
            "// Format: {}, Tracks: {}, Division: {}",
            file.format.as_u16(),
            file.track_count,
            file.division
        )];

        for track in reduce_tracks(file, reducer) {
            match self.render_block(track.index, &track.tokens) {
                Some(block) => output.push(block),
                None => debug!(index = track.index, cells = track.tokens.len(), "eliding track"),
            }
        }

        let separator = match self.layout {
            Layout::Bare => "\n",
            Layout::Strudel => "\n\n",
        };
        output.join(separator)
    }

    /// Build JSON output of the reduced tracks
    pub fn build_output_json(
        &self,
        file: &MidiFile,
        reducer: &GridReducer,
    ) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct JsonOutput {
            division: u16,
            grid_step: u32,
            tracks: Vec<ReducedTrack>,
        }

        let tracks = reduce_tracks(file, reducer)
            .into_iter()
            .filter(|track| self.render_tokens(&track.tokens).is_some())
            .collect();

        serde_json::to_string_pretty(&JsonOutput {
            division: file.division,
            grid_step: reducer.grid_step(),
            tracks,
        })
    }
}

impl Default for SymbolicEncoder {
    fn default() -> Self {
        Self::new(16, 0, Layout::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ReductionPolicy;
    use midi_core::{Event, Format, Track};
    use pretty_assertions::assert_eq;
    use GridToken::{Rest, Sustain, Trigger};

    #[test]
    fn test_trivial_sequences_are_dropped() {
        let encoder = SymbolicEncoder::default();
        assert_eq!(encoder.render_tokens(&[Rest, Sustain, Rest]), None);
        assert_eq!(encoder.render_tokens(&[]), None);
        assert_eq!(encoder.render_block(0, &[Sustain, Sustain]), None);
    }

    #[test]
    fn test_min_cells_filter() {
        let encoder = SymbolicEncoder::new(16, 4, Layout::Bare);
        assert_eq!(encoder.render_tokens(&[Trigger(60), Rest, Rest, Rest]), None);
        assert!(encoder
            .render_tokens(&[Trigger(60), Rest, Rest, Rest, Rest])
            .is_some());
    }

    #[test]
    fn test_tokens_are_chunked_into_bars() {
        let encoder = SymbolicEncoder::new(4, 0, Layout::Bare);
        let tokens = [
            Trigger(60), Sustain, Rest, Trigger(63),
            Trigger(67), Sustain, Sustain, Sustain,
            Rest,
        ];
        assert_eq!(
            encoder.render_tokens(&tokens).unwrap(),
            vec!["c4 _ ~ eb4", "g4 _ _ _", "~"]
        );
    }

    #[test]
    fn test_bare_block() {
        let encoder = SymbolicEncoder::new(2, 0, Layout::Bare);
        let block = encoder.render_block(3, &[Trigger(72), Sustain, Rest]).unwrap();
        assert_eq!(block, "// Track 3 (Generated)\nc5 _\n~");
    }

    #[test]
    fn test_strudel_block() {
        let encoder = SymbolicEncoder::new(16, 0, Layout::Strudel);
        let block = encoder.render_block(1, &[Trigger(57), Rest]).unwrap();
        assert_eq!(
            block,
            "// Track 1 (Generated)\ns(\"midi\")\n.note(\"\na3 ~\n\")"
        );
    }

    fn two_track_file() -> MidiFile {
        let mut silent = Track::new();
        silent.push(0, Event::ProgramChange { channel: 0, program: 12 });
        silent.push(0, Event::end_of_track());

        let mut melody = Track::new();
        melody.push(0, Event::NoteOn { channel: 0, pitch: 60, velocity: 90 });
        melody.push(48, Event::NoteOff { channel: 0, pitch: 60 });
        melody.push(48, Event::NoteOn { channel: 0, pitch: 62, velocity: 90 });
        melody.push(72, Event::NoteOff { channel: 0, pitch: 62 });

        MidiFile::with_tracks(Format::Parallel, 96, vec![silent, melody])
    }

    #[test]
    fn test_build_output() {
        let file = two_track_file();
        let reducer = GridReducer::for_division(96, 4, ReductionPolicy::default());
        let encoder = SymbolicEncoder::new(16, 0, Layout::Bare);

        assert_eq!(
            encoder.build_output(&file, &reducer),
            "// Format: 1, Tracks: 2, Division: 96\n// Track 1 (Generated)\nc4 _ d4 ~"
        );
    }

    #[test]
    fn test_build_output_json() {
        let file = two_track_file();
        let reducer = GridReducer::for_division(96, 4, ReductionPolicy::default());
        let json = SymbolicEncoder::default()
            .build_output_json(&file, &reducer)
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["division"], 96);
        assert_eq!(value["grid_step"], 24);
        assert_eq!(value["tracks"].as_array().unwrap().len(), 1);
        assert_eq!(value["tracks"][0]["index"], 1);
        assert_eq!(value["tracks"][0]["tokens"][0]["Trigger"], 60);
        assert_eq!(value["tracks"][0]["tokens"][1], "Sustain");
    }
}
