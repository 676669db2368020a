//! Symbolic grid tokens
//!
//! One token describes one grid cell of a reduced track: a newly struck note,
//! the continuation of the previous one, or silence.

use serde::{Deserialize, Serialize};

use crate::note::note_num_to_str;

/// Mini notation marker for a held note.
pub const SUSTAIN_MARKER: &str = "_";
/// Mini notation marker for silence.
pub const REST_MARKER: &str = "~";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridToken {
    /// Note struck in this cell (MIDI pitch)
    Trigger(u8),

    /// Note carried over from an earlier cell
    Sustain,

    /// Nothing sounding
    Rest,
}

impl GridToken {
    /// Convert to Strudel mini notation
    pub fn to_strudel(&self) -> String {
        match self {
            GridToken::Trigger(pitch) => note_num_to_str(*pitch),
            GridToken::Sustain => SUSTAIN_MARKER.to_string(),
            GridToken::Rest => REST_MARKER.to_string(),
        }
    }

    pub fn is_trigger(&self) -> bool {
        matches!(self, GridToken::Trigger(_))
    }
}

/// True when at least one cell strikes a note.
pub fn has_triggers(tokens: &[GridToken]) -> bool {
    tokens.iter().any(GridToken::is_trigger)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_strudel() {
        assert_eq!(GridToken::Trigger(60).to_strudel(), "c4");
        assert_eq!(GridToken::Sustain.to_strudel(), "_");
        assert_eq!(GridToken::Rest.to_strudel(), "~");
    }

    #[test]
    fn test_has_triggers() {
        assert!(!has_triggers(&[]));
        assert!(!has_triggers(&[GridToken::Rest, GridToken::Sustain]));
        assert!(has_triggers(&[GridToken::Rest, GridToken::Trigger(40)]));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&[GridToken::Trigger(62), GridToken::Rest]).unwrap();
        assert_eq!(json, r#"[{"Trigger":62},"Rest"]"#);
    }
}
