const NOTE_NAMES: [&str; 12] = [
    "c", "db", "d", "eb", "e", "f", "gb", "g", "ab", "a", "bb", "b",
];

/// Convert a MIDI note number to a Strudel note name (e.g., "c4", "eb5")
pub fn note_num_to_str(note_num: u8) -> String {
    let note_name = NOTE_NAMES[(note_num % 12) as usize];
    let octave = (note_num / 12) as i32 - 1;

    format!("{}{}", note_name, octave)
}
