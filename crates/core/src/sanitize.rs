//! Text cleanup for creative-asset labels and filesystem names.
//!
//! Asset labels come straight from ad copy and routinely carry emoji and
//! embedded newlines, both of which wreck chart axes and CSV rows.

/// Unicode ranges treated as emoji. Matches the ranges the platform's
/// creative text is known to carry: emoticons, pictographs, transport and
/// map symbols, alchemical symbols, extended geometric shapes, supplemental
/// arrows and symbols, chess symbols, dingbats, and the broad legacy
/// miscellaneous-symbols range.
const EMOJI_RANGES: &[(u32, u32)] = &[
    (0x1F600, 0x1F64F),
    (0x1F300, 0x1F5FF),
    (0x1F680, 0x1F6FF),
    (0x1F700, 0x1F77F),
    (0x1F780, 0x1F7FF),
    (0x1F800, 0x1F8FF),
    (0x1F900, 0x1F9FF),
    (0x1FA00, 0x1FA6F),
    (0x1FA70, 0x1FAFF),
    (0x2702, 0x27B0),
    (0x24C2, 0x1F251),
];

fn is_emoji(c: char) -> bool {
    let cp = c as u32;
    EMOJI_RANGES.iter().any(|&(lo, hi)| cp >= lo && cp <= hi)
}

/// Remove emoji characters, leaving all other text (accents, non-Latin
/// scripts below the emoji planes) untouched.
pub fn strip_emoji(text: &str) -> String {
    text.chars().filter(|c| !is_emoji(*c)).collect()
}

/// Clean a free-text asset label: strip emoji and collapse embedded
/// newlines to single spaces. Idempotent.
pub fn clean_label(text: &str) -> String {
    strip_emoji(text).replace(['\r', '\n'], " ")
}

/// Turn an arbitrary campaign or period name into a safe folder segment:
/// spaces become underscores, characters that are meaningful to the
/// filesystem are dropped, and the result is lowercased.
pub fn safe_folder_name(name: &str) -> String {
    name.chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            ':' | '/' | '\\' => None,
            _ => Some(c),
        })
        .collect::<String>()
        .to_lowercase()
}
