//! Answer comparison: names match regardless of case, accents and gender glyphs.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

const GENDER_GLYPHS: [char; 2] = ['\u{2640}', '\u{2642}'];

/// Canonical comparison form of a name.
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    raw.nfd()
        .filter(|c| !is_combining_mark(*c) && !GENDER_GLYPHS.contains(c))
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .trim()
        .to_owned()
}

/// Whether `answer` names the same item as `solution`.
///
/// An unresolved solution never matches.
#[must_use]
pub fn names_match(answer: &str, solution: Option<&str>) -> bool {
    solution.is_some_and(|solution| normalize_name(answer) == normalize_name(solution))
}
