//! Pure heuristic language detection by Unicode script block. No model
//! call — this runs before routing, on every request, so it has to be
//! cheap and deterministic.

/// A contiguous Unicode code point range and the ISO 639-1 code it maps
/// to. Order matters: the first range a character falls in wins.
const SCRIPT_TABLE: &[(char, char, &str)] = &[
    ('\u{0900}', '\u{097F}', "hi"), // Devanagari
    ('\u{0980}', '\u{09FF}', "bn"), // Bengali
    ('\u{0A00}', '\u{0A7F}', "pa"), // Gurmukhi
    ('\u{0A80}', '\u{0AFF}', "gu"), // Gujarati
    ('\u{0B00}', '\u{0B7F}', "or"), // Odia
    ('\u{0B80}', '\u{0BFF}', "ta"), // Tamil
    ('\u{0C00}', '\u{0C7F}', "te"), // Telugu
    ('\u{0C80}', '\u{0CFF}', "kn"), // Kannada
    ('\u{0D00}', '\u{0D7F}', "ml"), // Malayalam
];

/// The language assumed when no recognized script is present, or when
/// no script clears the dominance threshold.
pub const DEFAULT_LANGUAGE: &str = "en";

/// A script must cover more than this fraction of a text's characters
/// to be treated as the dominant language (spec §4.4).
const DOMINANCE_THRESHOLD: f64 = 0.3;

/// Detect the dominant script in `text` and map it to a language code.
///
/// Counts how many characters fall in each table entry's range, then
/// picks the range with the most hits — but only if that range's
/// *fraction* of the text's total characters exceeds
/// [`DOMINANCE_THRESHOLD`]; otherwise (or on an empty string) falls
/// back to [`DEFAULT_LANGUAGE`]. This keeps a mostly-English,
/// code-mixed utterance in English rather than flipping language on a
/// single loanword.
pub fn detect_language(text: &str) -> &'static str {
    let mut counts = [0usize; SCRIPT_TABLE.len()];
    let mut total = 0usize;

    for ch in text.chars() {
        total += 1;
        for (i, (lo, hi, _)) in SCRIPT_TABLE.iter().enumerate() {
            if ch >= *lo && ch <= *hi {
                counts[i] += 1;
                break;
            }
        }
    }

    if total == 0 {
        return DEFAULT_LANGUAGE;
    }

    counts
        .iter()
        .enumerate()
        .filter(|(_, &c)| c > 0)
        .max_by_key(|(_, &c)| c)
        .filter(|(_, &c)| (c as f64 / total as f64) > DOMINANCE_THRESHOLD)
        .map(|(i, _)| SCRIPT_TABLE[i].2)
        .unwrap_or(DEFAULT_LANGUAGE)
}
