//! Text normalization for locale-robust substring matching.
//!
//! Place names in the corpus carry Turkish diacritics while user prompts
//! often do not ("Cesme" for "Çeşme"). Every containment test in the
//! resolver runs over normalized text on both sides.

/// Lower-case and fold Turkish diacritics to their base-Latin letters.
///
/// Pure and idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'ç' => 'c',
            'ş' => 's',
            'ı' => 'i',
            'ğ' => 'g',
            'ü' => 'u',
            'ö' => 'o',
            other => other,
        })
        .collect()
}
