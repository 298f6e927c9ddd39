//! Free-text extractors: tour categories, travel dates, reset intent.

use std::collections::HashSet;
use std::sync::LazyLock;

// Pre-compiled regexes, compiled once and reused on every turn.
static DATE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r"(?i)(\d{1,2})\s*(January|February|March|April|May|June|July|August|September|October|November|December)",
    )
    .expect("date regex is valid")
});
static RESET_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"(?i)(new|reset|again).*?(plan|itinerary|tour)").expect("reset regex is valid")
});
static CATEGORY_SPLIT_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r",| and ").expect("category split regex is valid"));

/// Prompts never carry a year; itineraries are pinned to this one.
const TRAVEL_YEAR: u16 = 2025;

/// Detect a "start over" intent: a reset verb followed anywhere later in the
/// text by a planning noun ("let's plan a new tour", "reset the itinerary").
pub fn is_reset(prompt: &str) -> bool {
    RESET_RE.is_match(prompt)
}

/// Extract a calendar date like "15 April" anywhere in the text and return
/// the canonical "15 April 2025" form. `None` means the caller must
/// re-prompt; there is no implicit "today" fallback.
pub fn extract_date(text: &str) -> Option<String> {
    let captures = DATE_RE.captures(text)?;
    let day = &captures[1];
    let month = title_case(&captures[2]);
    Some(format!("{} {} {}", day, month, TRAVEL_YEAR))
}

/// Tokenize text on commas and the conjunction "and", keeping only tokens
/// that belong to the category vocabulary. Tokens come back lowercased, in
/// text order, possibly with duplicates; the caller sorts and dedups.
pub fn extract_categories(text: &str, vocabulary: &HashSet<String>) -> Vec<String> {
    split_category_tokens(text)
        .into_iter()
        .filter(|token| vocabulary.contains(token))
        .collect()
}

/// Split a comma/"and"-separated category phrase into trimmed lowercase
/// tokens, dropping empties. Shared by the extractor and the assembler.
pub fn split_category_tokens(text: &str) -> Vec<String> {
    CATEGORY_SPLIT_RE
        .split(text)
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
