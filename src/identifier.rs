//! Record identifiers: extraction from free text and shape validation.
//!
//! An identifier is a 15- or 18-character alphanumeric token. Users paste
//! bare identifiers, URLs containing one, or arbitrary text; extraction
//! finds the first token-shaped run, preferring the 18-character form.

use std::sync::LazyLock;

use regex::Regex;

/// First identifier-shaped run in free text. The 18-character alternative is
/// listed first so it wins over a 15-character prefix at the same position.
static EMBEDDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z0-9]{18}|[A-Za-z0-9]{15})\b").expect("identifier pattern is valid")
});

/// A whole string that looks like an identifier.
static WHOLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{15,18}$").expect("identifier pattern is valid"));

/// Length of the type-identifying prefix.
const KEY_PREFIX_LEN: usize = 3;

/// Find the first identifier embedded in `text`.
pub fn extract(text: &str) -> Option<&str> {
    EMBEDDED.find(text).map(|m| m.as_str())
}

/// Whether `value` as a whole has the identifier shape.
///
/// Used to decide which displayed values can be drilled into.
pub fn is_identifier(value: &str) -> bool {
    WHOLE.is_match(value)
}

/// Turn user input into an identifier, or `None` if it cannot be one.
///
/// Extraction is attempted first; when nothing is embedded the trimmed
/// input itself is validated.
pub fn parse(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let candidate = extract(trimmed).unwrap_or(trimmed);
    is_identifier(candidate).then(|| candidate.to_string())
}

/// The structural prefix that determines the record type.
pub fn key_prefix(id: &str) -> &str {
    id.get(..KEY_PREFIX_LEN).unwrap_or(id)
}
