/// Collapse every whitespace run into a single space and trim both ends.
///
/// Applied to rendered text only; attribute values and markup are returned as stored.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
