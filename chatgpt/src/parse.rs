use slide_common::Slide;

use crate::error::GenerationError;

/// Extracts the deck from a model reply.
///
/// Models wrap the array in prose or code fences, so only the outermost
/// `[...]` span is parsed. A second attempt undoes the escaping some models
/// apply to the whole payload.
pub fn extract_deck(reply: &str) -> Result<Vec<Slide>, GenerationError> {
    let candidate = outer_array(reply).unwrap_or(reply);

    let slides: Vec<Slide> = match serde_json::from_str(candidate) {
        Ok(slides) => slides,
        Err(first) => {
            let cleaned = unescape(candidate);
            serde_json::from_str(&cleaned).map_err(|_| GenerationError::Parse {
                reason: first.to_string(),
            })?
        }
    };

    if slides.is_empty() {
        return Err(GenerationError::EmptyDeck);
    }
    Ok(slides)
}

fn outer_array(reply: &str) -> Option<&str> {
    let bytes = reply.as_bytes();
    let start = memchr::memchr(b'[', bytes)?;
    let end = memchr::memrchr(b']', bytes)?;
    (end > start).then(|| &reply[start..=end])
}

fn unescape(text: &str) -> String {
    text.replace("\\\"", "\"")
        .replace("\\n", " ")
        .replace("\\\\", "\\")
}

/// Keyword replies are used verbatim apart from surrounding whitespace.
pub fn clean_keywords(reply: &str) -> String {
    reply.trim().to_string()
}
