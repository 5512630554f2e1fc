pub const MIN_SLIDES: usize = 3;
pub const MAX_SLIDES: usize = 10;

pub fn deck_prompt(topic: &str, language: &str) -> String {
    format!(
        "Create a PowerPoint presentation on the following topic: [{topic}]. \
         Write it in the language with code \"{language}\". \
         Your reply must be raw text holding a JSON array of objects with \"title\" and \"content\" \
         fields, without any other formatting characters. \
         The presentation must contain at least {MIN_SLIDES} and at most {MAX_SLIDES} slides. \
         The first slide must carry the presentation title and a subtitle."
    )
}

pub fn keywords_prompt(slide_text: &str, language: &str) -> String {
    format!(
        "Analyse the following PowerPoint slide content and produce at most 3 relevant keywords \
         in the language with code \"{language}\" that could be used to search for an image \
         illustrating it. Reply only with the keywords separated by commas, with no sentences \
         or explanations.\n\nSlide content:\n{slide_text}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_prompt_embeds_topic_and_bounds() {
        let prompt = deck_prompt("Rust ownership", "fr");
        assert!(prompt.contains("[Rust ownership]"));
        assert!(prompt.contains("\"fr\""));
        assert!(prompt.contains("at least 3"));
        assert!(prompt.contains("at most 10"));
    }

    #[test]
    fn test_keywords_prompt_embeds_content() {
        let prompt = keywords_prompt("Intro\nWelcome", "en");
        assert!(prompt.ends_with("Slide content:\nIntro\nWelcome"));
    }
}
