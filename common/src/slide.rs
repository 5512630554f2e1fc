use serde::{Deserialize, Serialize};

/// One generated slide.
///
/// The model returns `title`/`content` pairs; `imageUrl` is only set once the
/// user picks an image for the slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    pub content: String,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Slide {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            image_url: None,
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn set_image_url(&mut self, url: impl Into<String>) {
        self.image_url = Some(url.into());
    }

    /// Text handed to the keyword prompt when searching for an illustration.
    pub fn search_text(&self) -> String {
        format!("{}\n{}", self.title, self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    pub id: String,
    pub thumbnail_url: String,
    pub full_url: String,
    pub alt_text: Option<String>,
    pub author: Option<String>,
}

/// Pagination state for one keyword search, owned by whoever started it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCursor {
    pub keywords: String,
    pub page: u32,
    pub total_pages: u32,
    pub page_size: u32,
}

impl SearchCursor {
    pub fn new(keywords: impl Into<String>, page_size: u32) -> Self {
        Self {
            keywords: keywords.into(),
            page: 1,
            total_pages: 1,
            page_size,
        }
    }

    /// Page that follows the current one, wrapping back to 1 after the last.
    pub fn next_page(&self) -> u32 {
        if self.page < self.total_pages {
            self.page + 1
        } else {
            1
        }
    }

    pub fn update(&mut self, page: u32, total_pages: u32) {
        self.page = page;
        self.total_pages = total_pages;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_json_field_names() {
        let slide: Slide =
            serde_json::from_str(r#"{"title":"Intro","content":"Welcome"}"#).unwrap();
        assert_eq!(slide, Slide::new("Intro", "Welcome"));

        let json = serde_json::to_value(slide.with_image("https://img/1.jpg")).unwrap();
        assert_eq!(json["imageUrl"], "https://img/1.jpg");
    }

    #[test]
    fn test_cursor_wraps_after_last_page() {
        let mut cursor = SearchCursor::new("mer, plage", 4);
        cursor.update(1, 3);
        assert_eq!(cursor.next_page(), 2);
        cursor.update(3, 3);
        assert_eq!(cursor.next_page(), 1);
    }

    #[test]
    fn test_cursor_without_results_stays_on_first_page() {
        let mut cursor = SearchCursor::new("nothing", 4);
        cursor.update(1, 0);
        assert_eq!(cursor.next_page(), 1);
    }
}
