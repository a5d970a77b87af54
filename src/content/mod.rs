pub mod hash;
pub mod inline;
pub mod records;
pub mod storage;

pub use hash::{compute_hash, short_hash};
pub use records::ImageAssetRecord;
pub use storage::ContentStore;

use serde::{Deserialize, Serialize};

/// Classification of an upload; affects storage destination and naming only,
/// never processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    Cat,
    Article,
}

impl ContentCategory {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "cat" | "cats" => Some(ContentCategory::Cat),
            "article" | "articles" => Some(ContentCategory::Article),
            _ => None,
        }
    }

    pub fn dir(self) -> &'static str {
        match self {
            ContentCategory::Cat => storage::CATS_DIR,
            ContentCategory::Article => storage::ARTICLES_DIR,
        }
    }

    pub fn default_prefix(self) -> &'static str {
        match self {
            ContentCategory::Cat => "cat",
            ContentCategory::Article => "article",
        }
    }
}

pub fn extension_from_mime_type(mime_type: &str) -> Option<&'static str> {
    match mime_type.to_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parsing() {
        assert_eq!(ContentCategory::parse("cat"), Some(ContentCategory::Cat));
        assert_eq!(
            ContentCategory::parse(" Articles "),
            Some(ContentCategory::Article)
        );
        assert_eq!(ContentCategory::parse("dog"), None);
    }

    #[test]
    fn mime_mapping() {
        assert_eq!(extension_from_mime_type("image/JPEG"), Some("jpg"));
        assert_eq!(extension_from_mime_type("image/svg+xml"), None);
    }
}
