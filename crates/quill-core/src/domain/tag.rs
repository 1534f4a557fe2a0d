use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::slug::slugify;

/// Maximum tag name length in characters.
pub const TAG_MAX_LEN: usize = 100;

/// Tag entity - a free-form label shared between posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl Tag {
    /// Create a tag, deriving its slug from the name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let slug = slugify(&name);
        Self {
            id: Uuid::new_v4(),
            name,
            slug,
        }
    }
}

/// Normalize a list of tag names: trim, drop blanks, dedupe keeping the
/// first occurrence.
pub fn normalize_tags<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags: Vec<String> = Vec::new();
    for name in names {
        let name = name.as_ref().trim();
        if !name.is_empty() && !tags.iter().any(|t| t == name) {
            tags.push(name.to_string());
        }
    }
    tags
}

pub fn is_valid_tag(name: &str) -> bool {
    !name.is_empty() && name.chars().count() <= TAG_MAX_LEN
}

/// Parse a comma separated tag list, e.g. `"rust, web,rust"`.
pub fn parse_tags(input: &str) -> Vec<String> {
    normalize_tags(input.split(','))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags("music, jazz,,music , "), vec!["music", "jazz"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn test_tag_length_limit() {
        assert!(is_valid_tag(&"t".repeat(TAG_MAX_LEN)));
        assert!(!is_valid_tag(&"t".repeat(TAG_MAX_LEN + 1)));
        assert!(!is_valid_tag(""));
    }

    #[test]
    fn test_tag_slug() {
        let tag = Tag::new("Gypsy Jazz");
        assert_eq!(tag.slug, "gypsy-jazz");
    }
}
