//! URL slugs.

/// Maximum slug length, shared by posts and tags.
pub const SLUG_MAX_LEN: usize = 250;

/// Derive a slug from free text.
///
/// ASCII letters and digits are kept (lowercased); any run of other
/// characters becomes a single `-`. Leading and trailing hyphens are dropped
/// and the result is capped at [`SLUG_MAX_LEN`].
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }

        if slug.len() >= SLUG_MAX_LEN {
            break;
        }
    }

    slug.truncate(SLUG_MAX_LEN);
    slug.trim_end_matches('-').to_string()
}

/// A slug contains only letters, numbers, underscores or hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= SLUG_MAX_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_title() {
        assert_eq!(slugify("Who was Django Reinhardt?"), "who-was-django-reinhardt");
        assert_eq!(slugify("  Rust & SeaORM: a tour  "), "rust-seaorm-a-tour");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
    }

    #[test]
    fn test_slugify_drops_non_ascii() {
        assert_eq!(slugify("Café au lait"), "caf-au-lait");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_caps_length() {
        let long = "word ".repeat(100);
        let slug = slugify(&long);
        assert!(slug.len() <= SLUG_MAX_LEN);
        assert!(!slug.ends_with('-'));
        assert!(is_valid_slug(&slug));
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("hello-world_2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("hello world"));
        assert!(!is_valid_slug("héllo"));
        assert!(!is_valid_slug(&"a".repeat(SLUG_MAX_LEN + 1)));
    }
}
