//! Domain entities - the core business objects.

mod comment;
mod post;
mod query;
mod slug;
mod tag;
mod user;

use chrono::{DateTime, Duration, Utc};

pub use comment::{
    Comment, EMAIL_MAX_LEN, NAME_MAX_LEN, default_comment_order, is_valid_email,
};
pub use post::{
    NewPost, Post, PostChanges, PostStatus, TITLE_MAX_LEN, default_post_order, post_url,
    rank_similar,
};
pub use query::{Page, Pagination, PostQuery, PostScope};
pub use slug::{SLUG_MAX_LEN, is_valid_slug, slugify};
pub use tag::{TAG_MAX_LEN, Tag, is_valid_tag, normalize_tags, parse_tags};
pub use user::{USERNAME_MAX_LEN, User};

/// Next value for an `updated` column: now, but always strictly after the
/// previous value so modification times never go backwards.
pub fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous + Duration::microseconds(1))
}
