use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::next_timestamp;
use super::slug::{SLUG_MAX_LEN, is_valid_slug, slugify};
use super::tag::{TAG_MAX_LEN, is_valid_tag, normalize_tags};
use crate::error::DomainError;

/// Maximum title length in characters.
pub const TITLE_MAX_LEN: usize = 250;

/// Publication status of a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(DomainError::validation(format!(
                "Unknown post status '{other}'"
            ))),
        }
    }
}

/// Post entity - a blog article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub publish: DateTime<Utc>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub status: PostStatus,
    pub tags: Vec<String>,
}

/// Input for creating a post.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub author_id: Uuid,
    pub title: String,
    /// Derived from the title when absent.
    pub slug: Option<String>,
    pub body: String,
    /// Defaults to now.
    pub publish: Option<DateTime<Utc>>,
    pub status: PostStatus,
    pub tags: Vec<String>,
}

/// Partial update of a post. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub publish: Option<DateTime<Utc>>,
    pub status: Option<PostStatus>,
    pub tags: Option<Vec<String>>,
}

impl Post {
    /// Create a validated post.
    pub fn new(new: NewPost) -> Result<Self, DomainError> {
        let now = Utc::now();
        let slug = new.slug.unwrap_or_else(|| slugify(&new.title));
        let post = Self {
            id: Uuid::new_v4(),
            author_id: new.author_id,
            title: new.title.trim().to_string(),
            slug,
            body: new.body,
            publish: new.publish.unwrap_or(now),
            created: now,
            updated: now,
            status: new.status,
            tags: normalize_tags(new.tags),
        };
        post.validate()?;
        Ok(post)
    }

    /// Check field constraints.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.is_empty() {
            return Err(DomainError::validation("Title is required"));
        }
        if self.title.chars().count() > TITLE_MAX_LEN {
            return Err(DomainError::validation(format!(
                "Title must be at most {TITLE_MAX_LEN} characters"
            )));
        }
        if !is_valid_slug(&self.slug) {
            return Err(DomainError::validation(format!(
                "Slug must be 1-{SLUG_MAX_LEN} letters, numbers, underscores or hyphens"
            )));
        }
        if self.body.trim().is_empty() {
            return Err(DomainError::validation("Body is required"));
        }
        if let Some(tag) = self.tags.iter().find(|t| !is_valid_tag(t)) {
            return Err(DomainError::validation(format!(
                "Tag '{tag}' must be 1-{TAG_MAX_LEN} characters"
            )));
        }
        Ok(())
    }

    /// Apply a partial update and refresh `updated`. `created` is never touched.
    pub fn apply(&mut self, changes: PostChanges) -> Result<(), DomainError> {
        let mut next = self.clone();
        if let Some(title) = changes.title {
            next.title = title.trim().to_string();
        }
        if let Some(slug) = changes.slug {
            next.slug = slug;
        }
        if let Some(body) = changes.body {
            next.body = body;
        }
        if let Some(publish) = changes.publish {
            next.publish = publish;
        }
        if let Some(status) = changes.status {
            next.status = status;
        }
        if let Some(tags) = changes.tags {
            next.tags = normalize_tags(tags);
        }
        next.validate()?;
        next.touch();
        *self = next;
        Ok(())
    }

    pub fn set_status(&mut self, status: PostStatus) {
        self.status = status;
        self.touch();
    }

    /// Mark the post published.
    pub fn publish_now(&mut self) {
        self.set_status(PostStatus::Published);
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Calendar date the slug is unique for.
    pub fn publish_date(&self) -> NaiveDate {
        self.publish.date_naive()
    }

    /// True when both posts claim the same slug on the same publish date.
    pub fn conflicts_with(&self, other: &Post) -> bool {
        self.id != other.id
            && self.slug == other.slug
            && self.publish_date() == other.publish_date()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Canonical path, `/blog/{year}/{month}/{day}/{slug}/`.
    pub fn absolute_url(&self) -> String {
        post_url(self.publish_date(), &self.slug)
    }

    pub fn touch(&mut self) {
        self.updated = next_timestamp(self.updated);
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Build the canonical path for a publish date and slug.
///
/// The `/blog/...` path belongs to the public site that renders posts; the
/// API resolves the same date and slug at `/api/posts/{year}/{month}/{day}/{slug}`.
pub fn post_url(date: NaiveDate, slug: &str) -> String {
    format!(
        "/blog/{}/{}/{}/{}/",
        date.year(),
        date.month(),
        date.day(),
        slug
    )
}

/// Default post ordering: newest `publish` first.
pub fn default_post_order(a: &Post, b: &Post) -> Ordering {
    b.publish.cmp(&a.publish).then_with(|| a.id.cmp(&b.id))
}

/// Rank candidates by number of tags shared with `post`, then by recency.
/// Drafts, the post itself and posts sharing no tag are dropped.
pub fn rank_similar(post: &Post, candidates: Vec<Post>, limit: usize) -> Vec<Post> {
    let mut scored: Vec<(usize, Post)> = candidates
        .into_iter()
        .filter(|c| c.id != post.id && c.is_published())
        .filter_map(|c| {
            let shared = c.tags.iter().filter(|t| post.has_tag(t)).count();
            (shared > 0).then_some((shared, c))
        })
        .collect();

    scored.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| default_post_order(a, b)));
    scored.into_iter().take(limit).map(|(_, p)| p).collect()
}
