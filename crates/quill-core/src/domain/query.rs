//! Post listing queries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::post::{Post, PostStatus};

/// Which slice of the post table a query starts from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostScope {
    /// Every post, drafts included.
    #[default]
    All,
    /// Only posts with status `published`.
    Published,
}

impl PostScope {
    pub fn admits(&self, post: &Post) -> bool {
        match self {
            PostScope::All => true,
            PostScope::Published => post.is_published(),
        }
    }
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

impl Pagination {
    pub const DEFAULT_PER_PAGE: u64 = 3;

    /// Largest offset a page may start at. SQL `OFFSET`/`LIMIT` are signed 64-bit.
    pub const MAX_OFFSET: u64 = i64::MAX as u64;

    /// Out-of-range values are clamped: at least page 1 with one item per
    /// page, and never a page whose offset exceeds [`Self::MAX_OFFSET`].
    pub fn new(page: u64, per_page: u64) -> Self {
        let per_page = per_page.clamp(1, Self::MAX_OFFSET);
        let last_page = Self::MAX_OFFSET / per_page + 1;
        Self {
            page: page.clamp(1, last_page),
            per_page,
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PER_PAGE)
    }
}

/// One page of results plus the total count across all pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
        }
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.per_page.max(1))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Filters for listing posts. Results always come back in default order.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub scope: PostScope,
    pub status: Option<PostStatus>,
    pub author_id: Option<Uuid>,
    pub tag: Option<String>,
    /// Case-insensitive substring of title or body.
    pub search: Option<String>,
    /// `None` returns every match.
    pub pagination: Option<Pagination>,
}

impl PostQuery {
    /// Published posts only, in default order.
    pub fn published() -> Self {
        Self {
            scope: PostScope::Published,
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Whether `post` passes every filter.
    pub fn matches(&self, post: &Post) -> bool {
        if !self.scope.admits(post) {
            return false;
        }
        if self.status.is_some_and(|s| s != post.status) {
            return false;
        }
        if self.author_id.is_some_and(|a| a != post.author_id) {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !post.has_tag(tag) {
                return false;
            }
        }
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            if !post.title.to_lowercase().contains(&term)
                && !post.body.to_lowercase().contains(&term)
            {
                return false;
            }
        }
        true
    }
}
