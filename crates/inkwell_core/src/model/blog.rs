//! Blog post models.
//!
//! # Invariants
//! - `author` is fixed at creation; updates never change it.
//! - `view_count` and `like_count` only change through dedicated increments.
//! - Drafts (`is_draft == true`) are hidden from public read paths.

use crate::model::id::EntityId;
use crate::model::taxonomy::{Category, CategoryId, Tag, TagId};
use crate::model::user::{User, UserId};
use serde::{Deserialize, Serialize};

pub type BlogId = EntityId;

/// Blog read model with author, tags and categories eagerly loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blog {
    pub id: BlogId,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub cover_image_url: Option<String>,
    pub is_draft: bool,
    pub view_count: i64,
    pub like_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub author: User,
    /// Sorted by name.
    pub tags: Vec<Tag>,
    /// Sorted by name.
    pub categories: Vec<Category>,
}

impl Blog {
    pub fn author_id(&self) -> UserId {
        self.author.id
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|tag| tag.name.as_str()).collect()
    }
}

/// Input for `BlogRepository::create_blog`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBlog {
    pub id: Option<BlogId>,
    pub author_id: UserId,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub cover_image_url: Option<String>,
    /// Defaults to `true`.
    pub is_draft: bool,
    /// Unknown ids are ignored.
    pub tag_ids: Vec<TagId>,
    /// Unknown ids are ignored.
    pub category_ids: Vec<CategoryId>,
}

impl NewBlog {
    /// Creates a draft with no summary, cover or associations.
    pub fn new(author_id: UserId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            author_id,
            title: title.into(),
            content: content.into(),
            summary: None,
            cover_image_url: None,
            is_draft: true,
            tag_ids: Vec::new(),
            category_ids: Vec::new(),
        }
    }

    pub fn published(mut self) -> Self {
        self.is_draft = false;
        self
    }
}

/// Allow-listed blog fields an author may change.
///
/// For nullable columns the outer `Option` means "supplied" and the inner one
/// is the new value, so `Some(None)` clears the column. `tag_ids` and
/// `category_ids` replace the whole association set when `Some`, including
/// `Some(vec![])`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<Option<String>>,
    pub cover_image_url: Option<Option<String>>,
    pub is_draft: Option<bool>,
    pub tag_ids: Option<Vec<TagId>>,
    pub category_ids: Option<Vec<CategoryId>>,
}

impl BlogUpdate {
    /// Returns whether any column of the `blogs` row is touched.
    pub fn touches_row(&self) -> bool {
        self.title.is_some()
            || self.content.is_some()
            || self.summary.is_some()
            || self.cover_image_url.is_some()
            || self.is_draft.is_some()
    }
}
