//! Comment models.
//!
//! # Invariants
//! - A comment without `parent_id` is top-level.
//! - A reply belongs to the same blog as its parent.
//! - Parent links form a forest; deleting a comment removes its subtree.

use crate::model::blog::BlogId;
use crate::model::id::EntityId;
use crate::model::user::{User, UserId};
use serde::{Deserialize, Serialize};

pub type CommentId = EntityId;

/// Comment read model with its author and, for listings, its reply tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub blog_id: BlogId,
    pub parent_id: Option<CommentId>,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub author: User,
    /// Oldest first. Empty unless loaded through a thread listing.
    pub replies: Vec<Comment>,
}

impl Comment {
    /// Counts this comment and every nested reply.
    pub fn thread_size(&self) -> usize {
        1 + self.replies.iter().map(Comment::thread_size).sum::<usize>()
    }
}

/// Input for `CommentRepository::create_comment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub id: Option<CommentId>,
    pub user_id: UserId,
    pub blog_id: BlogId,
    pub content: String,
    pub parent_id: Option<CommentId>,
}

impl NewComment {
    pub fn new(user_id: UserId, blog_id: BlogId, content: impl Into<String>) -> Self {
        Self {
            id: None,
            user_id,
            blog_id,
            content: content.into(),
            parent_id: None,
        }
    }

    pub fn reply_to(mut self, parent_id: CommentId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}
