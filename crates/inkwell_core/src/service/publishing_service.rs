//! Reader-facing blog use-cases.
//!
//! # Invariants
//! - A draft is visible only to its author; everyone else gets `NotFound`.
//! - `show_drafts` is honoured only when listing the viewer's own blogs.

use crate::media::{BlobStore, MediaUpload, StoredBlob, BLOG_COVER_FOLDER, IMAGE_CONTENT_TYPES};
use crate::model::blog::{Blog, BlogId};
use crate::model::user::UserId;
use crate::repo::blog_repo::{BlogListQuery, BlogRepository};
use crate::repo::error::RepoError;
use crate::repo::BLOG_ENTITY;
use crate::service::ServiceResult;

pub struct PublishingService<'a, R: BlogRepository> {
    repo: R,
    blobs: &'a dyn BlobStore,
}

impl<'a, R: BlogRepository> PublishingService<'a, R> {
    pub fn new(repo: R, blobs: &'a dyn BlobStore) -> Self {
        Self { repo, blobs }
    }

    /// Reads one blog on behalf of `viewer`.
    ///
    /// Published blogs count the read as a view. Authors reading their own
    /// drafts do not.
    pub fn view_blog(&self, blog_id: BlogId, viewer: Option<UserId>) -> ServiceResult<Blog> {
        let blog = self.repo.get_blog_by_id(blog_id, false)?;
        if blog.is_draft {
            if viewer == Some(blog.author_id()) {
                return Ok(blog);
            }
            return Err(RepoError::not_found(BLOG_ENTITY, blog_id).into());
        }

        Ok(self.repo.get_blog_by_id(blog_id, true)?)
    }

    /// Lists blogs, dropping `show_drafts` unless the viewer is the author
    /// filtered on.
    pub fn list_blogs(
        &self,
        viewer: Option<UserId>,
        query: &BlogListQuery,
    ) -> ServiceResult<Vec<Blog>> {
        let own_listing = query.author_id.is_some() && query.author_id == viewer;
        let effective = BlogListQuery {
            show_drafts: query.show_drafts && own_listing,
            ..query.clone()
        };
        Ok(self.repo.get_blogs(&effective)?)
    }

    pub fn upload_cover(&self, upload: &MediaUpload) -> ServiceResult<StoredBlob> {
        Ok(self
            .blobs
            .store(upload, BLOG_COVER_FOLDER, IMAGE_CONTENT_TYPES)?)
    }
}
