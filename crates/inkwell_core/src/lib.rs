//! Core data-access and authorization layer for the Inkwell blog backend.
//! This crate is the single source of truth for business invariants.

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod media;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;

pub use auth::{
    AuthError, BcryptCredentialHasher, Claims, CredentialHasher, JwtTokenIssuer, TokenIssuer,
};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use media::{BlobStore, LocalBlobStore, MediaError, MediaUpload, StoredBlob};
pub use model::blog::{Blog, BlogId, BlogUpdate, NewBlog};
pub use model::comment::{Comment, CommentId, NewComment};
pub use model::taxonomy::{Category, CategoryId, CategoryUpdate, Tag, TagId};
pub use model::user::{Account, NewUser, User, UserId, UserUpdate};
pub use repo::blog_repo::{BlogListQuery, BlogRepository, SqliteBlogRepository};
pub use repo::comment_repo::{CommentRepository, SqliteCommentRepository};
pub use repo::error::{RepoError, RepoResult};
pub use repo::taxonomy_repo::{SqliteTaxonomyRepository, TaxonomyRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use service::account_service::AccountService;
pub use service::publishing_service::PublishingService;
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
