//! Demo data for fresh databases.

use crate::auth::CredentialHasher;
use crate::model::blog::NewBlog;
use crate::model::user::NewUser;
use crate::repo::blog_repo::{BlogRepository, SqliteBlogRepository};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use log::info;
use rusqlite::Connection;

pub const TEST_USERNAME: &str = "test-username";
pub const TEST_PASSWORD: &str = "test-password";
pub const ADMIN_USERNAME: &str = "admin-username";
pub const ADMIN_PASSWORD: &str = "admin-password";

/// Counts of rows created by `seed_demo_data`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: usize,
    pub blogs_created: usize,
}

/// Creates a test user, an admin user and one draft blog by the test user.
///
/// Does nothing when the test user already exists.
pub fn seed_demo_data(conn: &Connection, hasher: &dyn CredentialHasher) -> RepoResult<SeedReport> {
    let users = SqliteUserRepository::try_new(conn)?;
    match users.get_account_by_username(TEST_USERNAME) {
        Ok(_) => {
            info!("event=seed module=seed status=skipped reason=already_seeded");
            return Ok(SeedReport::default());
        }
        Err(RepoError::NotFound { .. }) => {}
        Err(err) => return Err(err),
    }

    let test_user = users.create_user(
        &NewUser::new("測試使用者", TEST_USERNAME, TEST_PASSWORD),
        hasher,
    )?;
    users.create_user(
        &NewUser::new("管理員", ADMIN_USERNAME, ADMIN_PASSWORD),
        hasher,
    )?;

    let blogs = SqliteBlogRepository::try_new(conn)?;
    blogs.create_blog(&NewBlog::new(test_user.id, "測試1", "這是測試1的內容"))?;

    let report = SeedReport {
        users_created: 2,
        blogs_created: 1,
    };
    info!(
        "event=seed module=seed status=ok users_created={} blogs_created={}",
        report.users_created, report.blogs_created
    );
    Ok(report)
}
