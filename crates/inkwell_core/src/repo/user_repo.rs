//! User/account repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist a User together with its single Account.
//! - Resolve users by id or login username for the identity layer.
//!
//! # Invariants
//! - A User row never persists without its Account row.
//! - Passwords reach storage only as `CredentialHasher` output.

use crate::auth::CredentialHasher;
use crate::model::id::{id_or_new, new_id};
use crate::model::user::{Account, NewUser, User, UserId, UserUpdate};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::unit_of_work::{require_found, with_unit_of_work, AccessMode};
use crate::repo::{
    ensure_schema_ready, parse_uuid, validate_optional, validate_required, USER_ENTITY,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(crate) const NAME_MAX_CHARS: usize = 16;
pub(crate) const USERNAME_MAX_CHARS: usize = 16;
pub(crate) const URL_MAX_CHARS: usize = 512;

/// Column list for a user joined with its account (`u`, `a` aliases).
pub(crate) const USER_COLUMNS: &str = "u.id AS user_id,
                u.name AS user_name,
                a.username AS username,
                u.bio AS user_bio,
                u.avatar_url AS user_avatar_url,
                u.created_at AS user_created_at,
                u.updated_at AS user_updated_at";

/// Repository interface for users and their login accounts.
pub trait UserRepository {
    /// Creates a user and its account in one unit of work.
    fn create_user(&self, new_user: &NewUser, hasher: &dyn CredentialHasher) -> RepoResult<User>;
    fn get_user_by_id(&self, id: UserId) -> RepoResult<User>;
    fn get_user_by_username(&self, username: &str) -> RepoResult<User>;
    /// Loads the credential record used by authentication.
    fn get_account_by_username(&self, username: &str) -> RepoResult<Account>;
    /// Applies only the supplied fields.
    fn update_user(&self, id: UserId, update: &UserUpdate) -> RepoResult<User>;
    fn update_user_avatar(&self, id: UserId, avatar_url: &str) -> RepoResult<User>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, new_user: &NewUser, hasher: &dyn CredentialHasher) -> RepoResult<User> {
        validate_required("name", &new_user.name, NAME_MAX_CHARS)?;
        validate_required("username", &new_user.username, USERNAME_MAX_CHARS)?;
        if new_user.password.is_empty() {
            return Err(RepoError::Validation("password cannot be empty".to_string()));
        }

        let user_id = id_or_new(new_user.id);
        let password_hash = hasher
            .hash(&new_user.password)
            .map_err(|err| RepoError::Internal(err.to_string()))?;
        with_unit_of_work(self.conn, "user_create", AccessMode::Write, |tx| {
            tx.execute(
                "INSERT INTO users (id, name) VALUES (?1, ?2);",
                params![user_id.to_string(), new_user.name],
            )?;
            tx.execute(
                "INSERT INTO accounts (id, user_id, username, password_hash)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    new_id().to_string(),
                    user_id.to_string(),
                    new_user.username,
                    password_hash
                ],
            )?;
            require_found(USER_ENTITY, user_id, || load_user_by_id(tx, user_id))
        })
    }

    fn get_user_by_id(&self, id: UserId) -> RepoResult<User> {
        with_unit_of_work(self.conn, "user_get", AccessMode::Read, |tx| {
            require_found(USER_ENTITY, id, || load_user_by_id(tx, id))
        })
    }

    fn get_user_by_username(&self, username: &str) -> RepoResult<User> {
        with_unit_of_work(self.conn, "user_get_by_username", AccessMode::Read, |tx| {
            require_found(USER_ENTITY, username, || {
                load_user_where(tx, "a.username = ?1", username)
            })
        })
    }

    fn get_account_by_username(&self, username: &str) -> RepoResult<Account> {
        with_unit_of_work(self.conn, "account_get", AccessMode::Read, |tx| {
            require_found("Account", username, || load_account(tx, username))
        })
    }

    fn update_user(&self, id: UserId, update: &UserUpdate) -> RepoResult<User> {
        if let Some(name) = update.name.as_deref() {
            validate_required("name", name, NAME_MAX_CHARS)?;
        }

        with_unit_of_work(self.conn, "user_update", AccessMode::Write, |tx| {
            let changed = tx.execute(
                "UPDATE users
                 SET
                    name = COALESCE(?2, name),
                    bio = COALESCE(?3, bio),
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![id.to_string(), update.name, update.bio],
            )?;
            if changed == 0 {
                return Err(RepoError::not_found(USER_ENTITY, id));
            }
            require_found(USER_ENTITY, id, || load_user_by_id(tx, id))
        })
    }

    fn update_user_avatar(&self, id: UserId, avatar_url: &str) -> RepoResult<User> {
        validate_optional("avatar_url", Some(avatar_url), URL_MAX_CHARS)?;

        with_unit_of_work(self.conn, "user_update_avatar", AccessMode::Write, |tx| {
            let changed = tx.execute(
                "UPDATE users
                 SET avatar_url = ?2, updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![id.to_string(), avatar_url],
            )?;
            if changed == 0 {
                return Err(RepoError::not_found(USER_ENTITY, id));
            }
            require_found(USER_ENTITY, id, || load_user_by_id(tx, id))
        })
    }
}

fn load_account(conn: &Connection, username: &str) -> RepoResult<Option<Account>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, username, password_hash
         FROM accounts
         WHERE username = ?1;",
    )?;
    let mut rows = stmt.query([username])?;
    if let Some(row) = rows.next()? {
        let id: String = row.get("id")?;
        let user_id: String = row.get("user_id")?;
        return Ok(Some(Account {
            id: parse_uuid(&id, "accounts.id")?,
            user_id: parse_uuid(&user_id, "accounts.user_id")?,
            username: row.get("username")?,
            password_hash: row.get("password_hash")?,
        }));
    }

    Ok(None)
}

/// Loads one user (with login username) by id.
pub(crate) fn load_user_by_id(conn: &Connection, id: UserId) -> RepoResult<Option<User>> {
    load_user_where(conn, "u.id = ?1", &id.to_string())
}

fn load_user_where(conn: &Connection, predicate: &str, value: &str) -> RepoResult<Option<User>> {
    let sql = format!(
        "SELECT {USER_COLUMNS}
         FROM users u
         INNER JOIN accounts a ON a.user_id = u.id
         WHERE {predicate};"
    );
    let user = conn
        .query_row(&sql, [value], |row| Ok(parse_user_row(row)))
        .optional()?;
    user.transpose()
}

/// Parses the `USER_COLUMNS` projection of a row.
pub(crate) fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id: String = row.get("user_id")?;
    Ok(User {
        id: parse_uuid(&id, "users.id")?,
        name: row.get("user_name")?,
        username: row.get("username")?,
        bio: row.get("user_bio")?,
        avatar_url: row.get("user_avatar_url")?,
        created_at: row.get("user_created_at")?,
        updated_at: row.get("user_updated_at")?,
    })
}
