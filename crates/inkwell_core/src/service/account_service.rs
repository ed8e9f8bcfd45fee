//! Account use-cases: registration, login and profile maintenance.
//!
//! # Invariants
//! - Unknown username and wrong password fail identically.
//! - Token subjects are login usernames.

use crate::auth::{AuthError, CredentialHasher, TokenIssuer};
use crate::media::{BlobStore, MediaUpload, AVATAR_FOLDER, IMAGE_CONTENT_TYPES};
use crate::model::user::{NewUser, User, UserId, UserUpdate};
use crate::repo::error::RepoError;
use crate::repo::user_repo::UserRepository;
use crate::service::{ServiceError, ServiceResult};
use log::{info, warn};

pub struct AccountService<'a, R: UserRepository> {
    repo: R,
    hasher: &'a dyn CredentialHasher,
    tokens: &'a dyn TokenIssuer,
    blobs: &'a dyn BlobStore,
}

impl<'a, R: UserRepository> AccountService<'a, R> {
    pub fn new(
        repo: R,
        hasher: &'a dyn CredentialHasher,
        tokens: &'a dyn TokenIssuer,
        blobs: &'a dyn BlobStore,
    ) -> Self {
        Self {
            repo,
            hasher,
            tokens,
            blobs,
        }
    }

    /// Registers a new user.
    ///
    /// # Errors
    /// - `Repo(Conflict)` when the username or display name is taken.
    /// - `Repo(Validation)` for empty or over-long fields.
    pub fn register(&self, name: &str, username: &str, password: &str) -> ServiceResult<User> {
        match self.repo.get_account_by_username(username) {
            Ok(_) => {
                return Err(RepoError::Conflict(format!(
                    "username `{username}` is already registered"
                ))
                .into())
            }
            Err(RepoError::NotFound { .. }) => {}
            Err(err) => return Err(err.into()),
        }

        let user = self
            .repo
            .create_user(&NewUser::new(name, username, password), self.hasher)?;
        info!(
            "event=account_register module=service status=ok user_id={}",
            user.id
        );
        Ok(user)
    }

    /// Checks a username/password pair and returns the matching user.
    pub fn authenticate(&self, username: &str, password: &str) -> ServiceResult<User> {
        let account = match self.repo.get_account_by_username(username) {
            Ok(account) => account,
            Err(RepoError::NotFound { .. }) => return Err(rejected_login()),
            Err(err) => return Err(err.into()),
        };
        if !self.hasher.verify(password, &account.password_hash) {
            return Err(rejected_login());
        }

        Ok(self.repo.get_user_by_id(account.user_id)?)
    }

    /// Authenticates and issues a bearer token for the user.
    pub fn login(&self, username: &str, password: &str) -> ServiceResult<String> {
        let user = self.authenticate(username, password)?;
        let token = self.tokens.issue(&user.username)?;
        info!(
            "event=account_login module=service status=ok user_id={}",
            user.id
        );
        Ok(token)
    }

    /// Resolves the user a bearer token was issued to.
    pub fn current_user(&self, token: &str) -> ServiceResult<User> {
        let claims = self.tokens.validate(token)?;
        match self.repo.get_user_by_username(&claims.sub) {
            Ok(user) => Ok(user),
            Err(RepoError::NotFound { .. }) => Err(AuthError::InvalidToken(
                "token subject no longer exists".to_string(),
            )
            .into()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn update_profile(&self, user_id: UserId, update: &UserUpdate) -> ServiceResult<User> {
        Ok(self.repo.update_user(user_id, update)?)
    }

    /// Stores an image upload and makes it the user's avatar.
    pub fn upload_avatar(&self, user_id: UserId, upload: &MediaUpload) -> ServiceResult<User> {
        let stored = self
            .blobs
            .store(upload, AVATAR_FOLDER, IMAGE_CONTENT_TYPES)?;
        Ok(self.repo.update_user_avatar(user_id, &stored.public_url)?)
    }
}

fn rejected_login() -> ServiceError {
    warn!("event=account_login module=service status=rejected");
    AuthError::InvalidCredentials.into()
}
