use inkwell_core::db::open_db_in_memory;
use inkwell_core::{
    AccountService, JwtTokenIssuer, LocalBlobStore, MediaError, MediaUpload, RepoError,
    ServiceError, BcryptCredentialHasher, SqliteUserRepository, TokenIssuer, UserUpdate,
};
use std::time::Duration;

const SECRET: &[u8] = b"test-secret";

struct Collaborators {
    hasher: BcryptCredentialHasher,
    tokens: JwtTokenIssuer,
    blobs: LocalBlobStore,
    _media_dir: tempfile::TempDir,
}

fn collaborators() -> Collaborators {
    let media_dir = tempfile::tempdir().unwrap();
    Collaborators {
        hasher: BcryptCredentialHasher::with_cost(4),
        tokens: JwtTokenIssuer::new(SECRET, Duration::from_secs(30 * 60)),
        blobs: LocalBlobStore::new(media_dir.path(), "https://cdn.example.com/media"),
        _media_dir: media_dir,
    }
}

#[test]
fn register_then_login_yields_token_for_current_user() {
    let conn = open_db_in_memory().unwrap();
    let deps = collaborators();
    let service = AccountService::new(
        SqliteUserRepository::try_new(&conn).unwrap(),
        &deps.hasher,
        &deps.tokens,
        &deps.blobs,
    );

    let registered = service.register("alice", "alice1", "pw1").unwrap();
    let token = service.login("alice1", "pw1").unwrap();
    assert_eq!(deps.tokens.validate(&token).unwrap().sub, "alice1");

    let current = service.current_user(&token).unwrap();
    assert_eq!(current, registered);
}

#[test]
fn registering_a_taken_username_conflicts() {
    let conn = open_db_in_memory().unwrap();
    let deps = collaborators();
    let service = AccountService::new(
        SqliteUserRepository::try_new(&conn).unwrap(),
        &deps.hasher,
        &deps.tokens,
        &deps.blobs,
    );
    service.register("alice", "alice1", "pw1").unwrap();

    let err = service.register("other", "alice1", "pw2").unwrap_err();
    assert!(matches!(err, ServiceError::Repo(RepoError::Conflict(_))));
    assert_eq!(err.status_code(), 409);
}

#[test]
fn wrong_password_and_unknown_user_fail_the_same_way() {
    let conn = open_db_in_memory().unwrap();
    let deps = collaborators();
    let service = AccountService::new(
        SqliteUserRepository::try_new(&conn).unwrap(),
        &deps.hasher,
        &deps.tokens,
        &deps.blobs,
    );
    service.register("alice", "alice1", "pw1").unwrap();

    let wrong_password = service.login("alice1", "nope").unwrap_err();
    let unknown_user = service.login("ghost", "pw1").unwrap_err();
    assert_eq!(wrong_password.status_code(), 401);
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    assert!(matches!(unknown_user, ServiceError::Unauthenticated(_)));
}

#[test]
fn invalid_or_foreign_tokens_are_unauthenticated() {
    let conn = open_db_in_memory().unwrap();
    let deps = collaborators();
    let service = AccountService::new(
        SqliteUserRepository::try_new(&conn).unwrap(),
        &deps.hasher,
        &deps.tokens,
        &deps.blobs,
    );

    assert!(matches!(
        service.current_user("garbage"),
        Err(ServiceError::Unauthenticated(_))
    ));

    let other_issuer = JwtTokenIssuer::new(b"another-secret", Duration::from_secs(60));
    let foreign = other_issuer.issue("alice1").unwrap();
    assert!(matches!(
        service.current_user(&foreign),
        Err(ServiceError::Unauthenticated(_))
    ));

    // Well-formed token whose subject has no account.
    let orphan = deps.tokens.issue("ghost").unwrap();
    assert_eq!(service.current_user(&orphan).unwrap_err().status_code(), 401);
}

#[test]
fn update_profile_changes_bio() {
    let conn = open_db_in_memory().unwrap();
    let deps = collaborators();
    let service = AccountService::new(
        SqliteUserRepository::try_new(&conn).unwrap(),
        &deps.hasher,
        &deps.tokens,
        &deps.blobs,
    );
    let user = service.register("alice", "alice1", "pw1").unwrap();

    let updated = service
        .update_profile(
            user.id,
            &UserUpdate {
                bio: Some("hello".to_string()),
                ..UserUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.bio.as_deref(), Some("hello"));
}

#[test]
fn upload_avatar_stores_image_and_sets_public_url() {
    let conn = open_db_in_memory().unwrap();
    let deps = collaborators();
    let service = AccountService::new(
        SqliteUserRepository::try_new(&conn).unwrap(),
        &deps.hasher,
        &deps.tokens,
        &deps.blobs,
    );
    let user = service.register("alice", "alice1", "pw1").unwrap();

    let updated = service
        .upload_avatar(
            user.id,
            &MediaUpload::new("me.PNG", "image/png", b"\x89PNG".to_vec()),
        )
        .unwrap();
    let url = updated.avatar_url.unwrap();
    assert!(url.starts_with("https://cdn.example.com/media/avatars/"));
    assert!(url.ends_with(".png"));

    let key = url.trim_start_matches("https://cdn.example.com/media/");
    let stored = std::fs::read(deps.blobs.root().join(key)).unwrap();
    assert_eq!(stored, b"\x89PNG");
}

#[test]
fn upload_avatar_rejects_non_images_without_touching_user() {
    let conn = open_db_in_memory().unwrap();
    let deps = collaborators();
    let service = AccountService::new(
        SqliteUserRepository::try_new(&conn).unwrap(),
        &deps.hasher,
        &deps.tokens,
        &deps.blobs,
    );
    let user = service.register("alice", "alice1", "pw1").unwrap();

    let err = service
        .upload_avatar(
            user.id,
            &MediaUpload::new("notes.txt", "text/plain", b"hi".to_vec()),
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::Media(MediaError::Validation(_))));
    assert_eq!(err.status_code(), 400);

    let token = service.login("alice1", "pw1").unwrap();
    assert_eq!(service.current_user(&token).unwrap().avatar_url, None);
}
