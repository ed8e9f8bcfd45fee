use inkwell_core::db::open_db_in_memory;
use inkwell_core::{
    BlogListQuery, BlogRepository, LocalBlobStore, MediaUpload, NewBlog, NewUser, PublishingService,
    RepoError, ServiceError, BcryptCredentialHasher, SqliteBlogRepository, SqliteUserRepository,
    User, UserRepository,
};
use rusqlite::Connection;

fn create_user(conn: &Connection, name: &str, username: &str) -> User {
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .create_user(
            &NewUser::new(name, username, "pw1"),
            &BcryptCredentialHasher::with_cost(4),
        )
        .unwrap()
}

#[test]
fn published_blog_views_are_counted() {
    let conn = open_db_in_memory().unwrap();
    let media_dir = tempfile::tempdir().unwrap();
    let blobs = LocalBlobStore::new(media_dir.path(), "/media");
    let alice = create_user(&conn, "alice", "alice1");
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();
    let blog = repo
        .create_blog(&NewBlog::new(alice.id, "Hello", "World").published())
        .unwrap();
    let service = PublishingService::new(repo, &blobs);

    assert_eq!(service.view_blog(blog.id, None).unwrap().view_count, 1);
    assert_eq!(service.view_blog(blog.id, Some(alice.id)).unwrap().view_count, 2);
}

#[test]
fn drafts_are_hidden_from_everyone_but_the_author() {
    let conn = open_db_in_memory().unwrap();
    let media_dir = tempfile::tempdir().unwrap();
    let blobs = LocalBlobStore::new(media_dir.path(), "/media");
    let alice = create_user(&conn, "alice", "alice1");
    let bob = create_user(&conn, "bob", "bob1");
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();
    let draft = repo
        .create_blog(&NewBlog::new(alice.id, "Draft", "Body"))
        .unwrap();
    let service = PublishingService::new(repo, &blobs);

    for viewer in [None, Some(bob.id)] {
        let err = service.view_blog(draft.id, viewer).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Repo(RepoError::NotFound { entity: "Blog", .. })
        ));
        assert_eq!(err.status_code(), 404);
    }

    let own = service.view_blog(draft.id, Some(alice.id)).unwrap();
    assert_eq!(own.id, draft.id);
    assert_eq!(own.view_count, 0);
}

#[test]
fn show_drafts_only_applies_to_own_listing() {
    let conn = open_db_in_memory().unwrap();
    let media_dir = tempfile::tempdir().unwrap();
    let blobs = LocalBlobStore::new(media_dir.path(), "/media");
    let alice = create_user(&conn, "alice", "alice1");
    let bob = create_user(&conn, "bob", "bob1");
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();
    repo.create_blog(&NewBlog::new(alice.id, "Draft", "Body"))
        .unwrap();
    repo.create_blog(&NewBlog::new(alice.id, "Public", "Body").published())
        .unwrap();
    let service = PublishingService::new(repo, &blobs);

    let query = BlogListQuery {
        author_id: Some(alice.id),
        show_drafts: true,
        ..BlogListQuery::default()
    };
    assert_eq!(service.list_blogs(Some(alice.id), &query).unwrap().len(), 2);
    assert_eq!(service.list_blogs(Some(bob.id), &query).unwrap().len(), 1);
    assert_eq!(service.list_blogs(None, &query).unwrap().len(), 1);

    let everyone = BlogListQuery {
        show_drafts: true,
        ..BlogListQuery::default()
    };
    assert_eq!(service.list_blogs(Some(alice.id), &everyone).unwrap().len(), 1);
}

#[test]
fn upload_cover_stores_under_blog_covers() {
    let conn = open_db_in_memory().unwrap();
    let media_dir = tempfile::tempdir().unwrap();
    let blobs = LocalBlobStore::new(media_dir.path(), "/media/");
    let service = PublishingService::new(SqliteBlogRepository::try_new(&conn).unwrap(), &blobs);

    let stored = service
        .upload_cover(&MediaUpload::new("cover.webp", "image/webp", vec![1, 2, 3]))
        .unwrap();
    assert!(stored.key.starts_with("blog-covers/"));
    assert!(stored.key.ends_with(".webp"));
    assert_eq!(stored.public_url, format!("/media/{}", stored.key));
    assert!(media_dir.path().join(&stored.key).is_file());

    let err = service
        .upload_cover(&MediaUpload::new("cover.pdf", "application/pdf", vec![1]))
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}
