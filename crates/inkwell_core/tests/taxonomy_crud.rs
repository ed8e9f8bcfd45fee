use inkwell_core::db::open_db_in_memory;
use inkwell_core::model::id::new_id;
use inkwell_core::{
    BlogRepository, CategoryUpdate, NewBlog, NewUser, RepoError, BcryptCredentialHasher,
    SqliteBlogRepository, SqliteTaxonomyRepository, SqliteUserRepository, TaxonomyRepository,
    UserRepository,
};

#[test]
fn tag_crud_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaxonomyRepository::try_new(&conn).unwrap();

    let tag = repo.create_tag(None, "rust").unwrap();
    assert_eq!(repo.get_tag_by_id(tag.id).unwrap(), tag);
    assert_eq!(repo.get_tag_by_name("rust").unwrap().id, tag.id);

    let renamed = repo.update_tag(tag.id, "rustlang").unwrap();
    assert_eq!(renamed.name, "rustlang");

    repo.delete_tag(tag.id).unwrap();
    assert!(matches!(
        repo.get_tag_by_id(tag.id),
        Err(RepoError::NotFound { entity: "Tag", .. })
    ));
    assert!(matches!(
        repo.delete_tag(tag.id),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn duplicate_tag_name_conflicts() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaxonomyRepository::try_new(&conn).unwrap();
    repo.create_tag(None, "rust").unwrap();

    let err = repo.create_tag(None, "rust").unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
}

#[test]
fn list_tags_sorts_by_name_and_paginates() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaxonomyRepository::try_new(&conn).unwrap();
    for name in ["zig", "go", "rust", "c"] {
        repo.create_tag(None, name).unwrap();
    }

    let names: Vec<String> = repo
        .list_tags(0, 0)
        .unwrap()
        .into_iter()
        .map(|tag| tag.name)
        .collect();
    assert_eq!(names, vec!["c", "go", "rust", "zig"]);

    let page: Vec<String> = repo
        .list_tags(1, 2)
        .unwrap()
        .into_iter()
        .map(|tag| tag.name)
        .collect();
    assert_eq!(page, vec!["go", "rust"]);
}

#[test]
fn category_crud_and_partial_update() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaxonomyRepository::try_new(&conn).unwrap();
    let id = new_id();

    let category = repo
        .create_category(Some(id), "systems", Some("low-level things"))
        .unwrap();
    assert_eq!(category.id, id);
    assert_eq!(category.description.as_deref(), Some("low-level things"));
    assert_eq!(repo.get_category_by_name("systems").unwrap().id, id);

    let updated = repo
        .update_category(
            id,
            &CategoryUpdate {
                name: Some("systems-programming".to_string()),
                description: None,
            },
        )
        .unwrap();
    assert_eq!(updated.name, "systems-programming");
    assert_eq!(updated.description.as_deref(), Some("low-level things"));

    assert_eq!(repo.list_categories(0, 10).unwrap().len(), 1);
    repo.delete_category(id).unwrap();
    assert!(repo.list_categories(0, 10).unwrap().is_empty());
}

#[test]
fn overlong_names_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaxonomyRepository::try_new(&conn).unwrap();

    let long_name = "n".repeat(65);
    assert!(matches!(
        repo.create_tag(None, &long_name),
        Err(RepoError::Validation(_))
    ));
    assert!(matches!(
        repo.create_category(None, "ok", Some(&"d".repeat(257))),
        Err(RepoError::Validation(_))
    ));
}

#[test]
fn deleting_a_tag_unlinks_it_from_blogs_but_keeps_blogs() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let taxonomy = SqliteTaxonomyRepository::try_new(&conn).unwrap();
    let blogs = SqliteBlogRepository::try_new(&conn).unwrap();

    let author = users
        .create_user(
            &NewUser::new("alice", "alice1", "pw1"),
            &BcryptCredentialHasher::with_cost(4),
        )
        .unwrap();
    let tag = taxonomy.create_tag(None, "rust").unwrap();
    let mut new_blog = NewBlog::new(author.id, "Hello", "World");
    new_blog.tag_ids = vec![tag.id];
    let blog = blogs.create_blog(&new_blog).unwrap();
    assert_eq!(blog.tag_names(), vec!["rust"]);

    taxonomy.delete_tag(tag.id).unwrap();
    let reloaded = blogs.get_blog_by_id(blog.id, false).unwrap();
    assert!(reloaded.tags.is_empty());
}
