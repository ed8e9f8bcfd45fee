//! Tag/category repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Tag and category names are unique; duplicates surface as `Conflict`.
//! - Deleting a tag or category removes its blog links, never the blogs.

use crate::model::blog::BlogId;
use crate::model::id::id_or_new;
use crate::model::taxonomy::{Category, CategoryId, CategoryUpdate, Tag, TagId};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::unit_of_work::{require_found, with_unit_of_work, AccessMode};
use crate::repo::{
    ensure_schema_ready, normalize_limit, parse_uuid, validate_optional, validate_required,
    CATEGORY_ENTITY, TAG_ENTITY,
};
use rusqlite::{params, Connection, Row};

const NAME_MAX_CHARS: usize = 64;
const DESCRIPTION_MAX_CHARS: usize = 256;
const TAXONOMY_DEFAULT_LIMIT: u32 = 100;

/// Repository interface for tags and categories.
pub trait TaxonomyRepository {
    fn create_tag(&self, id: Option<TagId>, name: &str) -> RepoResult<Tag>;
    fn get_tag_by_id(&self, id: TagId) -> RepoResult<Tag>;
    fn get_tag_by_name(&self, name: &str) -> RepoResult<Tag>;
    /// Lists tags sorted by name. `limit == 0` means the default page size.
    fn list_tags(&self, skip: u32, limit: u32) -> RepoResult<Vec<Tag>>;
    fn update_tag(&self, id: TagId, name: &str) -> RepoResult<Tag>;
    fn delete_tag(&self, id: TagId) -> RepoResult<()>;

    fn create_category(
        &self,
        id: Option<CategoryId>,
        name: &str,
        description: Option<&str>,
    ) -> RepoResult<Category>;
    fn get_category_by_id(&self, id: CategoryId) -> RepoResult<Category>;
    fn get_category_by_name(&self, name: &str) -> RepoResult<Category>;
    /// Lists categories sorted by name. `limit == 0` means the default page size.
    fn list_categories(&self, skip: u32, limit: u32) -> RepoResult<Vec<Category>>;
    /// Applies only the supplied fields.
    fn update_category(&self, id: CategoryId, update: &CategoryUpdate) -> RepoResult<Category>;
    fn delete_category(&self, id: CategoryId) -> RepoResult<()>;
}

/// SQLite-backed taxonomy repository.
pub struct SqliteTaxonomyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaxonomyRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TaxonomyRepository for SqliteTaxonomyRepository<'_> {
    fn create_tag(&self, id: Option<TagId>, name: &str) -> RepoResult<Tag> {
        validate_required("tag name", name, NAME_MAX_CHARS)?;
        let id = id_or_new(id);

        with_unit_of_work(self.conn, "tag_create", AccessMode::Write, |tx| {
            tx.execute(
                "INSERT INTO tags (id, name) VALUES (?1, ?2);",
                params![id.to_string(), name],
            )?;
            require_found(TAG_ENTITY, id, || load_tag(tx, "id = ?1", &id.to_string()))
        })
    }

    fn get_tag_by_id(&self, id: TagId) -> RepoResult<Tag> {
        with_unit_of_work(self.conn, "tag_get", AccessMode::Read, |tx| {
            require_found(TAG_ENTITY, id, || load_tag(tx, "id = ?1", &id.to_string()))
        })
    }

    fn get_tag_by_name(&self, name: &str) -> RepoResult<Tag> {
        with_unit_of_work(self.conn, "tag_get_by_name", AccessMode::Read, |tx| {
            require_found(TAG_ENTITY, name, || load_tag(tx, "name = ?1", name))
        })
    }

    fn list_tags(&self, skip: u32, limit: u32) -> RepoResult<Vec<Tag>> {
        let limit = normalize_limit(limit, TAXONOMY_DEFAULT_LIMIT);
        with_unit_of_work(self.conn, "tag_list", AccessMode::Read, |tx| {
            let mut stmt = tx.prepare(
                "SELECT id, name, created_at, updated_at
                 FROM tags
                 ORDER BY name ASC
                 LIMIT ?1 OFFSET ?2;",
            )?;
            let mut rows = stmt.query(params![i64::from(limit), i64::from(skip)])?;
            let mut tags = Vec::new();
            while let Some(row) = rows.next()? {
                tags.push(parse_tag_row(row)?);
            }
            Ok(tags)
        })
    }

    fn update_tag(&self, id: TagId, name: &str) -> RepoResult<Tag> {
        validate_required("tag name", name, NAME_MAX_CHARS)?;

        with_unit_of_work(self.conn, "tag_update", AccessMode::Write, |tx| {
            let changed = tx.execute(
                "UPDATE tags
                 SET name = ?2, updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![id.to_string(), name],
            )?;
            if changed == 0 {
                return Err(RepoError::not_found(TAG_ENTITY, id));
            }
            require_found(TAG_ENTITY, id, || load_tag(tx, "id = ?1", &id.to_string()))
        })
    }

    fn delete_tag(&self, id: TagId) -> RepoResult<()> {
        with_unit_of_work(self.conn, "tag_delete", AccessMode::Write, |tx| {
            let changed = tx.execute("DELETE FROM tags WHERE id = ?1;", [id.to_string()])?;
            if changed == 0 {
                return Err(RepoError::not_found(TAG_ENTITY, id));
            }
            Ok(())
        })
    }

    fn create_category(
        &self,
        id: Option<CategoryId>,
        name: &str,
        description: Option<&str>,
    ) -> RepoResult<Category> {
        validate_required("category name", name, NAME_MAX_CHARS)?;
        validate_optional("description", description, DESCRIPTION_MAX_CHARS)?;
        let id = id_or_new(id);

        with_unit_of_work(self.conn, "category_create", AccessMode::Write, |tx| {
            tx.execute(
                "INSERT INTO categories (id, name, description) VALUES (?1, ?2, ?3);",
                params![id.to_string(), name, description],
            )?;
            require_found(CATEGORY_ENTITY, id, || {
                load_category(tx, "id = ?1", &id.to_string())
            })
        })
    }

    fn get_category_by_id(&self, id: CategoryId) -> RepoResult<Category> {
        with_unit_of_work(self.conn, "category_get", AccessMode::Read, |tx| {
            require_found(CATEGORY_ENTITY, id, || {
                load_category(tx, "id = ?1", &id.to_string())
            })
        })
    }

    fn get_category_by_name(&self, name: &str) -> RepoResult<Category> {
        with_unit_of_work(self.conn, "category_get_by_name", AccessMode::Read, |tx| {
            require_found(CATEGORY_ENTITY, name, || {
                load_category(tx, "name = ?1", name)
            })
        })
    }

    fn list_categories(&self, skip: u32, limit: u32) -> RepoResult<Vec<Category>> {
        let limit = normalize_limit(limit, TAXONOMY_DEFAULT_LIMIT);
        with_unit_of_work(self.conn, "category_list", AccessMode::Read, |tx| {
            let mut stmt = tx.prepare(
                "SELECT id, name, description, created_at, updated_at
                 FROM categories
                 ORDER BY name ASC
                 LIMIT ?1 OFFSET ?2;",
            )?;
            let mut rows = stmt.query(params![i64::from(limit), i64::from(skip)])?;
            let mut categories = Vec::new();
            while let Some(row) = rows.next()? {
                categories.push(parse_category_row(row)?);
            }
            Ok(categories)
        })
    }

    fn update_category(&self, id: CategoryId, update: &CategoryUpdate) -> RepoResult<Category> {
        if let Some(name) = update.name.as_deref() {
            validate_required("category name", name, NAME_MAX_CHARS)?;
        }
        validate_optional(
            "description",
            update.description.as_deref(),
            DESCRIPTION_MAX_CHARS,
        )?;

        with_unit_of_work(self.conn, "category_update", AccessMode::Write, |tx| {
            let changed = tx.execute(
                "UPDATE categories
                 SET
                    name = COALESCE(?2, name),
                    description = COALESCE(?3, description),
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![id.to_string(), update.name, update.description],
            )?;
            if changed == 0 {
                return Err(RepoError::not_found(CATEGORY_ENTITY, id));
            }
            require_found(CATEGORY_ENTITY, id, || {
                load_category(tx, "id = ?1", &id.to_string())
            })
        })
    }

    fn delete_category(&self, id: CategoryId) -> RepoResult<()> {
        with_unit_of_work(self.conn, "category_delete", AccessMode::Write, |tx| {
            let changed =
                tx.execute("DELETE FROM categories WHERE id = ?1;", [id.to_string()])?;
            if changed == 0 {
                return Err(RepoError::not_found(CATEGORY_ENTITY, id));
            }
            Ok(())
        })
    }
}

/// Loads the tags linked to one blog, sorted by name.
pub(crate) fn load_blog_tags(conn: &Connection, blog_id: BlogId) -> RepoResult<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.created_at, t.updated_at
         FROM blog_tags bt
         INNER JOIN tags t ON t.id = bt.tag_id
         WHERE bt.blog_id = ?1
         ORDER BY t.name ASC;",
    )?;
    let mut rows = stmt.query([blog_id.to_string()])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(parse_tag_row(row)?);
    }
    Ok(tags)
}

/// Loads the categories linked to one blog, sorted by name.
pub(crate) fn load_blog_categories(
    conn: &Connection,
    blog_id: BlogId,
) -> RepoResult<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.description, c.created_at, c.updated_at
         FROM blog_categories bc
         INNER JOIN categories c ON c.id = bc.category_id
         WHERE bc.blog_id = ?1
         ORDER BY c.name ASC;",
    )?;
    let mut rows = stmt.query([blog_id.to_string()])?;
    let mut categories = Vec::new();
    while let Some(row) = rows.next()? {
        categories.push(parse_category_row(row)?);
    }
    Ok(categories)
}

fn load_tag(conn: &Connection, predicate: &str, value: &str) -> RepoResult<Option<Tag>> {
    let sql = format!(
        "SELECT id, name, created_at, updated_at
         FROM tags
         WHERE {predicate};"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([value])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_tag_row(row)?));
    }
    Ok(None)
}

fn load_category(conn: &Connection, predicate: &str, value: &str) -> RepoResult<Option<Category>> {
    let sql = format!(
        "SELECT id, name, description, created_at, updated_at
         FROM categories
         WHERE {predicate};"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([value])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_category_row(row)?));
    }
    Ok(None)
}

fn parse_tag_row(row: &Row<'_>) -> RepoResult<Tag> {
    let id: String = row.get("id")?;
    Ok(Tag {
        id: parse_uuid(&id, "tags.id")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<Category> {
    let id: String = row.get("id")?;
    Ok(Category {
        id: parse_uuid(&id, "categories.id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
