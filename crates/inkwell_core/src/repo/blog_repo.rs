//! Blog repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist blogs with their tag/category association sets.
//! - Compose filtered, paginated blog listings.
//! - Gate mutations on authorship.
//!
//! # Invariants
//! - A blog row and its association sets are written in one unit of work.
//! - Counters change only through single `SET n = n + 1` statements and do
//!   not touch `updated_at`.
//! - `get_blogs` hides drafts unless `show_drafts` is set; single-blog reads
//!   never filter on draft state.

use crate::model::blog::{Blog, BlogId, BlogUpdate, NewBlog};
use crate::model::id::id_or_new;
use crate::model::taxonomy::{CategoryId, TagId};
use crate::model::user::UserId;
use crate::repo::authorize::ensure_owner;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::taxonomy_repo::{load_blog_categories, load_blog_tags};
use crate::repo::unit_of_work::{require_found, with_unit_of_work, AccessMode};
use crate::repo::user_repo::{parse_user_row, URL_MAX_CHARS, USER_COLUMNS};
use crate::repo::{
    bool_to_int, ensure_schema_ready, normalize_limit, parse_bool, parse_uuid, validate_optional,
    validate_required, BLOG_ENTITY,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const TITLE_MAX_CHARS: usize = 256;
const SUMMARY_MAX_CHARS: usize = 512;
pub const BLOGS_DEFAULT_LIMIT: u32 = 10;

const BLOG_SELECT: &str = "SELECT
                b.id AS id,
                b.title AS title,
                b.content AS content,
                b.summary AS summary,
                b.cover_image_url AS cover_image_url,
                b.is_draft AS is_draft,
                b.view_count AS view_count,
                b.like_count AS like_count,
                b.created_at AS created_at,
                b.updated_at AS updated_at,";

const BLOG_FROM: &str = "FROM blogs b
             INNER JOIN users u ON u.id = b.author_id
             INNER JOIN accounts a ON a.user_id = u.id";

/// Filters and pagination for `get_blogs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogListQuery {
    /// Rows to skip.
    pub skip: u32,
    /// Page size. `0` means the default of 10; values clamp to 100.
    pub limit: u32,
    pub tag_id: Option<TagId>,
    pub category_id: Option<CategoryId>,
    pub author_id: Option<UserId>,
    /// Case-insensitive (full Unicode) substring over title, content and
    /// summary.
    pub search_term: Option<String>,
    /// Include drafts. Callers decide who may see them.
    pub show_drafts: bool,
}

impl Default for BlogListQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: BLOGS_DEFAULT_LIMIT,
            tag_id: None,
            category_id: None,
            author_id: None,
            search_term: None,
            show_drafts: false,
        }
    }
}

/// Repository interface for blog use-cases.
pub trait BlogRepository {
    /// Creates one blog with its association sets.
    fn create_blog(&self, new_blog: &NewBlog) -> RepoResult<Blog>;
    /// Gets one blog, optionally counting the read as a view first.
    fn get_blog_by_id(&self, id: BlogId, increment_view: bool) -> RepoResult<Blog>;
    /// Lists blogs newest first.
    fn get_blogs(&self, query: &BlogListQuery) -> RepoResult<Vec<Blog>>;
    /// Applies an author's partial update.
    fn update_blog(&self, id: BlogId, author_id: UserId, update: &BlogUpdate) -> RepoResult<Blog>;
    /// Hard-deletes a blog owned by `author_id`.
    fn delete_blog(&self, id: BlogId, author_id: UserId) -> RepoResult<()>;
    /// Adds one like. Any caller may like any blog.
    fn like_blog(&self, id: BlogId) -> RepoResult<Blog>;
}

/// SQLite-backed blog repository.
pub struct SqliteBlogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBlogRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl BlogRepository for SqliteBlogRepository<'_> {
    fn create_blog(&self, new_blog: &NewBlog) -> RepoResult<Blog> {
        validate_required("title", &new_blog.title, TITLE_MAX_CHARS)?;
        validate_required("content", &new_blog.content, usize::MAX)?;
        validate_optional("summary", new_blog.summary.as_deref(), SUMMARY_MAX_CHARS)?;
        validate_optional(
            "cover_image_url",
            new_blog.cover_image_url.as_deref(),
            URL_MAX_CHARS,
        )?;
        let id = id_or_new(new_blog.id);

        with_unit_of_work(self.conn, "blog_create", AccessMode::Write, |tx| {
            tx.execute(
                "INSERT INTO blogs (
                    id,
                    author_id,
                    title,
                    content,
                    summary,
                    cover_image_url,
                    is_draft
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    id.to_string(),
                    new_blog.author_id.to_string(),
                    new_blog.title,
                    new_blog.content,
                    new_blog.summary,
                    new_blog.cover_image_url,
                    bool_to_int(new_blog.is_draft),
                ],
            )?;
            replace_blog_tags(tx, id, &new_blog.tag_ids)?;
            replace_blog_categories(tx, id, &new_blog.category_ids)?;
            require_found(BLOG_ENTITY, id, || load_blog(tx, id))
        })
    }

    fn get_blog_by_id(&self, id: BlogId, increment_view: bool) -> RepoResult<Blog> {
        let mode = if increment_view {
            AccessMode::Write
        } else {
            AccessMode::Read
        };

        with_unit_of_work(self.conn, "blog_get", mode, |tx| {
            if increment_view {
                let changed = tx.execute(
                    "UPDATE blogs SET view_count = view_count + 1 WHERE id = ?1;",
                    [id.to_string()],
                )?;
                if changed == 0 {
                    return Err(RepoError::not_found(BLOG_ENTITY, id));
                }
            }
            require_found(BLOG_ENTITY, id, || load_blog(tx, id))
        })
    }

    fn get_blogs(&self, query: &BlogListQuery) -> RepoResult<Vec<Blog>> {
        let (sql, bind_values) = compose_list_query(query);

        with_unit_of_work(self.conn, "blog_list", AccessMode::Read, |tx| {
            let mut stmt = tx.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            let mut blogs = Vec::new();
            while let Some(row) = rows.next()? {
                blogs.push(parse_blog_row(row)?);
            }
            for blog in &mut blogs {
                blog.tags = load_blog_tags(tx, blog.id)?;
                blog.categories = load_blog_categories(tx, blog.id)?;
            }
            Ok(blogs)
        })
    }

    fn update_blog(&self, id: BlogId, author_id: UserId, update: &BlogUpdate) -> RepoResult<Blog> {
        if let Some(title) = update.title.as_deref() {
            validate_required("title", title, TITLE_MAX_CHARS)?;
        }
        if let Some(content) = update.content.as_deref() {
            validate_required("content", content, usize::MAX)?;
        }
        if let Some(summary) = update.summary.as_ref() {
            validate_optional("summary", summary.as_deref(), SUMMARY_MAX_CHARS)?;
        }
        if let Some(cover_image_url) = update.cover_image_url.as_ref() {
            validate_optional("cover_image_url", cover_image_url.as_deref(), URL_MAX_CHARS)?;
        }

        with_unit_of_work(self.conn, "blog_update", AccessMode::Write, |tx| {
            let owner_id = require_found(BLOG_ENTITY, id, || load_blog_author_id(tx, id))?;
            ensure_owner(BLOG_ENTITY, owner_id, author_id)?;

            let touches_links = update.tag_ids.is_some() || update.category_ids.is_some();
            if update.touches_row() || touches_links {
                let (sql, bind_values) = compose_update(id, update);
                tx.execute(&sql, params_from_iter(bind_values))?;
            }
            if let Some(tag_ids) = update.tag_ids.as_deref() {
                replace_blog_tags(tx, id, tag_ids)?;
            }
            if let Some(category_ids) = update.category_ids.as_deref() {
                replace_blog_categories(tx, id, category_ids)?;
            }
            require_found(BLOG_ENTITY, id, || load_blog(tx, id))
        })
    }

    fn delete_blog(&self, id: BlogId, author_id: UserId) -> RepoResult<()> {
        with_unit_of_work(self.conn, "blog_delete", AccessMode::Write, |tx| {
            let owner_id = require_found(BLOG_ENTITY, id, || load_blog_author_id(tx, id))?;
            ensure_owner(BLOG_ENTITY, owner_id, author_id)?;
            tx.execute("DELETE FROM blogs WHERE id = ?1;", [id.to_string()])?;
            Ok(())
        })
    }

    fn like_blog(&self, id: BlogId) -> RepoResult<Blog> {
        with_unit_of_work(self.conn, "blog_like", AccessMode::Write, |tx| {
            let changed = tx.execute(
                "UPDATE blogs SET like_count = like_count + 1 WHERE id = ?1;",
                [id.to_string()],
            )?;
            if changed == 0 {
                return Err(RepoError::not_found(BLOG_ENTITY, id));
            }
            require_found(BLOG_ENTITY, id, || load_blog(tx, id))
        })
    }
}

fn compose_list_query(query: &BlogListQuery) -> (String, Vec<Value>) {
    let mut sql = format!("{BLOG_SELECT} {USER_COLUMNS} {BLOG_FROM} WHERE 1 = 1");
    let mut bind_values: Vec<Value> = Vec::new();

    if let Some(tag_id) = query.tag_id {
        sql.push_str(
            " AND EXISTS (
                SELECT 1 FROM blog_tags bt
                WHERE bt.blog_id = b.id AND bt.tag_id = ?
            )",
        );
        bind_values.push(Value::Text(tag_id.to_string()));
    }

    if let Some(category_id) = query.category_id {
        sql.push_str(
            " AND EXISTS (
                SELECT 1 FROM blog_categories bc
                WHERE bc.blog_id = b.id AND bc.category_id = ?
            )",
        );
        bind_values.push(Value::Text(category_id.to_string()));
    }

    if let Some(author_id) = query.author_id {
        sql.push_str(" AND b.author_id = ?");
        bind_values.push(Value::Text(author_id.to_string()));
    }

    if let Some(term) = query.search_term.as_deref().filter(|term| !term.is_empty()) {
        sql.push_str(
            " AND (
                unicode_lower(b.title) LIKE ? ESCAPE '\\'
                OR unicode_lower(b.content) LIKE ? ESCAPE '\\'
                OR unicode_lower(b.summary) LIKE ? ESCAPE '\\'
            )",
        );
        // Both sides are folded, so non-ASCII letters compare case-insensitively.
        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
        for _ in 0..3 {
            bind_values.push(Value::Text(pattern.clone()));
        }
    }

    if !query.show_drafts {
        sql.push_str(" AND b.is_draft = 0");
    }

    sql.push_str(" ORDER BY b.created_at DESC, b.id DESC LIMIT ? OFFSET ?;");
    let limit = normalize_limit(query.limit, BLOGS_DEFAULT_LIMIT);
    bind_values.push(Value::Integer(i64::from(limit)));
    bind_values.push(Value::Integer(i64::from(query.skip)));

    (sql, bind_values)
}

fn compose_update(id: BlogId, update: &BlogUpdate) -> (String, Vec<Value>) {
    let mut assignments = vec!["updated_at = (strftime('%s', 'now') * 1000)"];
    let mut bind_values: Vec<Value> = Vec::new();

    if let Some(title) = update.title.as_ref() {
        assignments.push("title = ?");
        bind_values.push(Value::Text(title.clone()));
    }
    if let Some(content) = update.content.as_ref() {
        assignments.push("content = ?");
        bind_values.push(Value::Text(content.clone()));
    }
    if let Some(summary) = update.summary.as_ref() {
        assignments.push("summary = ?");
        bind_values.push(optional_text(summary));
    }
    if let Some(cover_image_url) = update.cover_image_url.as_ref() {
        assignments.push("cover_image_url = ?");
        bind_values.push(optional_text(cover_image_url));
    }
    if let Some(is_draft) = update.is_draft {
        assignments.push("is_draft = ?");
        bind_values.push(Value::Integer(bool_to_int(is_draft)));
    }

    bind_values.push(Value::Text(id.to_string()));
    let sql = format!("UPDATE blogs SET {} WHERE id = ?;", assignments.join(", "));
    (sql, bind_values)
}

fn optional_text(value: &Option<String>) -> Value {
    match value {
        Some(text) => Value::Text(text.clone()),
        None => Value::Null,
    }
}

/// Escapes `LIKE` wildcards so the term matches literally under `ESCAPE '\'`.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Replaces the whole tag set of a blog. Unknown ids are skipped.
fn replace_blog_tags(conn: &Connection, blog_id: BlogId, tag_ids: &[TagId]) -> RepoResult<()> {
    conn.execute(
        "DELETE FROM blog_tags WHERE blog_id = ?1;",
        [blog_id.to_string()],
    )?;
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO blog_tags (blog_id, tag_id)
         SELECT ?1, id FROM tags WHERE id = ?2;",
    )?;
    for tag_id in tag_ids {
        stmt.execute(params![blog_id.to_string(), tag_id.to_string()])?;
    }
    Ok(())
}

/// Replaces the whole category set of a blog. Unknown ids are skipped.
fn replace_blog_categories(
    conn: &Connection,
    blog_id: BlogId,
    category_ids: &[CategoryId],
) -> RepoResult<()> {
    conn.execute(
        "DELETE FROM blog_categories WHERE blog_id = ?1;",
        [blog_id.to_string()],
    )?;
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO blog_categories (blog_id, category_id)
         SELECT ?1, id FROM categories WHERE id = ?2;",
    )?;
    for category_id in category_ids {
        stmt.execute(params![blog_id.to_string(), category_id.to_string()])?;
    }
    Ok(())
}

/// Loads the stored author of a blog, for the ownership gate.
pub(crate) fn load_blog_author_id(conn: &Connection, id: BlogId) -> RepoResult<Option<UserId>> {
    let author_id: Option<String> = conn
        .query_row(
            "SELECT author_id FROM blogs WHERE id = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    author_id
        .map(|value| parse_uuid(&value, "blogs.author_id"))
        .transpose()
}

/// Loads one blog with author, tags and categories.
pub(crate) fn load_blog(conn: &Connection, id: BlogId) -> RepoResult<Option<Blog>> {
    let sql = format!("{BLOG_SELECT} {USER_COLUMNS} {BLOG_FROM} WHERE b.id = ?1;");
    let blog = conn
        .query_row(&sql, [id.to_string()], |row| Ok(parse_blog_row(row)))
        .optional()?;
    let Some(blog) = blog.transpose()? else {
        return Ok(None);
    };

    Ok(Some(Blog {
        tags: load_blog_tags(conn, id)?,
        categories: load_blog_categories(conn, id)?,
        ..blog
    }))
}

fn parse_blog_row(row: &Row<'_>) -> RepoResult<Blog> {
    let id: String = row.get("id")?;
    Ok(Blog {
        id: parse_uuid(&id, "blogs.id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        summary: row.get("summary")?,
        cover_image_url: row.get("cover_image_url")?,
        is_draft: parse_bool(row.get("is_draft")?, "blogs.is_draft")?,
        view_count: row.get("view_count")?,
        like_count: row.get("like_count")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        author: parse_user_row(row)?,
        tags: Vec::new(),
        categories: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::{compose_list_query, escape_like, BlogListQuery};
    use crate::model::id::new_id;
    use rusqlite::types::Value;

    #[test]
    fn escape_like_escapes_wildcards_and_escape_char() {
        assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn list_query_binds_filters_in_clause_order() {
        let query = BlogListQuery {
            tag_id: Some(new_id()),
            author_id: Some(new_id()),
            search_term: Some("rust".to_string()),
            ..BlogListQuery::default()
        };
        let (sql, bind_values) = compose_list_query(&query);
        assert!(sql.contains("FROM blog_tags"));
        assert!(sql.contains("unicode_lower(b.summary) LIKE ?"));
        assert!(!sql.contains("FROM blog_categories"));
        assert!(sql.contains("b.is_draft = 0"));
        assert!(sql.contains("ORDER BY b.created_at DESC, b.id DESC"));
        // tag, author, 3x search, limit, offset
        assert_eq!(bind_values.len(), 7);
    }

    #[test]
    fn search_pattern_is_lowercased_then_escaped() {
        let query = BlogListQuery {
            search_term: Some("ÜBER_50%".to_string()),
            ..BlogListQuery::default()
        };
        let (_, bind_values) = compose_list_query(&query);
        assert_eq!(
            bind_values[0],
            Value::Text("%über\\_50\\%%".to_string())
        );
    }

    #[test]
    fn empty_search_term_adds_no_filter() {
        let query = BlogListQuery {
            search_term: Some(String::new()),
            show_drafts: true,
            ..BlogListQuery::default()
        };
        let (sql, bind_values) = compose_list_query(&query);
        assert!(!sql.contains("LIKE"));
        assert!(!sql.contains("is_draft = 0"));
        assert_eq!(bind_values.len(), 2);
    }
}
