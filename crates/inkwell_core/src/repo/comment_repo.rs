//! Threaded comment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist comments and replies under one blog.
//! - Assemble reply trees for blog comment listings.
//! - Delete a comment together with its whole reply subtree.
//!
//! # Invariants
//! - A reply always belongs to the same blog as its parent.
//! - Subtree deletion removes children before parents, in one unit of work.

use crate::model::blog::BlogId;
use crate::model::comment::{Comment, CommentId, NewComment};
use crate::model::id::id_or_new;
use crate::model::user::UserId;
use crate::repo::authorize::ensure_owner;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::unit_of_work::{require_found, with_unit_of_work, AccessMode};
use crate::repo::user_repo::{parse_user_row, USER_COLUMNS};
use crate::repo::{
    ensure_schema_ready, normalize_limit, parse_uuid, validate_required, COMMENT_ENTITY,
};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{HashMap, HashSet, VecDeque};

const CONTENT_MAX_CHARS: usize = 10_000;
pub const COMMENTS_DEFAULT_LIMIT: u32 = 100;

const COMMENT_SELECT: &str = "SELECT
                c.id AS id,
                c.blog_id AS blog_id,
                c.parent_id AS parent_id,
                c.content AS content,
                c.created_at AS created_at,
                c.updated_at AS updated_at,";

const COMMENT_FROM: &str = "FROM comments c
             INNER JOIN users u ON u.id = c.user_id
             INNER JOIN accounts a ON a.user_id = u.id";

/// Repository interface for comment use-cases.
pub trait CommentRepository {
    /// Creates a top-level comment or a reply.
    fn create_comment(&self, new_comment: &NewComment) -> RepoResult<Comment>;
    /// Gets one comment with its author. `replies` is left empty.
    fn get_comment_by_id(&self, id: CommentId) -> RepoResult<Comment>;
    /// Lists top-level comments newest first, each with its full reply tree.
    fn get_comments_by_blog_id(
        &self,
        blog_id: BlogId,
        skip: u32,
        limit: u32,
    ) -> RepoResult<Vec<Comment>>;
    /// Deletes a comment owned by `user_id` and every reply below it.
    ///
    /// Returns the number of rows removed.
    fn delete_comment(&self, id: CommentId, user_id: UserId) -> RepoResult<usize>;
}

/// SQLite-backed comment repository.
pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn create_comment(&self, new_comment: &NewComment) -> RepoResult<Comment> {
        validate_required("content", &new_comment.content, CONTENT_MAX_CHARS)?;
        let id = id_or_new(new_comment.id);

        with_unit_of_work(self.conn, "comment_create", AccessMode::Write, |tx| {
            if let Some(parent_id) = new_comment.parent_id {
                let parent_blog_id = require_found(COMMENT_ENTITY, parent_id, || {
                    load_comment_blog_id(tx, parent_id)
                })?;
                if parent_blog_id != new_comment.blog_id {
                    return Err(RepoError::Validation(
                        "reply must belong to the same blog as its parent".to_string(),
                    ));
                }
            }

            tx.execute(
                "INSERT INTO comments (id, blog_id, user_id, parent_id, content)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    id.to_string(),
                    new_comment.blog_id.to_string(),
                    new_comment.user_id.to_string(),
                    new_comment.parent_id.map(|parent_id| parent_id.to_string()),
                    new_comment.content,
                ],
            )?;
            require_found(COMMENT_ENTITY, id, || load_comment(tx, id))
        })
    }

    fn get_comment_by_id(&self, id: CommentId) -> RepoResult<Comment> {
        with_unit_of_work(self.conn, "comment_get", AccessMode::Read, |tx| {
            require_found(COMMENT_ENTITY, id, || load_comment(tx, id))
        })
    }

    fn get_comments_by_blog_id(
        &self,
        blog_id: BlogId,
        skip: u32,
        limit: u32,
    ) -> RepoResult<Vec<Comment>> {
        let limit = normalize_limit(limit, COMMENTS_DEFAULT_LIMIT);

        with_unit_of_work(self.conn, "comment_list_by_blog", AccessMode::Read, |tx| {
            let top_level = query_comments(
                tx,
                &format!(
                    "{COMMENT_SELECT} {USER_COLUMNS} {COMMENT_FROM}
                     WHERE c.blog_id = ?1 AND c.parent_id IS NULL
                     ORDER BY c.created_at DESC, c.id DESC
                     LIMIT ?2 OFFSET ?3;"
                ),
                params![blog_id.to_string(), i64::from(limit), i64::from(skip)],
            )?;
            if top_level.is_empty() {
                return Ok(top_level);
            }

            let replies = query_comments(
                tx,
                &format!(
                    "{COMMENT_SELECT} {USER_COLUMNS} {COMMENT_FROM}
                     WHERE c.blog_id = ?1 AND c.parent_id IS NOT NULL
                     ORDER BY c.created_at ASC, c.id ASC;"
                ),
                params![blog_id.to_string()],
            )?;
            let mut replies_by_parent: HashMap<CommentId, Vec<Comment>> = HashMap::new();
            for reply in replies {
                if let Some(parent_id) = reply.parent_id {
                    replies_by_parent.entry(parent_id).or_default().push(reply);
                }
            }

            Ok(top_level
                .into_iter()
                .map(|comment| attach_replies(comment, &mut replies_by_parent))
                .collect())
        })
    }

    fn delete_comment(&self, id: CommentId, user_id: UserId) -> RepoResult<usize> {
        with_unit_of_work(self.conn, "comment_delete", AccessMode::Write, |tx| {
            let owner_id =
                require_found(COMMENT_ENTITY, id, || load_comment_author_id(tx, id))?;
            ensure_owner(COMMENT_ENTITY, owner_id, user_id)?;

            let subtree = collect_subtree(tx, id)?;
            let mut stmt = tx.prepare("DELETE FROM comments WHERE id = ?1;")?;
            for comment_id in subtree.iter().rev() {
                stmt.execute([comment_id.to_string()])?;
            }

            info!(
                "event=comment_subtree_delete module=repo status=ok root_id={} removed={}",
                id,
                subtree.len()
            );
            Ok(subtree.len())
        })
    }
}

/// Breadth-first discovery of `root` and all of its descendants.
///
/// Parents always precede their children in the returned order.
fn collect_subtree(conn: &Connection, root: CommentId) -> RepoResult<Vec<CommentId>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM comments WHERE parent_id = ?1 ORDER BY created_at ASC, id ASC;",
    )?;
    let mut discovered = vec![root];
    let mut visited = HashSet::from([root]);
    let mut worklist = VecDeque::from([root]);

    while let Some(current) = worklist.pop_front() {
        let mut rows = stmt.query([current.to_string()])?;
        while let Some(row) = rows.next()? {
            let child_text: String = row.get(0)?;
            let child = parse_uuid(&child_text, "comments.id")?;
            if visited.insert(child) {
                discovered.push(child);
                worklist.push_back(child);
            }
        }
    }

    Ok(discovered)
}

/// Hangs every reply below `root`, keeping each parent's replies in map order.
///
/// Works on an explicit node list rather than recursion, so reply depth is
/// bounded by memory, not the stack. Entries are removed from the map as they
/// are used, which also ends cyclic parent chains.
fn attach_replies(
    mut root: Comment,
    replies_by_parent: &mut HashMap<CommentId, Vec<Comment>>,
) -> Comment {
    // (index of parent in `nodes`, or `None` for a direct reply to `root`)
    let mut nodes: Vec<(Option<usize>, Comment)> = replies_by_parent
        .remove(&root.id)
        .unwrap_or_default()
        .into_iter()
        .map(|reply| (None, reply))
        .collect();

    let mut cursor = 0;
    while cursor < nodes.len() {
        if let Some(children) = replies_by_parent.remove(&nodes[cursor].1.id) {
            nodes.extend(children.into_iter().map(|child| (Some(cursor), child)));
        }
        cursor += 1;
    }

    // Children sit after their parent, so popping from the back always
    // finishes a node before its parent is moved.
    while let Some((parent, mut comment)) = nodes.pop() {
        comment.replies.reverse();
        match parent {
            Some(index) => nodes[index].1.replies.push(comment),
            None => root.replies.push(comment),
        }
    }
    root.replies.reverse();
    root
}

fn load_comment(conn: &Connection, id: CommentId) -> RepoResult<Option<Comment>> {
    let sql = format!("{COMMENT_SELECT} {USER_COLUMNS} {COMMENT_FROM} WHERE c.id = ?1;");
    let comment = conn
        .query_row(&sql, [id.to_string()], |row| Ok(parse_comment_row(row)))
        .optional()?;
    comment.transpose()
}

fn load_comment_blog_id(conn: &Connection, id: CommentId) -> RepoResult<Option<BlogId>> {
    load_comment_column(conn, id, "blog_id")
}

fn load_comment_author_id(conn: &Connection, id: CommentId) -> RepoResult<Option<UserId>> {
    load_comment_column(conn, id, "user_id")
}

fn load_comment_column(
    conn: &Connection,
    id: CommentId,
    column: &'static str,
) -> RepoResult<Option<uuid::Uuid>> {
    let value: Option<String> = conn
        .query_row(
            &format!("SELECT {column} FROM comments WHERE id = ?1;"),
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    value.map(|text| parse_uuid(&text, column)).transpose()
}

fn query_comments(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> RepoResult<Vec<Comment>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut comments = Vec::new();
    while let Some(row) = rows.next()? {
        comments.push(parse_comment_row(row)?);
    }
    Ok(comments)
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<Comment> {
    let id: String = row.get("id")?;
    let blog_id: String = row.get("blog_id")?;
    let parent_id: Option<String> = row.get("parent_id")?;
    Ok(Comment {
        id: parse_uuid(&id, "comments.id")?,
        blog_id: parse_uuid(&blog_id, "comments.blog_id")?,
        parent_id: parent_id
            .map(|value| parse_uuid(&value, "comments.parent_id"))
            .transpose()?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        author: parse_user_row(row)?,
        replies: Vec::new(),
    })
}
