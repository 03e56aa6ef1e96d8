use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use super::models::{media_from_column, media_to_column, ActorRef, Notice, NoticeComment};
use super::new_id;
use super::votes::{self, VoteKind, VoteTable};

const NOTICE_SELECT: &str = "
    SELECT n.id, n.title, n.content, n.media, n.created_at, n.updated_at, a.id, a.name, a.email
    FROM notices n
    LEFT JOIN actors a ON a.id = n.created_by";

const COMMENT_SELECT: &str = "
    SELECT c.id, c.notice_id, c.text, c.created_at, c.updated_at, a.id, a.name, a.email
    FROM notice_comments c
    LEFT JOIN actors a ON a.id = c.created_by";

const COMMENT_LIKES: (&str, &str) = ("notice_comment_likes", "comment_id");

fn notice_from_row(conn: &Connection, row: &Row<'_>) -> rusqlite::Result<Notice> {
    let id: String = row.get(0)?;
    Ok(Notice {
        likes: votes::voters(conn, VoteTable::Notice, &id, VoteKind::Like)?,
        dislikes: votes::voters(conn, VoteTable::Notice, &id, VoteKind::Dislike)?,
        id,
        title: row.get(1)?,
        content: row.get(2)?,
        media: media_from_column(row.get(3)?)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        created_by: ActorRef::from_columns(row, 6)?,
    })
}

fn comment_from_row(conn: &Connection, row: &Row<'_>) -> rusqlite::Result<NoticeComment> {
    let id: String = row.get(0)?;
    Ok(NoticeComment {
        likes: votes::likers(conn, COMMENT_LIKES.0, COMMENT_LIKES.1, &id)?,
        id,
        notice_id: row.get(1)?,
        text: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
        created_by: ActorRef::from_columns(row, 5)?,
    })
}

pub fn insert_notice(
    conn: &Connection,
    title: &str,
    content: &str,
    media: &[String],
    created_by: &str,
) -> rusqlite::Result<Notice> {
    let id = new_id();
    conn.execute(
        "INSERT INTO notices (id, title, content, media, created_by) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, title, content, media_to_column(media), created_by],
    )?;
    get_notice(conn, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn get_notice(conn: &Connection, id: &str) -> rusqlite::Result<Option<Notice>> {
    conn.query_row(
        &format!("{} WHERE n.id = ?1", NOTICE_SELECT),
        params![id],
        |row| notice_from_row(conn, row),
    )
    .optional()
}

pub fn list_notices(conn: &Connection) -> rusqlite::Result<Vec<Notice>> {
    let mut stmt = conn.prepare(&format!(
        "{} ORDER BY n.created_at DESC, n.rowid DESC",
        NOTICE_SELECT
    ))?;
    let notices = stmt
        .query_map([], |row| notice_from_row(conn, row))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(notices)
}

#[derive(Debug, Default)]
pub struct NoticeChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub media: Option<Vec<String>>,
}

pub fn update_notice(
    conn: &Connection,
    id: &str,
    changes: &NoticeChanges,
) -> rusqlite::Result<Option<Notice>> {
    let media = changes.media.as_deref().map(media_to_column);
    let updated = conn.execute(
        "UPDATE notices SET
            title = COALESCE(?2, title),
            content = COALESCE(?3, content),
            media = COALESCE(?4, media),
            updated_at = datetime('now')
         WHERE id = ?1",
        params![id, changes.title, changes.content, media],
    )?;
    if updated == 0 {
        return Ok(None);
    }
    get_notice(conn, id)
}

pub fn delete_notice(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let deleted = conn.execute("DELETE FROM notices WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

fn notice_exists(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM notices WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
}

pub fn cast_vote(
    conn: &mut Connection,
    id: &str,
    actor_id: &str,
    kind: VoteKind,
) -> rusqlite::Result<Option<Notice>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if !notice_exists(&tx, id)? {
        return Ok(None);
    }
    votes::toggle_vote(&tx, VoteTable::Notice, id, actor_id, kind)?;
    let notice = get_notice(&tx, id)?;
    tx.commit()?;
    Ok(notice)
}

// Comments

pub fn add_comment(
    conn: &mut Connection,
    notice_id: &str,
    text: &str,
    author_id: &str,
) -> rusqlite::Result<Option<NoticeComment>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if !notice_exists(&tx, notice_id)? {
        return Ok(None);
    }
    let id = new_id();
    tx.execute(
        "INSERT INTO notice_comments (id, notice_id, text, created_by) VALUES (?1, ?2, ?3, ?4)",
        params![id, notice_id, text, author_id],
    )?;
    let comment = get_comment(&tx, &id)?;
    tx.commit()?;
    Ok(comment)
}

pub fn get_comment(conn: &Connection, id: &str) -> rusqlite::Result<Option<NoticeComment>> {
    conn.query_row(
        &format!("{} WHERE c.id = ?1", COMMENT_SELECT),
        params![id],
        |row| comment_from_row(conn, row),
    )
    .optional()
}

pub fn list_comments(conn: &Connection, notice_id: &str) -> rusqlite::Result<Vec<NoticeComment>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE c.notice_id = ?1 ORDER BY c.created_at DESC, c.rowid DESC",
        COMMENT_SELECT
    ))?;
    let comments = stmt
        .query_map(params![notice_id], |row| comment_from_row(conn, row))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

pub fn comment_author(conn: &Connection, id: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT created_by FROM notice_comments WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
    .optional()
}

/// Toggle the caller's like and return the new like count.
pub fn toggle_comment_like(
    conn: &mut Connection,
    comment_id: &str,
    actor_id: &str,
) -> rusqlite::Result<Option<usize>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if comment_author(&tx, comment_id)?.is_none() {
        return Ok(None);
    }
    votes::toggle_like(&tx, COMMENT_LIKES.0, COMMENT_LIKES.1, comment_id, actor_id)?;
    let count = votes::likers(&tx, COMMENT_LIKES.0, COMMENT_LIKES.1, comment_id)?.len();
    tx.commit()?;
    Ok(Some(count))
}

pub fn delete_comment(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let deleted = conn.execute("DELETE FROM notice_comments WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}
