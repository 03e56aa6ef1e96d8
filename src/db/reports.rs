use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use super::models::{media_from_column, media_to_column, ActorRef, Category, Reply, Report, ReportComment, ReportStatus};
use super::new_id;
use super::votes::{self, VoteKind, VoteTable};

const REPORT_SELECT: &str = "
    SELECT r.id, r.title, r.description, r.category, r.media, r.location,
           r.district, r.panchayath, r.ward_no, r.status, r.created_at, r.updated_at,
           a.id, a.name, a.email
    FROM reports r
    LEFT JOIN actors a ON a.id = r.created_by";

const COMMENT_SELECT: &str = "
    SELECT c.id, c.report_id, c.text, c.created_at, c.updated_at, a.id, a.name, a.email
    FROM report_comments c
    LEFT JOIN actors a ON a.id = c.created_by";

const COMMENT_LIKES: (&str, &str) = ("report_comment_likes", "comment_id");
const REPLY_LIKES: (&str, &str) = ("report_reply_likes", "reply_id");

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<Report> {
    Ok(Report {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        media: media_from_column(row.get(4)?)?,
        location: row.get(5)?,
        district: row.get(6)?,
        panchayath: row.get(7)?,
        ward_no: row.get(8)?,
        status: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
        created_by: ActorRef::from_columns(row, 12)?,
        comments: Vec::new(),
        likes: Vec::new(),
        dislikes: Vec::new(),
        upvotes: Vec::new(),
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<ReportComment> {
    Ok(ReportComment {
        id: row.get(0)?,
        issue_id: row.get(1)?,
        text: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
        created_by: ActorRef::from_columns(row, 5)?,
        likes: Vec::new(),
        replies: Vec::new(),
    })
}

/// Fill the vote sets and comment thread of a report row.
fn hydrate_report(conn: &Connection, mut report: Report) -> rusqlite::Result<Report> {
    report.likes = votes::voters(conn, VoteTable::Report, &report.id, VoteKind::Like)?;
    report.dislikes = votes::voters(conn, VoteTable::Report, &report.id, VoteKind::Dislike)?;
    report.upvotes = votes::voters(conn, VoteTable::Report, &report.id, VoteKind::Upvote)?;
    report.comments = query_comments(
        conn,
        "WHERE c.report_id = ?1 ORDER BY c.created_at, c.rowid",
        &report.id,
    )?;
    Ok(report)
}

fn hydrate_comment(conn: &Connection, mut comment: ReportComment) -> rusqlite::Result<ReportComment> {
    comment.likes = votes::likers(conn, COMMENT_LIKES.0, COMMENT_LIKES.1, &comment.id)?;

    let mut stmt = conn.prepare(
        "SELECT p.id, p.text, p.created_at, a.id, a.name, a.email
         FROM report_comment_replies p
         LEFT JOIN actors a ON a.id = p.created_by
         WHERE p.comment_id = ?1
         ORDER BY p.created_at, p.rowid",
    )?;
    let replies = stmt
        .query_map(params![comment.id], |row| {
            Ok(Reply {
                id: row.get(0)?,
                text: row.get(1)?,
                created_at: row.get(2)?,
                created_by: ActorRef::from_columns(row, 3)?,
                likes: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    comment.replies = replies
        .into_iter()
        .map(|mut reply| {
            reply.likes = votes::likers(conn, REPLY_LIKES.0, REPLY_LIKES.1, &reply.id)?;
            Ok(reply)
        })
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(comment)
}

fn query_reports(conn: &Connection, tail: &str, arg: Option<&str>) -> rusqlite::Result<Vec<Report>> {
    let mut stmt = conn.prepare(&format!("{} {}", REPORT_SELECT, tail))?;
    let rows = match arg {
        Some(arg) => stmt.query_map(params![arg], report_from_row)?,
        None => stmt.query_map([], report_from_row)?,
    }
    .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(|r| hydrate_report(conn, r)).collect()
}

fn query_comments(conn: &Connection, tail: &str, arg: &str) -> rusqlite::Result<Vec<ReportComment>> {
    let mut stmt = conn.prepare(&format!("{} {}", COMMENT_SELECT, tail))?;
    let rows = stmt
        .query_map(params![arg], comment_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(|c| hydrate_comment(conn, c)).collect()
}

// Reports

pub struct NewReport<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub category: Category,
    pub media: &'a [String],
    pub location: &'a str,
    pub district: Option<&'a str>,
    pub panchayath: Option<&'a str>,
    pub ward_no: Option<i64>,
    pub created_by: &'a str,
}

pub fn insert_report(conn: &Connection, report: &NewReport<'_>) -> rusqlite::Result<Report> {
    let id = new_id();
    conn.execute(
        "INSERT INTO reports (id, title, description, category, media, location, district, panchayath, ward_no, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id,
            report.title,
            report.description,
            report.category,
            media_to_column(report.media),
            report.location,
            report.district,
            report.panchayath,
            report.ward_no,
            report.created_by
        ],
    )?;
    get_report(conn, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn get_report(conn: &Connection, id: &str) -> rusqlite::Result<Option<Report>> {
    let report = conn
        .query_row(
            &format!("{} WHERE r.id = ?1", REPORT_SELECT),
            params![id],
            report_from_row,
        )
        .optional()?;
    report.map(|r| hydrate_report(conn, r)).transpose()
}

pub fn list_reports(conn: &Connection) -> rusqlite::Result<Vec<Report>> {
    query_reports(conn, "ORDER BY r.created_at DESC, r.rowid DESC", None)
}

pub fn list_reports_by_owner(conn: &Connection, owner_id: &str) -> rusqlite::Result<Vec<Report>> {
    query_reports(
        conn,
        "WHERE r.created_by = ?1 ORDER BY r.created_at DESC, r.rowid DESC",
        Some(owner_id),
    )
}

pub fn report_owner(conn: &Connection, id: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT created_by FROM reports WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
    .optional()
}

/// Partial update of a report. `None` leaves the column as is; `media`
/// replaces the whole list when set.
#[derive(Debug, Default)]
pub struct ReportChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub location: Option<String>,
    pub district: Option<String>,
    pub panchayath: Option<String>,
    pub ward_no: Option<i64>,
    pub status: Option<ReportStatus>,
    pub media: Option<Vec<String>>,
}

pub fn update_report(
    conn: &Connection,
    id: &str,
    changes: &ReportChanges,
) -> rusqlite::Result<Option<Report>> {
    let media = changes.media.as_deref().map(media_to_column);
    let updated = conn.execute(
        "UPDATE reports SET
            title = COALESCE(?2, title),
            description = COALESCE(?3, description),
            category = COALESCE(?4, category),
            location = COALESCE(?5, location),
            district = COALESCE(?6, district),
            panchayath = COALESCE(?7, panchayath),
            ward_no = COALESCE(?8, ward_no),
            status = COALESCE(?9, status),
            media = COALESCE(?10, media),
            updated_at = datetime('now')
         WHERE id = ?1",
        params![
            id,
            changes.title,
            changes.description,
            changes.category,
            changes.location,
            changes.district,
            changes.panchayath,
            changes.ward_no,
            changes.status,
            media
        ],
    )?;
    if updated == 0 {
        return Ok(None);
    }
    get_report(conn, id)
}

pub fn set_status(conn: &Connection, id: &str, status: ReportStatus) -> rusqlite::Result<Option<Report>> {
    let updated = conn.execute(
        "UPDATE reports SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
        params![id, status],
    )?;
    if updated == 0 {
        return Ok(None);
    }
    get_report(conn, id)
}

/// Delete a report; comments, replies and votes go with it.
pub fn delete_report(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let deleted = conn.execute("DELETE FROM reports WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

/// Toggle a vote and return the report as it stands afterwards.
pub fn cast_vote(
    conn: &mut Connection,
    id: &str,
    actor_id: &str,
    kind: VoteKind,
) -> rusqlite::Result<Option<Report>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if report_owner(&tx, id)?.is_none() {
        return Ok(None);
    }
    votes::toggle_vote(&tx, VoteTable::Report, id, actor_id, kind)?;
    let report = get_report(&tx, id)?;
    tx.commit()?;
    Ok(report)
}

// Comments

/// Attach a comment to a report. Returns `None` and writes nothing when the
/// report does not exist.
pub fn add_comment(
    conn: &mut Connection,
    report_id: &str,
    text: &str,
    author_id: &str,
) -> rusqlite::Result<Option<ReportComment>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if report_owner(&tx, report_id)?.is_none() {
        return Ok(None);
    }
    let id = new_id();
    tx.execute(
        "INSERT INTO report_comments (id, report_id, text, created_by) VALUES (?1, ?2, ?3, ?4)",
        params![id, report_id, text, author_id],
    )?;
    let comment = get_comment(&tx, &id)?;
    tx.commit()?;
    Ok(comment)
}

pub fn get_comment(conn: &Connection, id: &str) -> rusqlite::Result<Option<ReportComment>> {
    let comment = conn
        .query_row(
            &format!("{} WHERE c.id = ?1", COMMENT_SELECT),
            params![id],
            comment_from_row,
        )
        .optional()?;
    comment.map(|c| hydrate_comment(conn, c)).transpose()
}

pub fn list_comments(conn: &Connection, report_id: &str) -> rusqlite::Result<Vec<ReportComment>> {
    query_comments(
        conn,
        "WHERE c.report_id = ?1 ORDER BY c.created_at DESC, c.rowid DESC",
        report_id,
    )
}

pub fn comment_author(conn: &Connection, id: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT created_by FROM report_comments WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
    .optional()
}

pub fn delete_comment(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let deleted = conn.execute("DELETE FROM report_comments WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

pub fn toggle_comment_like(
    conn: &mut Connection,
    comment_id: &str,
    actor_id: &str,
) -> rusqlite::Result<Option<ReportComment>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if comment_author(&tx, comment_id)?.is_none() {
        return Ok(None);
    }
    votes::toggle_like(&tx, COMMENT_LIKES.0, COMMENT_LIKES.1, comment_id, actor_id)?;
    let comment = get_comment(&tx, comment_id)?;
    tx.commit()?;
    Ok(comment)
}

pub fn add_reply(
    conn: &mut Connection,
    comment_id: &str,
    text: &str,
    author_id: &str,
) -> rusqlite::Result<Option<ReportComment>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if comment_author(&tx, comment_id)?.is_none() {
        return Ok(None);
    }
    tx.execute(
        "INSERT INTO report_comment_replies (id, comment_id, text, created_by) VALUES (?1, ?2, ?3, ?4)",
        params![new_id(), comment_id, text, author_id],
    )?;
    let comment = get_comment(&tx, comment_id)?;
    tx.commit()?;
    Ok(comment)
}

#[derive(Debug)]
pub enum ReplyLike {
    Updated(ReportComment),
    CommentNotFound,
    ReplyNotFound,
}

/// Toggle a like on a reply that must belong to `comment_id`.
pub fn toggle_reply_like(
    conn: &mut Connection,
    comment_id: &str,
    reply_id: &str,
    actor_id: &str,
) -> rusqlite::Result<ReplyLike> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if comment_author(&tx, comment_id)?.is_none() {
        return Ok(ReplyLike::CommentNotFound);
    }
    let in_comment: bool = tx.query_row(
        "SELECT COUNT(*) > 0 FROM report_comment_replies WHERE id = ?1 AND comment_id = ?2",
        params![reply_id, comment_id],
        |row| row.get(0),
    )?;
    if !in_comment {
        return Ok(ReplyLike::ReplyNotFound);
    }
    votes::toggle_like(&tx, REPLY_LIKES.0, REPLY_LIKES.1, reply_id, actor_id)?;
    let comment = get_comment(&tx, comment_id)?;
    tx.commit()?;
    Ok(match comment {
        Some(comment) => ReplyLike::Updated(comment),
        None => ReplyLike::CommentNotFound,
    })
}
