use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;

/// A reaction an actor can hold on a report or notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    Like,
    Dislike,
    Upvote,
}

impl VoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteKind::Like => "like",
            VoteKind::Dislike => "dislike",
            VoteKind::Upvote => "upvote",
        }
    }
}

impl FromStr for VoteKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(VoteKind::Like),
            "dislike" => Ok(VoteKind::Dislike),
            "upvote" => Ok(VoteKind::Upvote),
            _ => Err(()),
        }
    }
}

/// Vote tables keyed by (target, actor). The key makes the kinds mutually
/// exclusive per actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTable {
    Report,
    Notice,
}

impl VoteTable {
    fn table(&self) -> &'static str {
        match self {
            VoteTable::Report => "report_votes",
            VoteTable::Notice => "notice_votes",
        }
    }

    fn target_column(&self) -> &'static str {
        match self {
            VoteTable::Report => "report_id",
            VoteTable::Notice => "notice_id",
        }
    }
}

/// Where an actor's vote ends up after casting `cast` while holding `current`.
/// Casting the held kind withdraws it; anything else replaces it.
pub fn next_vote(current: Option<VoteKind>, cast: VoteKind) -> Option<VoteKind> {
    match current {
        Some(held) if held == cast => None,
        _ => Some(cast),
    }
}

/// Toggle `actor_id`'s vote on a target. Callers run this inside a
/// transaction so the read and write are one unit.
pub fn toggle_vote(
    conn: &Connection,
    table: VoteTable,
    target_id: &str,
    actor_id: &str,
    cast: VoteKind,
) -> rusqlite::Result<Option<VoteKind>> {
    let current: Option<String> = conn
        .query_row(
            &format!(
                "SELECT kind FROM {} WHERE {} = ?1 AND actor_id = ?2",
                table.table(),
                table.target_column()
            ),
            params![target_id, actor_id],
            |row| row.get(0),
        )
        .optional()?;
    let current = current.and_then(|k| k.parse().ok());

    let next = next_vote(current, cast);
    match next {
        None => {
            conn.execute(
                &format!(
                    "DELETE FROM {} WHERE {} = ?1 AND actor_id = ?2",
                    table.table(),
                    table.target_column()
                ),
                params![target_id, actor_id],
            )?;
        }
        Some(kind) => {
            conn.execute(
                &format!(
                    "INSERT INTO {t} ({c}, actor_id, kind) VALUES (?1, ?2, ?3)
                     ON CONFLICT({c}, actor_id) DO UPDATE SET kind = excluded.kind",
                    t = table.table(),
                    c = table.target_column()
                ),
                params![target_id, actor_id, kind.as_str()],
            )?;
        }
    }
    Ok(next)
}

/// Actor ids holding `kind` on a target, in the order they voted.
pub fn voters(
    conn: &Connection,
    table: VoteTable,
    target_id: &str,
    kind: VoteKind,
) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT actor_id FROM {} WHERE {} = ?1 AND kind = ?2 ORDER BY created_at, rowid",
        table.table(),
        table.target_column()
    ))?;
    let ids = stmt
        .query_map(params![target_id, kind.as_str()], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}

/// Flip membership of `actor_id` in a plain like set (comments, replies).
/// Returns true when the actor now likes the target.
pub fn toggle_like(
    conn: &Connection,
    table: &str,
    target_column: &str,
    target_id: &str,
    actor_id: &str,
) -> rusqlite::Result<bool> {
    let removed = conn.execute(
        &format!("DELETE FROM {} WHERE {} = ?1 AND actor_id = ?2", table, target_column),
        params![target_id, actor_id],
    )?;
    if removed > 0 {
        return Ok(false);
    }
    conn.execute(
        &format!("INSERT INTO {} ({}, actor_id) VALUES (?1, ?2)", table, target_column),
        params![target_id, actor_id],
    )?;
    Ok(true)
}

pub fn likers(
    conn: &Connection,
    table: &str,
    target_column: &str,
    target_id: &str,
) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT actor_id FROM {} WHERE {} = ?1 ORDER BY rowid",
        table, target_column
    ))?;
    let ids = stmt
        .query_map(params![target_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn;

    fn seed_report(conn: &Connection) {
        conn.execute_batch(
            "INSERT INTO users (id, name, email, password_hash, district, panchayath, ward_no)
                VALUES ('u1', 'A', 'a@x', 'h', 'D', 'P', 1);
             INSERT INTO reports (id, title, description, category, location, created_by)
                VALUES ('r1', 'Pothole', 'Large', 'Roads', 'Main St', 'u1');",
        )
        .unwrap();
    }

    fn kinds_held(conn: &Connection, actor: &str) -> Vec<VoteKind> {
        [VoteKind::Like, VoteKind::Dislike, VoteKind::Upvote]
            .into_iter()
            .filter(|k| {
                voters(conn, VoteTable::Report, "r1", *k)
                    .unwrap()
                    .contains(&actor.to_string())
            })
            .collect()
    }

    #[test]
    fn next_vote_toggles_and_replaces() {
        assert_eq!(next_vote(None, VoteKind::Like), Some(VoteKind::Like));
        assert_eq!(next_vote(Some(VoteKind::Like), VoteKind::Like), None);
        assert_eq!(
            next_vote(Some(VoteKind::Like), VoteKind::Dislike),
            Some(VoteKind::Dislike)
        );
        assert_eq!(
            next_vote(Some(VoteKind::Dislike), VoteKind::Upvote),
            Some(VoteKind::Upvote)
        );
    }

    #[test]
    fn liking_twice_withdraws() {
        let conn = test_conn();
        seed_report(&conn);

        let first = toggle_vote(&conn, VoteTable::Report, "r1", "u1", VoteKind::Like).unwrap();
        assert_eq!(first, Some(VoteKind::Like));
        assert_eq!(kinds_held(&conn, "u1"), vec![VoteKind::Like]);

        let second = toggle_vote(&conn, VoteTable::Report, "r1", "u1", VoteKind::Like).unwrap();
        assert_eq!(second, None);
        assert!(kinds_held(&conn, "u1").is_empty());
    }

    #[test]
    fn an_actor_holds_at_most_one_kind() {
        let conn = test_conn();
        seed_report(&conn);

        let sequence = [
            VoteKind::Like,
            VoteKind::Dislike,
            VoteKind::Upvote,
            VoteKind::Like,
            VoteKind::Upvote,
            VoteKind::Dislike,
            VoteKind::Dislike,
        ];
        for cast in sequence {
            toggle_vote(&conn, VoteTable::Report, "r1", "u1", cast).unwrap();
            assert!(kinds_held(&conn, "u1").len() <= 1);
        }
    }

    #[test]
    fn upvote_clears_like_and_dislike() {
        let conn = test_conn();
        seed_report(&conn);
        toggle_vote(&conn, VoteTable::Report, "r1", "u1", VoteKind::Dislike).unwrap();
        toggle_vote(&conn, VoteTable::Report, "r1", "u1", VoteKind::Upvote).unwrap();
        assert_eq!(kinds_held(&conn, "u1"), vec![VoteKind::Upvote]);
    }

    #[test]
    fn votes_from_different_actors_are_independent() {
        let conn = test_conn();
        seed_report(&conn);
        toggle_vote(&conn, VoteTable::Report, "r1", "u1", VoteKind::Like).unwrap();
        toggle_vote(&conn, VoteTable::Report, "r1", "m1", VoteKind::Like).unwrap();
        toggle_vote(&conn, VoteTable::Report, "r1", "m2", VoteKind::Dislike).unwrap();

        let likes = voters(&conn, VoteTable::Report, "r1", VoteKind::Like).unwrap();
        assert_eq!(likes, vec!["u1".to_string(), "m1".to_string()]);
        let dislikes = voters(&conn, VoteTable::Report, "r1", VoteKind::Dislike).unwrap();
        assert_eq!(dislikes, vec!["m2".to_string()]);
    }

    #[test]
    fn plain_like_flips_membership() {
        let conn = test_conn();
        seed_report(&conn);
        conn.execute(
            "INSERT INTO report_comments (id, report_id, text, created_by) VALUES ('c1', 'r1', 'hi', 'u1')",
            [],
        )
        .unwrap();

        assert!(toggle_like(&conn, "report_comment_likes", "comment_id", "c1", "u1").unwrap());
        assert_eq!(
            likers(&conn, "report_comment_likes", "comment_id", "c1").unwrap(),
            vec!["u1".to_string()]
        );
        assert!(!toggle_like(&conn, "report_comment_likes", "comment_id", "c1", "u1").unwrap());
        assert!(likers(&conn, "report_comment_likes", "comment_id", "c1")
            .unwrap()
            .is_empty());
    }
}
