use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::DonationPost;
use super::new_id;

const DONATION_COLUMNS: &str =
    "id, title, description, image, goal_amount, collected_amount, created_at, updated_at";

fn donation_from_row(row: &Row<'_>) -> rusqlite::Result<DonationPost> {
    Ok(DonationPost {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        image: row.get(3)?,
        goal_amount: row.get(4)?,
        collected_amount: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// New donation drives always start with nothing collected.
pub fn insert_donation(
    conn: &Connection,
    title: &str,
    description: &str,
    image: &str,
    goal_amount: f64,
) -> rusqlite::Result<DonationPost> {
    let id = new_id();
    conn.execute(
        "INSERT INTO donation_posts (id, title, description, image, goal_amount, collected_amount)
         VALUES (?1, ?2, ?3, ?4, ?5, 0)",
        params![id, title, description, image, goal_amount],
    )?;
    get_donation(conn, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn get_donation(conn: &Connection, id: &str) -> rusqlite::Result<Option<DonationPost>> {
    conn.query_row(
        &format!("SELECT {} FROM donation_posts WHERE id = ?1", DONATION_COLUMNS),
        params![id],
        donation_from_row,
    )
    .optional()
}

pub fn list_donations(conn: &Connection) -> rusqlite::Result<Vec<DonationPost>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM donation_posts ORDER BY created_at DESC, rowid DESC",
        DONATION_COLUMNS
    ))?;
    let posts = stmt
        .query_map([], donation_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

#[derive(Debug, Default)]
pub struct DonationChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub goal_amount: Option<f64>,
    pub image: Option<String>,
}

pub fn update_donation(
    conn: &Connection,
    id: &str,
    changes: &DonationChanges,
) -> rusqlite::Result<Option<DonationPost>> {
    let updated = conn.execute(
        "UPDATE donation_posts SET
            title = COALESCE(?2, title),
            description = COALESCE(?3, description),
            goal_amount = COALESCE(?4, goal_amount),
            image = COALESCE(?5, image),
            updated_at = datetime('now')
         WHERE id = ?1",
        params![
            id,
            changes.title,
            changes.description,
            changes.goal_amount,
            changes.image
        ],
    )?;
    if updated == 0 {
        return Ok(None);
    }
    get_donation(conn, id)
}

pub fn delete_donation(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let deleted = conn.execute("DELETE FROM donation_posts WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn;

    #[test]
    fn new_post_starts_at_zero_collected() {
        let conn = test_conn();
        let post = insert_donation(&conn, "Flood relief", "Ward 3", "http://m/d.png", 50000.0)
            .unwrap();
        assert_eq!(post.goal_amount, 50000.0);
        assert_eq!(post.collected_amount, 0.0);
        assert_eq!(get_donation(&conn, &post.id).unwrap().unwrap().title, "Flood relief");
    }

    #[test]
    fn update_merges_and_keeps_collected() {
        let conn = test_conn();
        let post = insert_donation(&conn, "t", "d", "http://m/a.png", 0.0).unwrap();
        let updated = update_donation(
            &conn,
            &post.id,
            &DonationChanges {
                goal_amount: Some(1000.0),
                image: Some("http://m/b.png".into()),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(updated.goal_amount, 1000.0);
        assert_eq!(updated.image, "http://m/b.png");
        assert_eq!(updated.title, "t");
        assert_eq!(updated.collected_amount, 0.0);
        assert!(update_donation(&conn, "missing", &DonationChanges::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn list_newest_first_and_delete() {
        let conn = test_conn();
        let a = insert_donation(&conn, "a", "d", "http://m/a.png", 0.0).unwrap();
        let b = insert_donation(&conn, "b", "d", "http://m/b.png", 0.0).unwrap();
        let ids: Vec<String> = list_donations(&conn).unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![b.id.clone(), a.id.clone()]);

        assert!(delete_donation(&conn, &a.id).unwrap());
        assert!(!delete_donation(&conn, &a.id).unwrap());
    }
}
