use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::new_id;

/// Reference hierarchy loaded into an empty database: district, then its
/// panchayaths with their ward counts.
const SEED: &[(&str, &[(&str, u32)])] = &[
    (
        "Ernakulam",
        &[("Aluva", 5), ("Kalamassery", 4), ("Kothamangalam", 3)],
    ),
    (
        "Thrissur",
        &[("Kodungallur", 5), ("Chalakudy", 3), ("Irinjalakuda", 4)],
    ),
];

/// Outcome of checking a (district, panchayath, ward) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyCheck {
    Valid,
    UnknownDistrict,
    UnknownPanchayath,
    UnknownWard,
}

/// Load the seed hierarchy when no districts exist. Safe to call on every
/// read: the count check and inserts share one immediate transaction.
pub fn ensure_bootstrapped(conn: &mut Connection) -> rusqlite::Result<bool> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let existing: i64 = tx.query_row("SELECT COUNT(*) FROM districts", [], |row| row.get(0))?;
    if existing > 0 {
        return Ok(false);
    }

    for (district, panchayaths) in SEED {
        let district_id = new_id();
        tx.execute(
            "INSERT INTO districts (id, name) VALUES (?1, ?2)",
            params![district_id, district],
        )?;
        for (panchayath, wards) in *panchayaths {
            let panchayath_id = new_id();
            tx.execute(
                "INSERT INTO panchayaths (id, name, district_id) VALUES (?1, ?2, ?3)",
                params![panchayath_id, panchayath, district_id],
            )?;
            for number in 1..=*wards {
                tx.execute(
                    "INSERT INTO wards (id, number, panchayath_id) VALUES (?1, ?2, ?3)",
                    params![new_id(), number.to_string(), panchayath_id],
                )?;
            }
        }
    }

    tx.commit()?;
    tracing::info!("Seeded location hierarchy ({} districts)", SEED.len());
    Ok(true)
}

pub fn list_districts(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM districts ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

fn district_id(conn: &Connection, district: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT id FROM districts WHERE name = ?1",
        params![district],
        |row| row.get(0),
    )
    .optional()
}

fn panchayath_id(
    conn: &Connection,
    district_id: &str,
    panchayath: &str,
) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT id FROM panchayaths WHERE name = ?1 AND district_id = ?2",
        params![panchayath, district_id],
        |row| row.get(0),
    )
    .optional()
}

/// Panchayath names in a district, or `None` if the district is unknown.
pub fn list_panchayaths(conn: &Connection, district: &str) -> rusqlite::Result<Option<Vec<String>>> {
    let Some(district_id) = district_id(conn, district)? else {
        return Ok(None);
    };
    let mut stmt =
        conn.prepare("SELECT name FROM panchayaths WHERE district_id = ?1 ORDER BY name")?;
    let names = stmt
        .query_map(params![district_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(Some(names))
}

#[derive(Debug, PartialEq, Eq)]
pub enum WardLookup {
    Found(Vec<String>),
    UnknownDistrict,
    UnknownPanchayath,
}

/// Ward numbers of a panchayath, in numeric order.
pub fn list_wards(conn: &Connection, district: &str, panchayath: &str) -> rusqlite::Result<WardLookup> {
    let Some(district_id) = district_id(conn, district)? else {
        return Ok(WardLookup::UnknownDistrict);
    };
    let Some(panchayath_id) = panchayath_id(conn, &district_id, panchayath)? else {
        return Ok(WardLookup::UnknownPanchayath);
    };
    let mut stmt = conn.prepare(
        "SELECT number FROM wards WHERE panchayath_id = ?1
         ORDER BY CAST(number AS INTEGER), number",
    )?;
    let numbers = stmt
        .query_map(params![panchayath_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(WardLookup::Found(numbers))
}

pub fn validate_hierarchy(
    conn: &Connection,
    district: &str,
    panchayath: &str,
    ward_no: i64,
) -> rusqlite::Result<HierarchyCheck> {
    let Some(district_id) = district_id(conn, district)? else {
        return Ok(HierarchyCheck::UnknownDistrict);
    };
    let Some(panchayath_id) = panchayath_id(conn, &district_id, panchayath)? else {
        return Ok(HierarchyCheck::UnknownPanchayath);
    };
    let ward_exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM wards WHERE panchayath_id = ?1 AND number = ?2",
        params![panchayath_id, ward_no.to_string()],
        |row| row.get(0),
    )?;
    Ok(if ward_exists {
        HierarchyCheck::Valid
    } else {
        HierarchyCheck::UnknownWard
    })
}

/// Locations mined from member records rather than the reference tables.
#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableLocations {
    pub districts: Vec<String>,
    pub panchayaths: Vec<String>,
    pub ward_nos: Vec<i64>,
}

pub fn available_user_locations(conn: &Connection) -> rusqlite::Result<AvailableLocations> {
    let districts = conn
        .prepare(
            "SELECT DISTINCT district FROM members
             WHERE district IS NOT NULL AND district <> '' ORDER BY district",
        )?
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    let panchayaths = conn
        .prepare(
            "SELECT DISTINCT panchayath FROM members
             WHERE panchayath IS NOT NULL AND panchayath <> '' ORDER BY panchayath",
        )?
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    let ward_nos = conn
        .prepare("SELECT DISTINCT ward_no FROM members ORDER BY ward_no")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;

    Ok(AvailableLocations {
        districts,
        panchayaths,
        ward_nos,
    })
}
