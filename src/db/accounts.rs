use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{Admin, Credentials, Member, User};
use super::new_id;

const USER_COLUMNS: &str = "id, name, email, district, panchayath, ward_no, created_at, updated_at";
const MEMBER_COLUMNS: &str = "id, name, email, phone, ward_no, start_year, end_year, district, panchayath, created_at, updated_at";
const ADMIN_COLUMNS: &str = "id, name, email, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        district: row.get(3)?,
        panchayath: row.get(4)?,
        ward_no: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        ward_no: row.get(4)?,
        start_year: row.get(5)?,
        end_year: row.get(6)?,
        district: row.get(7)?,
        panchayath: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn admin_from_row(row: &Row<'_>) -> rusqlite::Result<Admin> {
    Ok(Admin {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// Account tables share the credential columns, so lookups are generic over
/// the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    User,
    Member,
    Admin,
}

impl AccountKind {
    fn table(&self) -> &'static str {
        match self {
            AccountKind::User => "users",
            AccountKind::Member => "members",
            AccountKind::Admin => "admins",
        }
    }
}

pub fn email_taken(conn: &Connection, kind: AccountKind, email: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        &format!("SELECT COUNT(*) > 0 FROM {} WHERE email = ?1", kind.table()),
        params![email],
        |row| row.get(0),
    )
}

pub fn credentials_by_email(
    conn: &Connection,
    kind: AccountKind,
    email: &str,
) -> rusqlite::Result<Option<Credentials>> {
    conn.query_row(
        &format!(
            "SELECT id, name, email, password_hash FROM {} WHERE email = ?1",
            kind.table()
        ),
        params![email],
        |row| {
            Ok(Credentials {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                password_hash: row.get(3)?,
            })
        },
    )
    .optional()
}

// Users

pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub district: &'a str,
    pub panchayath: &'a str,
    pub ward_no: i64,
}

pub fn insert_user(conn: &Connection, user: &NewUser<'_>) -> rusqlite::Result<User> {
    let id = new_id();
    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, district, panchayath, ward_no)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            user.name,
            user.email,
            user.password_hash,
            user.district,
            user.panchayath,
            user.ward_no
        ],
    )?;
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        params![id],
        user_from_row,
    )
}

pub fn get_user(conn: &Connection, id: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        params![id],
        user_from_row,
    )
    .optional()
}

pub fn list_users(conn: &Connection) -> rusqlite::Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users ORDER BY created_at DESC, rowid DESC",
        USER_COLUMNS
    ))?;
    let users = stmt
        .query_map([], user_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

// Members

pub struct NewMember<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub phone: &'a str,
    pub ward_no: i64,
    pub start_year: i64,
    pub end_year: i64,
    pub district: Option<&'a str>,
    pub panchayath: Option<&'a str>,
}

pub fn insert_member(conn: &Connection, member: &NewMember<'_>) -> rusqlite::Result<Member> {
    let id = new_id();
    conn.execute(
        "INSERT INTO members (id, name, email, password_hash, phone, ward_no, start_year, end_year, district, panchayath)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id,
            member.name,
            member.email,
            member.password_hash,
            member.phone,
            member.ward_no,
            member.start_year,
            member.end_year,
            member.district,
            member.panchayath
        ],
    )?;
    conn.query_row(
        &format!("SELECT {} FROM members WHERE id = ?1", MEMBER_COLUMNS),
        params![id],
        member_from_row,
    )
}

pub fn get_member(conn: &Connection, id: &str) -> rusqlite::Result<Option<Member>> {
    conn.query_row(
        &format!("SELECT {} FROM members WHERE id = ?1", MEMBER_COLUMNS),
        params![id],
        member_from_row,
    )
    .optional()
}

pub fn list_members(conn: &Connection) -> rusqlite::Result<Vec<Member>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM members ORDER BY created_at DESC, rowid DESC",
        MEMBER_COLUMNS
    ))?;
    let members = stmt
        .query_map([], member_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(members)
}

/// Fields a member update may touch. `None` leaves the column as is.
#[derive(Debug, Default)]
pub struct MemberChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub ward_no: Option<i64>,
    pub start_year: Option<i64>,
    pub end_year: Option<i64>,
    pub district: Option<String>,
    pub panchayath: Option<String>,
    pub password_hash: Option<String>,
}

pub fn update_member(
    conn: &Connection,
    id: &str,
    changes: &MemberChanges,
) -> rusqlite::Result<Option<Member>> {
    let updated = conn.execute(
        "UPDATE members SET
            name = COALESCE(?2, name),
            email = COALESCE(?3, email),
            phone = COALESCE(?4, phone),
            ward_no = COALESCE(?5, ward_no),
            start_year = COALESCE(?6, start_year),
            end_year = COALESCE(?7, end_year),
            district = COALESCE(?8, district),
            panchayath = COALESCE(?9, panchayath),
            password_hash = COALESCE(?10, password_hash),
            updated_at = datetime('now')
         WHERE id = ?1",
        params![
            id,
            changes.name,
            changes.email,
            changes.phone,
            changes.ward_no,
            changes.start_year,
            changes.end_year,
            changes.district,
            changes.panchayath,
            changes.password_hash
        ],
    )?;
    if updated == 0 {
        return Ok(None);
    }
    get_member(conn, id)
}

pub fn delete_member(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let deleted = conn.execute("DELETE FROM members WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

// Admins

pub fn insert_admin(
    conn: &Connection,
    name: &str,
    email: &str,
    password_hash: &str,
) -> rusqlite::Result<Admin> {
    let id = new_id();
    conn.execute(
        "INSERT INTO admins (id, name, email, password_hash) VALUES (?1, ?2, ?3, ?4)",
        params![id, name, email, password_hash],
    )?;
    conn.query_row(
        &format!("SELECT {} FROM admins WHERE id = ?1", ADMIN_COLUMNS),
        params![id],
        admin_from_row,
    )
}

pub fn get_admin(conn: &Connection, id: &str) -> rusqlite::Result<Option<Admin>> {
    conn.query_row(
        &format!("SELECT {} FROM admins WHERE id = ?1", ADMIN_COLUMNS),
        params![id],
        admin_from_row,
    )
    .optional()
}
