use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Implements text round-tripping (Display/FromStr/ToSql/FromSql) for a
/// fieldless enum stored as TEXT.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(()),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                text.parse().map_err(|_| {
                    FromSqlError::Other(format!("unknown {} value: {}", stringify!($name), text).into())
                })
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Education,
    Roads,
    Agriculture,
    Waste,
    Electricity,
    Water,
}

text_enum!(Category {
    Education => "Education",
    Roads => "Roads",
    Agriculture => "Agriculture",
    Waste => "Waste",
    Electricity => "Electricity",
    Water => "Water",
});

/// Report progress. Any value may be set from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    Pending,
    Inprogress,
    Solved,
}

text_enum!(ReportStatus {
    Pending => "Pending",
    Inprogress => "Inprogress",
    Solved => "Solved",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

text_enum!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
});

/// A populated author reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRef {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl ActorRef {
    /// Read an `(id, name, email)` triple from a LEFT JOIN on `actors`.
    pub(crate) fn from_columns(row: &rusqlite::Row<'_>, start: usize) -> rusqlite::Result<Option<Self>> {
        let id: Option<String> = row.get(start)?;
        Ok(match id {
            Some(id) => Some(ActorRef {
                id,
                name: row.get(start + 1)?,
                email: row.get(start + 2)?,
            }),
            None => None,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub district: String,
    pub panchayath: String,
    pub ward_no: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub ward_no: i64,
    pub start_year: i64,
    pub end_year: i64,
    pub district: Option<String>,
    pub panchayath: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Stored login material for any account type.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub media: Vec<String>,
    pub location: String,
    pub district: Option<String>,
    pub panchayath: Option<String>,
    pub ward_no: Option<i64>,
    pub status: ReportStatus,
    pub created_by: Option<ActorRef>,
    pub comments: Vec<ReportComment>,
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub upvotes: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportComment {
    pub id: String,
    pub issue_id: String,
    pub text: String,
    pub created_by: Option<ActorRef>,
    pub likes: Vec<String>,
    pub replies: Vec<Reply>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: String,
    pub text: String,
    pub created_by: Option<ActorRef>,
    pub likes: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: String,
    pub title: String,
    pub content: String,
    pub media: Vec<String>,
    pub created_by: Option<ActorRef>,
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeComment {
    pub id: String,
    pub notice_id: String,
    pub text: String,
    pub created_by: Option<ActorRef>,
    pub likes: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationPost {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub goal_amount: f64,
    pub collected_amount: f64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub method: String,
    pub payment_id: Option<String>,
    pub status: PaymentStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Decode a JSON string column holding a list of media URLs.
pub(crate) fn media_from_column(raw: String) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn media_to_column(media: &[String]) -> String {
    serde_json::to_string(media).unwrap_or_else(|_| "[]".to_string())
}
