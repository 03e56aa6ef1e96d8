pub mod admin;
pub mod donations;
pub mod location;
pub mod media;
pub mod member;
pub mod notice_comments;
pub mod notices;
pub mod payments;
pub mod registration;
pub mod report_comments;
pub mod reports;

use axum::Router;
use serde::Deserialize;

use crate::auth::password::verify_password;
use crate::db::accounts::{self, AccountKind};
use crate::db::models::Credentials;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Every API route, ready for state and layers.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(location::router())
        .merge(registration::router())
        .merge(member::router())
        .merge(admin::router())
        .merge(reports::router())
        .merge(report_comments::router())
        .merge(notices::router())
        .merge(notice_comments::router())
        .merge(donations::router())
        .merge(payments::router())
        .merge(media::router())
}

/// Trimmed, non-empty value of an optional body field.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Check an email/password pair against one account table. Unknown email
/// and wrong password are indistinguishable to the caller.
pub(crate) fn authenticate(
    state: &AppState,
    kind: AccountKind,
    body: &LoginBody,
) -> AppResult<Credentials> {
    let password = body.password.as_deref().filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (present(&body.email), password) else {
        return Err(AppError::validation("All fields are required"));
    };

    let conn = state.db.get()?;
    let credentials = accounts::credentials_by_email(&conn, kind, email)?
        .ok_or(AppError::InvalidCredentials)?;
    if !verify_password(password, &credentials.password_hash) {
        tracing::warn!("Failed {:?} login for {}", kind, email);
        return Err(AppError::InvalidCredentials);
    }
    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_ignores_blank() {
        assert_eq!(present(&Some(" a ".into())), Some("a"));
        assert_eq!(present(&Some("  ".into())), None);
        assert_eq!(present(&None), None);
    }
}
