use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::auth::password::hash_password;
use crate::auth::Role;
use crate::db::accounts::{self, AccountKind, MemberChanges, NewMember};
use crate::db::models::Member;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, JsonBody, UploadForm};
use crate::routes::{authenticate, LoginBody};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/member", get(list_members))
        .route("/member/register", post(register))
        .route("/member/login", post(login))
        .route("/member/{id}", put(update_member).delete(delete_member))
}

async fn register(
    State(state): State<AppState>,
    form: UploadForm,
) -> AppResult<(StatusCode, Json<Value>)> {
    let (Some(name), Some(email), Some(password), Some(confirm), Some(phone)) = (
        form.text("name"),
        form.text("email"),
        form.raw("password"),
        form.raw("confirmPassword"),
        form.text("phone"),
    ) else {
        return Err(AppError::validation("All fields are required"));
    };
    let (Some(ward_no), Some(start_year), Some(end_year)) = (
        form.parse::<i64>("wardNo")?,
        form.parse::<i64>("startYear")?,
        form.parse::<i64>("endYear")?,
    ) else {
        return Err(AppError::validation("All fields are required"));
    };
    if password != confirm {
        return Err(AppError::validation("Passwords do not match"));
    }

    // Emails are unique per account type, so only members are checked
    let conn = state.db.get()?;
    if accounts::email_taken(&conn, AccountKind::Member, email)? {
        return Err(AppError::validation(
            "Member already registered with this email",
        ));
    }

    let password_hash = hash_password(password, state.config.auth.bcrypt_cost)?;
    let member = accounts::insert_member(
        &conn,
        &NewMember {
            name,
            email,
            password_hash: &password_hash,
            phone,
            ward_no,
            start_year,
            end_year,
            district: form.text("district"),
            panchayath: form.text("panchayath"),
        },
    )?;
    tracing::info!("Registered member {}", member.id);

    let token = state
        .tokens
        .issue(&member.id, &member.name, &member.email, Role::Member)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Member registered successfully",
            "member": member,
            "token": token,
        })),
    ))
}

async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginBody>,
) -> AppResult<Json<Value>> {
    let credentials = authenticate(&state, AccountKind::Member, &body)?;
    let conn = state.db.get()?;
    let member = accounts::get_member(&conn, &credentials.id)?
        .ok_or(AppError::InvalidCredentials)?;

    let token = state
        .tokens
        .issue(&member.id, &member.name, &member.email, Role::Member)?;
    Ok(Json(json!({
        "message": "Login successful",
        "member": member,
        "token": token,
    })))
}

async fn list_members(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<Member>>> {
    let conn = state.db.get()?;
    Ok(Json(accounts::list_members(&conn)?))
}

/// Members manage their own record; admins manage any.
fn ensure_self_or_admin(user: &CurrentUser, member_id: &str) -> AppResult<()> {
    let is_self = user.role == Role::Member && user.id == member_id;
    if is_self || user.is_admin() {
        Ok(())
    } else {
        Err(AppError::forbidden("Not authorized to modify this member"))
    }
}

async fn update_member(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    form: UploadForm,
) -> AppResult<Json<Value>> {
    ensure_self_or_admin(&user, &id)?;

    let password_hash = form
        .raw("password")
        .map(|p| hash_password(p, state.config.auth.bcrypt_cost))
        .transpose()?;
    let changes = MemberChanges {
        name: form.text_owned("name"),
        email: form.text_owned("email"),
        phone: form.text_owned("phone"),
        ward_no: form.parse("wardNo")?,
        start_year: form.parse("startYear")?,
        end_year: form.parse("endYear")?,
        district: form.text_owned("district"),
        panchayath: form.text_owned("panchayath"),
        password_hash,
    };

    let conn = state.db.get()?;
    if let Some(email) = changes.email.as_deref() {
        let owner = accounts::credentials_by_email(&conn, AccountKind::Member, email)?;
        if owner.is_some_and(|c| c.id != id) {
            return Err(AppError::validation(
                "Member already registered with this email",
            ));
        }
    }

    let member = accounts::update_member(&conn, &id, &changes)?
        .ok_or_else(|| AppError::not_found("Member not found"))?;
    Ok(Json(json!({
        "message": "Member updated successfully",
        "member": member,
    })))
}

async fn delete_member(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    ensure_self_or_admin(&user, &id)?;

    let conn = state.db.get()?;
    if !accounts::delete_member(&conn, &id)? {
        return Err(AppError::not_found("Member not found"));
    }
    tracing::info!("Deleted member {}", id);
    Ok(Json(json!({ "message": "Member deleted successfully" })))
}
