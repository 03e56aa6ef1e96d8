use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::password::hash_password;
use crate::auth::Role;
use crate::db::accounts::{self, AccountKind};
use crate::db::models::Admin;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, JsonBody};
use crate::routes::{authenticate, present, LoginBody};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterAdminBody {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/register", post(register))
        .route("/admin/login", post(login))
        .route("/admin/profile", get(profile))
}

fn admin_session(state: &AppState, id: &str, name: &str, email: &str) -> AppResult<Value> {
    let token = state.tokens.issue(id, name, email, Role::Admin)?;
    Ok(json!({ "id": id, "name": name, "email": email, "token": token }))
}

async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterAdminBody>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let password = body.password.as_deref().filter(|p| !p.is_empty());
    let (Some(name), Some(email), Some(password)) =
        (present(&body.name), present(&body.email), password)
    else {
        return Err(AppError::validation("All fields are required"));
    };

    let conn = state.db.get()?;
    if accounts::email_taken(&conn, AccountKind::Admin, email)? {
        return Err(AppError::validation("Admin already exists"));
    }

    let password_hash = hash_password(password, state.config.auth.bcrypt_cost)?;
    let admin = accounts::insert_admin(&conn, name, email, &password_hash)?;
    tracing::info!("Registered admin {}", admin.id);

    let session = admin_session(&state, &admin.id, &admin.name, &admin.email)?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginBody>,
) -> AppResult<Json<Value>> {
    let admin = authenticate(&state, AccountKind::Admin, &body)?;
    Ok(Json(admin_session(&state, &admin.id, &admin.name, &admin.email)?))
}

async fn profile(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<Admin>> {
    let conn = state.db.get()?;
    accounts::get_admin(&conn, &user.id)?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Admin not found"))
}
