use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::auth::password::hash_password;
use crate::auth::Role;
use crate::db::accounts::{self, AccountKind, NewUser};
use crate::db::locations::{self, AvailableLocations, HierarchyCheck};
use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::extractors::{JsonBody, UploadForm};
use crate::routes::{authenticate, LoginBody};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/registration", get(list_users))
        .route("/registration/register", post(register))
        .route("/registration/login", post(login))
        .route(
            "/registration/available-user-locations",
            get(available_user_locations),
        )
        .route("/registration/{id}", get(get_user))
}

async fn register(
    State(state): State<AppState>,
    form: UploadForm,
) -> AppResult<(StatusCode, Json<Value>)> {
    let (
        Some(name),
        Some(email),
        Some(password),
        Some(confirm),
        Some(district),
        Some(panchayath),
        Some(_),
    ) = (
        form.text("name"),
        form.text("email"),
        form.raw("password"),
        form.raw("confirmPassword"),
        form.text("district"),
        form.text("panchayath"),
        form.text("wardNo"),
    )
    else {
        return Err(AppError::validation("All fields are required"));
    };
    if password != confirm {
        return Err(AppError::validation("Passwords do not match"));
    }
    // A ward number that is not a number can never match the hierarchy
    let ward_no = form
        .parse::<i64>("wardNo")
        .map_err(|_| AppError::validation("Invalid ward for the selected panchayath"))?
        .unwrap_or_default();

    let mut conn = state.db.get()?;
    if accounts::email_taken(&conn, AccountKind::User, email)? {
        return Err(AppError::validation("Email already registered"));
    }

    // Seed the reference tables on first use, then check the chosen location
    locations::ensure_bootstrapped(&mut conn)?;
    match locations::validate_hierarchy(&conn, district, panchayath, ward_no)? {
        HierarchyCheck::Valid => {}
        HierarchyCheck::UnknownDistrict => return Err(AppError::validation("Invalid district")),
        HierarchyCheck::UnknownPanchayath => {
            return Err(AppError::validation(
                "Invalid panchayath for the selected district",
            ))
        }
        HierarchyCheck::UnknownWard => {
            return Err(AppError::validation(
                "Invalid ward for the selected panchayath",
            ))
        }
    }

    // Hash and persist
    let password_hash = hash_password(password, state.config.auth.bcrypt_cost)?;
    let user = accounts::insert_user(
        &conn,
        &NewUser {
            name,
            email,
            password_hash: &password_hash,
            district,
            panchayath,
            ward_no,
        },
    )?;
    tracing::info!("Registered user {}", user.id);

    let token = state.tokens.issue(&user.id, &user.name, &user.email, Role::User)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "token": token, "userId": user.id })),
    ))
}

async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginBody>,
) -> AppResult<Json<Value>> {
    let user = authenticate(&state, AccountKind::User, &body)?;
    let token = state.tokens.issue(&user.id, &user.name, &user.email, Role::User)?;
    Ok(Json(json!({ "token": token, "userId": user.id })))
}

async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let conn = state.db.get()?;
    Ok(Json(accounts::list_users(&conn)?))
}

async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<User>> {
    let conn = state.db.get()?;
    accounts::get_user(&conn, &id)?
        .map(Json)
        .ok_or_else(|| AppError::not_found("User not found"))
}

async fn available_user_locations(
    State(state): State<AppState>,
) -> AppResult<Json<AvailableLocations>> {
    let conn = state.db.get()?;
    Ok(Json(locations::available_user_locations(&conn)?))
}
