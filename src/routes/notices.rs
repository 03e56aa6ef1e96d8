use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::auth::Role;
use crate::db::models::Notice;
use crate::db::notices::{self, NoticeChanges};
use crate::db::votes::VoteKind;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, UploadForm};
use crate::media::{self, MAX_ATTACHMENTS};
use crate::state::AppState;

const MEDIA_FOLDER: &str = "notices";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notice", get(list_notices).post(create_notice))
        .route(
            "/notice/{id}",
            get(get_notice).put(update_notice).delete(delete_notice),
        )
        .route("/notice/{id}/like", put(like))
        .route("/notice/{id}/dislike", put(dislike))
}

async fn create_notice(
    State(state): State<AppState>,
    user: CurrentUser,
    mut form: UploadForm,
) -> AppResult<(StatusCode, Json<Value>)> {
    user.require_role(&[Role::Member])?;

    let files = form.take_files("media");
    let (Some(title), Some(content)) = (form.text("title"), form.text("content")) else {
        return Err(AppError::validation("Title and Content are required"));
    };
    if files.len() > MAX_ATTACHMENTS {
        return Err(AppError::validation(format!(
            "At most {} media files are allowed",
            MAX_ATTACHMENTS
        )));
    }

    let media = media::upload_all(state.media.as_ref(), MEDIA_FOLDER, &files).await?;

    let conn = state.db.get()?;
    let notice = notices::insert_notice(&conn, title, content, &media, &user.id)?;
    tracing::info!("Member {} posted notice {}", user.id, notice.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Notice created successfully", "notice": notice })),
    ))
}

async fn list_notices(State(state): State<AppState>) -> AppResult<Json<Vec<Notice>>> {
    let conn = state.db.get()?;
    Ok(Json(notices::list_notices(&conn)?))
}

async fn get_notice(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Notice>> {
    let conn = state.db.get()?;
    notices::get_notice(&conn, &id)?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Notice not found"))
}

async fn update_notice(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    mut form: UploadForm,
) -> AppResult<Json<Value>> {
    user.require_role(&[Role::Member, Role::Admin])?;

    let files = form.take_files("media");
    if files.len() > MAX_ATTACHMENTS {
        return Err(AppError::validation(format!(
            "At most {} media files are allowed",
            MAX_ATTACHMENTS
        )));
    }
    {
        let conn = state.db.get()?;
        if notices::get_notice(&conn, &id)?.is_none() {
            return Err(AppError::not_found("Notice not found"));
        }
    }

    let mut changes = NoticeChanges {
        title: form.text_owned("title"),
        content: form.text_owned("content"),
        media: None,
    };
    if !files.is_empty() {
        changes.media = Some(media::upload_all(state.media.as_ref(), MEDIA_FOLDER, &files).await?);
    }

    let conn = state.db.get()?;
    let notice = notices::update_notice(&conn, &id, &changes)?
        .ok_or_else(|| AppError::not_found("Notice not found"))?;
    Ok(Json(json!({ "message": "Notice updated successfully", "notice": notice })))
}

async fn delete_notice(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    user.require_role(&[Role::Member, Role::Admin])?;

    let conn = state.db.get()?;
    if !notices::delete_notice(&conn, &id)? {
        return Err(AppError::not_found("Notice not found"));
    }
    tracing::info!("Notice {} deleted by {}", id, user.id);
    Ok(Json(json!({ "message": "Notice deleted successfully" })))
}

fn vote(state: &AppState, user: &CurrentUser, id: &str, kind: VoteKind) -> AppResult<Notice> {
    let mut conn = state.db.get()?;
    notices::cast_vote(&mut conn, id, &user.id, kind)?
        .ok_or_else(|| AppError::not_found("Notice not found"))
}

async fn like(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let notice = vote(&state, &user, &id, VoteKind::Like)?;
    Ok(Json(json!({ "message": "Like status updated", "notice": notice })))
}

async fn dislike(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let notice = vote(&state, &user, &id, VoteKind::Dislike)?;
    Ok(Json(json!({ "message": "Dislike status updated", "notice": notice })))
}
