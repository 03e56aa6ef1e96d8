use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::models::NoticeComment;
use crate::db::notices;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, JsonBody};
use crate::routes::present;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateCommentBody {
    pub text: Option<String>,
    #[serde(rename = "NoticeId", alias = "noticeId")]
    pub notice_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/noticecomment", post(create_comment))
        .route(
            "/noticecomment/{id}",
            get(list_comments).delete(delete_comment),
        )
        .route("/noticecomment/{id}/like", patch(like_comment))
}

async fn create_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(body): JsonBody<CreateCommentBody>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let (Some(text), Some(notice_id)) = (present(&body.text), present(&body.notice_id)) else {
        return Err(AppError::validation("Text and Notice Id required"));
    };

    let mut conn = state.db.get()?;
    let comment = notices::add_comment(&mut conn, notice_id, text, &user.id)?
        .ok_or_else(|| AppError::not_found("Notice not found"))?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Comment added successfully", "comment": comment })),
    ))
}

async fn list_comments(
    State(state): State<AppState>,
    Path(notice_id): Path<String>,
) -> AppResult<Json<Vec<NoticeComment>>> {
    let conn = state.db.get()?;
    Ok(Json(notices::list_comments(&conn, &notice_id)?))
}

async fn like_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let mut conn = state.db.get()?;
    let likes = notices::toggle_comment_like(&mut conn, &id, &user.id)?
        .ok_or_else(|| AppError::not_found("Comment not found"))?;
    Ok(Json(json!({ "message": "like updated", "likes": likes })))
}

async fn delete_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    let author = notices::comment_author(&conn, &id)?
        .ok_or_else(|| AppError::not_found("Comment not found"))?;
    if author != user.id && !user.is_admin() {
        return Err(AppError::forbidden("Not authorized to delete this comment"));
    }

    notices::delete_comment(&conn, &id)?;
    Ok(Json(json!({ "message": "Comment deleted successfully" })))
}
