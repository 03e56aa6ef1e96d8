use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::models::ReportComment;
use crate::db::reports::{self, ReplyLike};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, JsonBody};
use crate::routes::present;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentBody {
    pub text: Option<String>,
    pub issue_id: Option<String>,
}

#[derive(Deserialize)]
pub struct ReplyBody {
    pub text: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/postcomment", post(create_comment))
        .route("/postcomment/{id}", get(list_comments).delete(delete_comment))
        .route("/postcomment/{id}/like", patch(like_comment))
        .route("/postcomment/{id}/reply", post(reply))
        .route(
            "/postcomment/{id}/reply/{reply_id}/like",
            patch(like_reply),
        )
}

async fn create_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(body): JsonBody<CreateCommentBody>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let (Some(text), Some(issue_id)) = (present(&body.text), present(&body.issue_id)) else {
        return Err(AppError::validation("Text and issueId are required"));
    };

    let mut conn = state.db.get()?;
    let comment = reports::add_comment(&mut conn, issue_id, text, &user.id)?
        .ok_or_else(|| AppError::not_found("Report not found"))?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Comment added successfully", "comment": comment })),
    ))
}

/// Comments on a report, newest first.
async fn list_comments(
    State(state): State<AppState>,
    Path(issue_id): Path<String>,
) -> AppResult<Json<Vec<ReportComment>>> {
    let conn = state.db.get()?;
    Ok(Json(reports::list_comments(&conn, &issue_id)?))
}

async fn like_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let mut conn = state.db.get()?;
    let comment = reports::toggle_comment_like(&mut conn, &id, &user.id)?
        .ok_or_else(|| AppError::not_found("Comment not found"))?;
    Ok(Json(json!({ "message": "Like status updated", "updatedComment": comment })))
}

async fn reply(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<ReplyBody>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let text = present(&body.text).ok_or_else(|| AppError::validation("Reply text is required"))?;

    let mut conn = state.db.get()?;
    let comment = reports::add_reply(&mut conn, &id, text, &user.id)?
        .ok_or_else(|| AppError::not_found("Comment not found"))?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Reply added", "updatedComment": comment })),
    ))
}

async fn like_reply(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, reply_id)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let mut conn = state.db.get()?;
    match reports::toggle_reply_like(&mut conn, &id, &reply_id, &user.id)? {
        ReplyLike::Updated(comment) => Ok(Json(json!({
            "message": "Reply like status updated",
            "updatedComment": comment,
        }))),
        ReplyLike::CommentNotFound => Err(AppError::not_found("Comment not found")),
        ReplyLike::ReplyNotFound => Err(AppError::not_found("Reply not found")),
    }
}

async fn delete_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    let author = reports::comment_author(&conn, &id)?
        .ok_or_else(|| AppError::not_found("Comment not found"))?;
    if author != user.id && !user.is_admin() {
        return Err(AppError::forbidden("Not authorized to delete this comment"));
    }

    reports::delete_comment(&conn, &id)?;
    Ok(Json(json!({ "message": "Comment deleted successfully" })))
}
