use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Role;
use crate::db::models::{Category, Report, ReportStatus};
use crate::db::reports::{self, NewReport, ReportChanges};
use crate::db::votes::VoteKind;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, FileUpload, JsonBody, UploadForm};
use crate::media::{self, MAX_ATTACHMENTS};
use crate::state::AppState;

const MEDIA_FOLDER: &str = "reports";

#[derive(Deserialize)]
pub struct StatusBody {
    /// Kept loose so a non-string value is reported as an invalid status.
    pub status: Option<Value>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/userPost", get(list_reports).post(create_report))
        .route("/userPost/user/{id}", get(list_by_owner))
        .route(
            "/userPost/{id}",
            get(get_report).put(update_report).delete(delete_report),
        )
        .route("/userPost/{id}/status", patch(update_status))
        .route("/userPost/{id}/like", patch(like))
        .route("/userPost/{id}/dislike", patch(dislike))
        .route("/userPost/{id}/upvote", patch(upvote))
}

fn parse_category(raw: &str) -> AppResult<Category> {
    raw.parse()
        .map_err(|_| AppError::validation("Invalid category"))
}

fn parse_status(raw: &str) -> AppResult<ReportStatus> {
    raw.parse()
        .map_err(|_| AppError::validation("Invalid status value"))
}

fn check_attachment_count(files: &[FileUpload]) -> AppResult<()> {
    if files.len() > MAX_ATTACHMENTS {
        return Err(AppError::validation(format!(
            "At most {} media files are allowed",
            MAX_ATTACHMENTS
        )));
    }
    Ok(())
}

async fn create_report(
    State(state): State<AppState>,
    user: CurrentUser,
    mut form: UploadForm,
) -> AppResult<(StatusCode, Json<Value>)> {
    // Any signed-in account may file a report
    let files = form.take_files("media");
    let (Some(title), Some(description), Some(category), Some(location)) = (
        form.text("title"),
        form.text("description"),
        form.text("category"),
        form.text("location"),
    ) else {
        return Err(AppError::validation("All fields are required"));
    };
    let category = parse_category(category)?;
    let ward_no = form.parse::<i64>("wardNo")?;
    check_attachment_count(&files)?;

    // Store attachments first so the row only ever points at hosted files
    let media = media::upload_all(state.media.as_ref(), MEDIA_FOLDER, &files).await?;

    let conn = state.db.get()?;
    let report = reports::insert_report(
        &conn,
        &NewReport {
            title,
            description,
            category,
            media: &media,
            location,
            district: form.text("district"),
            panchayath: form.text("panchayath"),
            ward_no,
            created_by: &user.id,
        },
    )?;
    tracing::info!("User {} filed report {}", user.id, report.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Report created successfully", "report": report })),
    ))
}

async fn list_reports(State(state): State<AppState>) -> AppResult<Json<Vec<Report>>> {
    let conn = state.db.get()?;
    Ok(Json(reports::list_reports(&conn)?))
}

async fn get_report(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<Report>> {
    let conn = state.db.get()?;
    reports::get_report(&conn, &id)?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Report not found"))
}

async fn list_by_owner(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(owner_id): Path<String>,
) -> AppResult<Json<Vec<Report>>> {
    let conn = state.db.get()?;
    Ok(Json(reports::list_reports_by_owner(&conn, &owner_id)?))
}

async fn update_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    mut form: UploadForm,
) -> AppResult<Json<Value>> {
    // Authorize before touching the upload; the connection is dropped before any await
    {
        let conn = state.db.get()?;
        let owner = reports::report_owner(&conn, &id)?
            .ok_or_else(|| AppError::not_found("Report not found"))?;
        let may_edit = owner == user.id || matches!(user.role, Role::Member | Role::Admin);
        if !may_edit {
            return Err(AppError::forbidden("Not authorized to update this report"));
        }
    }

    let files = form.take_files("media");
    check_attachment_count(&files)?;
    let mut changes = ReportChanges {
        title: form.text_owned("title"),
        description: form.text_owned("description"),
        category: form.text("category").map(parse_category).transpose()?,
        location: form.text_owned("location"),
        district: form.text_owned("district"),
        panchayath: form.text_owned("panchayath"),
        ward_no: form.parse("wardNo")?,
        status: form.text("status").map(parse_status).transpose()?,
        media: None,
    };
    // New files replace the whole media list
    if !files.is_empty() {
        changes.media = Some(media::upload_all(state.media.as_ref(), MEDIA_FOLDER, &files).await?);
    }

    let conn = state.db.get()?;
    let report = reports::update_report(&conn, &id, &changes)?
        .ok_or_else(|| AppError::not_found("Report not found"))?;
    Ok(Json(json!({ "message": "Report updated successfully", "report": report })))
}

async fn update_status(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<StatusBody>,
) -> AppResult<Json<Value>> {
    let status = body
        .status
        .as_ref()
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::validation("Invalid status value"))
        .and_then(parse_status)?;

    let conn = state.db.get()?;
    let report = reports::set_status(&conn, &id, status)?
        .ok_or_else(|| AppError::not_found("Report not found"))?;
    Ok(Json(json!({ "message": "Status updated successfully", "report": report })))
}

async fn delete_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    let owner = reports::report_owner(&conn, &id)?
        .ok_or_else(|| AppError::not_found("Report not found"))?;
    if owner != user.id && !user.is_admin() {
        return Err(AppError::forbidden("Not authorized to delete this report"));
    }

    reports::delete_report(&conn, &id)?;
    tracing::info!("Report {} deleted by {}", id, user.id);
    Ok(Json(json!({ "message": "Report deleted successfully" })))
}

fn vote(state: &AppState, user: &CurrentUser, id: &str, kind: VoteKind) -> AppResult<Report> {
    let mut conn = state.db.get()?;
    reports::cast_vote(&mut conn, id, &user.id, kind)?
        .ok_or_else(|| AppError::not_found("Report not found"))
}

async fn like(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let report = vote(&state, &user, &id, VoteKind::Like)?;
    Ok(Json(json!({ "message": "Like updated", "updatedPost": report })))
}

async fn dislike(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let report = vote(&state, &user, &id, VoteKind::Dislike)?;
    Ok(Json(json!({ "message": "Dislike updated", "updatedPost": report })))
}

async fn upvote(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let report = vote(&state, &user, &id, VoteKind::Upvote)?;
    Ok(Json(json!({ "message": "Upvote updated", "updatedPost": report })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_is_exact() {
        assert_eq!(parse_status("Inprogress").unwrap(), ReportStatus::Inprogress);
        assert!(parse_status("Closed").is_err());
        assert!(parse_status("solved").is_err());
    }

    #[test]
    fn attachment_limit() {
        let file = FileUpload {
            field: "media".into(),
            file_name: "a.png".into(),
            content_type: None,
            data: bytes::Bytes::from_static(b"x"),
        };
        assert!(check_attachment_count(&vec![file.clone(); MAX_ATTACHMENTS]).is_ok());
        assert!(check_attachment_count(&vec![file; MAX_ATTACHMENTS + 1]).is_err());
    }
}
