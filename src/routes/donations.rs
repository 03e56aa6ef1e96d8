use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::auth::Role;
use crate::db::donations::{self, DonationChanges};
use crate::db::models::DonationPost;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, FileUpload, UploadForm};
use crate::media;
use crate::state::AppState;

const MEDIA_FOLDER: &str = "donations";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/donationpost", get(list_donations))
        .route("/donationpost/create", post(create_donation))
        .route(
            "/donationpost/{id}",
            get(get_donation).put(update_donation).delete(delete_donation),
        )
}

/// At most one image is accepted; extra parts are rejected rather than dropped.
fn single_image(mut files: Vec<FileUpload>) -> AppResult<Option<FileUpload>> {
    match files.len() {
        0 => Ok(None),
        1 => Ok(files.pop()),
        _ => Err(AppError::validation("Only one image file is allowed")),
    }
}

fn check_goal(goal_amount: f64) -> AppResult<f64> {
    if !goal_amount.is_finite() || goal_amount < 0.0 {
        return Err(AppError::validation("Invalid value for goalAmount"));
    }
    Ok(goal_amount)
}

async fn upload_image(state: &AppState, image: &FileUpload) -> AppResult<String> {
    let images = std::slice::from_ref(image);
    let mut urls = media::upload_all(state.media.as_ref(), MEDIA_FOLDER, images).await?;
    urls.pop()
        .ok_or_else(|| AppError::Internal("media host returned no url".into()))
}

async fn create_donation(
    State(state): State<AppState>,
    user: CurrentUser,
    mut form: UploadForm,
) -> AppResult<(StatusCode, Json<Value>)> {
    user.require_role(&[Role::Member, Role::Admin])?;

    let image = single_image(form.take_files("image"))?;
    let (Some(title), Some(description)) = (form.text("title"), form.text("description")) else {
        return Err(AppError::validation("Title and description are required"));
    };
    let Some(image) = image else {
        return Err(AppError::validation("Image file is required"));
    };
    let goal_amount = check_goal(form.parse::<f64>("goalAmount")?.unwrap_or(0.0))?;

    let image_url = upload_image(&state, &image).await?;

    let conn = state.db.get()?;
    let donation = donations::insert_donation(&conn, title, description, &image_url, goal_amount)?;
    tracing::info!("Donation post {} created by {}", donation.id, user.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Donation post created successfully", "donation": donation })),
    ))
}

async fn list_donations(State(state): State<AppState>) -> AppResult<Json<Vec<DonationPost>>> {
    let conn = state.db.get()?;
    Ok(Json(donations::list_donations(&conn)?))
}

async fn get_donation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DonationPost>> {
    let conn = state.db.get()?;
    donations::get_donation(&conn, &id)?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Donation post not found"))
}

async fn update_donation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    mut form: UploadForm,
) -> AppResult<Json<Value>> {
    user.require_role(&[Role::Member, Role::Admin])?;

    let image = single_image(form.take_files("image"))?;
    {
        let conn = state.db.get()?;
        if donations::get_donation(&conn, &id)?.is_none() {
            return Err(AppError::not_found("Donation post not found"));
        }
    }

    let mut changes = DonationChanges {
        title: form.text_owned("title"),
        description: form.text_owned("description"),
        goal_amount: form.parse::<f64>("goalAmount")?.map(check_goal).transpose()?,
        image: None,
    };
    if let Some(image) = image {
        changes.image = Some(upload_image(&state, &image).await?);
    }

    let conn = state.db.get()?;
    let donation = donations::update_donation(&conn, &id, &changes)?
        .ok_or_else(|| AppError::not_found("Donation post not found"))?;
    Ok(Json(json!({ "message": "Donation post updated successfully", "donation": donation })))
}

async fn delete_donation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    user.require_role(&[Role::Member, Role::Admin])?;

    // Look up the image URL, then release the connection before talking to the host
    let image = {
        let conn = state.db.get()?;
        donations::get_donation(&conn, &id)?
            .ok_or_else(|| AppError::not_found("Donation post not found"))?
            .image
    };

    // A stale or missing asset must not keep the post alive
    let public_id = media::public_id_from_url(&image, MEDIA_FOLDER);
    if let Err(e) = state.media.destroy(&public_id).await {
        tracing::warn!("Could not remove donation image {}: {}", public_id, e);
    }

    let conn = state.db.get()?;
    donations::delete_donation(&conn, &id)?;
    tracing::info!("Donation post {} deleted by {}", id, user.id);
    Ok(Json(json!({ "message": "Donation post deleted successfully" })))
}
