use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::locations::{self, WardLookup};
use crate::error::{AppError, AppResult};
use crate::routes::present;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LocationQuery {
    pub district: Option<String>,
    pub panchayath: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/location/districts", get(districts))
        .route("/location/panchayaths", get(panchayaths))
        .route("/location/wards", get(wards))
}

async fn districts(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    let mut conn = state.db.get()?;
    locations::ensure_bootstrapped(&mut conn)?;
    Ok(Json(locations::list_districts(&conn)?))
}

async fn panchayaths(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> AppResult<Json<Vec<String>>> {
    let mut conn = state.db.get()?;
    locations::ensure_bootstrapped(&mut conn)?;

    let district = present(&query.district).ok_or_else(|| AppError::validation("district is required"))?;
    locations::list_panchayaths(&conn, district)?
        .map(Json)
        .ok_or_else(|| AppError::not_found("district not found"))
}

async fn wards(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> AppResult<Json<Vec<String>>> {
    let mut conn = state.db.get()?;
    locations::ensure_bootstrapped(&mut conn)?;

    let (Some(district), Some(panchayath)) = (present(&query.district), present(&query.panchayath))
    else {
        return Err(AppError::validation("district and panchayath are required"));
    };
    match locations::list_wards(&conn, district, panchayath)? {
        WardLookup::Found(wards) => Ok(Json(wards)),
        WardLookup::UnknownDistrict => Err(AppError::not_found("district not found")),
        WardLookup::UnknownPanchayath => Err(AppError::not_found("panchayath not found")),
    }
}
