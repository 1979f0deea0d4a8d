use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::ShiurId,
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CycleQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HolidayQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CycleRecommendationResponse {
    pub selector: String,
    pub date: NaiveDate,
    pub shiurim: Vec<ShiurId>,
}

#[derive(Debug, Serialize)]
pub struct HolidayRecommendationResponse {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub shiurim: Vec<ShiurId>,
}

/// Parses an optional `YYYY-MM-DD` query value, defaulting to today
fn parse_date(field: &str, value: Option<&str>) -> AppResult<NaiveDate> {
    match value {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
            AppError::InvalidInput(format!("{} must be a YYYY-MM-DD date, got '{}'", field, raw))
        }),
        None => Ok(Local::now().date_naive()),
    }
}

/// Handler for calendar cycle recommendations
pub async fn cycle(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(selector): Path<String>,
    Query(query): Query<CycleQuery>,
) -> AppResult<Json<CycleRecommendationResponse>> {
    let date = parse_date("date", query.date.as_deref())?;

    tracing::info!(
        request_id = %request_id,
        selector = %selector,
        date = %date,
        "Processing cycle recommendation request"
    );

    let shiurim = state
        .recommendations
        .get_recommendations(&selector, date)
        .await?;

    Ok(Json(CycleRecommendationResponse {
        selector,
        date,
        shiurim,
    }))
}

/// Handler for holiday and rosh chodesh recommendations
pub async fn holidays(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<HolidayQuery>,
) -> AppResult<Json<HolidayRecommendationResponse>> {
    let start = parse_date("start", query.start.as_deref())?;
    let end = match query.end.as_deref() {
        Some(raw) => parse_date("end", Some(raw))?,
        None => state.recommendations.holiday_window_end(start)?,
    };

    tracing::info!(
        request_id = %request_id,
        start = %start,
        end = %end,
        "Processing holiday recommendation request"
    );

    let shiurim = state
        .recommendations
        .get_holiday_recommendations(start, end)
        .await?;

    Ok(Json(HolidayRecommendationResponse {
        start,
        end,
        shiurim,
    }))
}
