//! Availability endpoints. Every read here sweeps expired blocks first,
//! so a block whose start has passed is never offered.

use std::str::FromStr;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::Reason;
use crate::scheduling::AppointmentView;

#[derive(Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

fn parse_reason(raw: &str) -> Result<Reason, ApiError> {
    Reason::from_str(&raw.to_ascii_uppercase())
        .map_err(|_| ApiError::BadRequest(format!("Unknown reason: {raw}")))
}

/// `GET /appointment/available`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    let views = ctx.run_engine(|e| e.available()).await?;
    Ok(Json(views))
}

/// `GET /appointment/available/reason/:reason`
pub async fn by_reason(
    State(ctx): State<ApiContext>,
    Path(reason): Path<String>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    let reason = parse_reason(&reason)?;
    let views = ctx.run_engine(move |e| e.available_by_reason(reason)).await?;
    Ok(Json(views))
}

/// `GET /appointment/available/reason/:reason/date?date=YYYY-MM-DD`
pub async fn by_reason_and_date(
    State(ctx): State<ApiContext>,
    Path(reason): Path<String>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    let reason = parse_reason(&reason)?;
    let Query(DateQuery { date }) = query?;
    let views = ctx
        .run_engine(move |e| e.available_by_reason_and_date(reason, date))
        .await?;
    Ok(Json(views))
}

/// `GET /appointment/available/reason/:reason/days`
pub async fn days(
    State(ctx): State<ApiContext>,
    Path(reason): Path<String>,
) -> Result<Json<Vec<NaiveDate>>, ApiError> {
    let reason = parse_reason(&reason)?;
    let days = ctx.run_engine(move |e| e.available_days(reason)).await?;
    Ok(Json(days))
}
