//! Doctor, client and pet views of the schedule.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext};
use crate::scheduling::{AppointmentView, SchedulePage};

#[derive(Deserialize, Default)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Serialize)]
pub struct ScheduledIdResponse {
    pub appointment_id: Uuid,
}

/// `GET /appointment/doctor/:doctor_id?page=&size=`
pub async fn doctor_schedule(
    State(ctx): State<ApiContext>,
    Path(doctor_id): Path<String>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<SchedulePage>, ApiError> {
    let doctor_id = parse_id(&doctor_id)?;
    let Query(PageQuery { page, size }) = query?;
    let schedule = ctx
        .run_engine(move |e| e.doctor_schedule(&doctor_id, page, size))
        .await?;
    Ok(Json(schedule))
}

/// `GET /appointment/doctor/:doctor_id/history`
pub async fn doctor_history(
    State(ctx): State<ApiContext>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    let doctor_id = parse_id(&doctor_id)?;
    let views = ctx.run_engine(move |e| e.doctor_history(&doctor_id)).await?;
    Ok(Json(views))
}

/// `GET /appointment/client/:client_id`
pub async fn client_appointments(
    State(ctx): State<ApiContext>,
    Path(client_id): Path<String>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    let client_id = parse_id(&client_id)?;
    let views = ctx
        .run_engine(move |e| e.client_appointments(&client_id))
        .await?;
    Ok(Json(views))
}

/// `GET /appointment/client/:client_id/history`
pub async fn client_history(
    State(ctx): State<ApiContext>,
    Path(client_id): Path<String>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    let client_id = parse_id(&client_id)?;
    let views = ctx.run_engine(move |e| e.client_history(&client_id)).await?;
    Ok(Json(views))
}

/// `GET /appointment/pet/:pet_id`
pub async fn pet_appointments(
    State(ctx): State<ApiContext>,
    Path(pet_id): Path<String>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    let pet_id = parse_id(&pet_id)?;
    let views = ctx.run_engine(move |e| e.pet_appointments(&pet_id)).await?;
    Ok(Json(views))
}

/// `GET /appointment/pet/:pet_id/all`
pub async fn pet_all(
    State(ctx): State<ApiContext>,
    Path(pet_id): Path<String>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    let pet_id = parse_id(&pet_id)?;
    let views = ctx.run_engine(move |e| e.pet_all(&pet_id)).await?;
    Ok(Json(views))
}

/// `GET /appointment/pet/:pet_id/scheduled-id`
pub async fn pet_scheduled_id(
    State(ctx): State<ApiContext>,
    Path(pet_id): Path<String>,
) -> Result<Json<ScheduledIdResponse>, ApiError> {
    let pet_id = parse_id(&pet_id)?;
    let appointment_id = ctx.run_engine(move |e| e.pet_scheduled_id(&pet_id)).await?;
    Ok(Json(ScheduledIdResponse { appointment_id }))
}
