//! Appointment lifecycle endpoints.
//!
//! - `POST   /appointment/create` : one block
//! - `POST   /appointment/create-multiple` : tile a range
//! - `POST   /appointment/uploadAvailability/:doctor` : bounded, all-or-nothing
//! - `PATCH  /appointment/assign/:id` : book for a pet
//! - `PATCH  /appointment/approve/:id` / `disapprove/:id`
//! - `DELETE /appointment/cancel/:id`
//! - `PATCH  /appointment/complete/:id` : link diagnosis
//! - `GET    /appointment/:id`, `/appointment/all`

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext};
use crate::scheduling::{AppointmentView, AvailabilityRequest, BlockRequest, Detail};

#[derive(Deserialize)]
pub struct AssignRequest {
    #[serde(alias = "petId")]
    pub pet_id: Uuid,
}

#[derive(Deserialize)]
pub struct CompleteRequest {
    #[serde(alias = "diagnosisId")]
    pub diagnosis_id: Uuid,
}

#[derive(Serialize)]
pub struct BulkResponse {
    pub created: Vec<AppointmentView>,
    pub skipped: usize,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub created: usize,
    pub appointments: Vec<AppointmentView>,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub canceled: AppointmentView,
    pub replacement: Option<AppointmentView>,
}

/// `POST /appointment/create`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<BlockRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AppointmentView>), ApiError> {
    let Json(req) = payload?;
    let view = ctx
        .run_engine(move |e| {
            let appt = e.create_single(&req)?;
            e.view(&appt, Detail::BASIC)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `POST /appointment/create-multiple`
pub async fn create_multiple(
    State(ctx): State<ApiContext>,
    payload: Result<Json<BlockRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BulkResponse>), ApiError> {
    let Json(req) = payload?;
    let response = ctx
        .run_engine(move |e| {
            let outcome = e.create_bulk(&req)?;
            let created = outcome
                .created
                .iter()
                .map(|a| e.view(a, Detail::BASIC))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(BulkResponse {
                created,
                skipped: outcome.skipped,
            })
        })
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /appointment/uploadAvailability/:doctor_id`
pub async fn upload_availability(
    State(ctx): State<ApiContext>,
    Path(doctor_id): Path<String>,
    payload: Result<Json<AvailabilityRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let doctor_id = parse_id(&doctor_id)?;
    let Json(req) = payload?;
    let response = ctx
        .run_engine(move |e| {
            let created = e.upload_availability(&doctor_id, &req)?;
            let appointments = created
                .iter()
                .map(|a| e.view(a, Detail::BASIC))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(UploadResponse {
                created: appointments.len(),
                appointments,
            })
        })
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `PATCH /appointment/assign/:id`
pub async fn assign(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<AssignRequest>, JsonRejection>,
) -> Result<Json<AppointmentView>, ApiError> {
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    let view = ctx
        .run_engine(move |e| {
            let appt = e.book(&id, &req.pet_id)?;
            e.view(&appt, Detail::WITH_CLIENT)
        })
        .await?;
    Ok(Json(view))
}

/// `PATCH /appointment/approve/:id`
pub async fn approve(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentView>, ApiError> {
    let id = parse_id(&id)?;
    let view = ctx
        .run_engine(move |e| {
            let appt = e.approve(&id)?;
            e.view(&appt, Detail::WITH_CLIENT)
        })
        .await?;
    Ok(Json(view))
}

/// `PATCH /appointment/disapprove/:id`
pub async fn disapprove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentView>, ApiError> {
    let id = parse_id(&id)?;
    let view = ctx
        .run_engine(move |e| {
            let appt = e.disapprove(&id)?;
            e.view(&appt, Detail::WITH_CLIENT)
        })
        .await?;
    Ok(Json(view))
}

/// `DELETE /appointment/cancel/:id`
pub async fn cancel(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let id = parse_id(&id)?;
    let response = ctx
        .run_engine(move |e| {
            let outcome = e.cancel(&id)?;
            Ok(CancelResponse {
                canceled: e.view(&outcome.canceled, Detail::WITH_CLIENT)?,
                replacement: outcome
                    .replacement
                    .as_ref()
                    .map(|r| e.view(r, Detail::BASIC))
                    .transpose()?,
            })
        })
        .await?;
    Ok(Json(response))
}

/// `PATCH /appointment/complete/:id`
pub async fn complete(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<CompleteRequest>, JsonRejection>,
) -> Result<Json<AppointmentView>, ApiError> {
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    let view = ctx
        .run_engine(move |e| {
            let appt = e.complete(&id, &req.diagnosis_id)?;
            e.view(&appt, Detail::HISTORY)
        })
        .await?;
    Ok(Json(view))
}

/// `GET /appointment/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentView>, ApiError> {
    let id = parse_id(&id)?;
    let view = ctx.run_engine(move |e| e.get(&id)).await?;
    Ok(Json(view))
}

/// `GET /appointment/all`
pub async fn list_all(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    let views = ctx.run_engine(|e| e.list_all()).await?;
    Ok(Json(views))
}
