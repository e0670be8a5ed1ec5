//! Clinic scheduling API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Scheduling routes are nested under `/appointment/`; `/health` sits at
//! the root.
//!
//! Layers (outermost → innermost): CORS → Cache-Control → access log.

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the scheduling API router.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    // Static segments win over `/:id`, so `/all` and `/available` resolve first.
    let appointments = Router::new()
        .route("/create", post(endpoints::appointments::create))
        .route(
            "/create-multiple",
            post(endpoints::appointments::create_multiple),
        )
        .route(
            "/uploadAvailability/:doctor_id",
            post(endpoints::appointments::upload_availability),
        )
        .route("/assign/:id", patch(endpoints::appointments::assign))
        .route("/approve/:id", patch(endpoints::appointments::approve))
        .route("/disapprove/:id", patch(endpoints::appointments::disapprove))
        .route("/cancel/:id", delete(endpoints::appointments::cancel))
        .route("/complete/:id", patch(endpoints::appointments::complete))
        .route("/all", get(endpoints::appointments::list_all))
        .route("/available", get(endpoints::availability::list))
        .route(
            "/available/reason/:reason",
            get(endpoints::availability::by_reason),
        )
        .route(
            "/available/reason/:reason/date",
            get(endpoints::availability::by_reason_and_date),
        )
        .route(
            "/available/reason/:reason/days",
            get(endpoints::availability::days),
        )
        .route("/doctor/:doctor_id", get(endpoints::history::doctor_schedule))
        .route(
            "/doctor/:doctor_id/history",
            get(endpoints::history::doctor_history),
        )
        .route(
            "/client/:client_id",
            get(endpoints::history::client_appointments),
        )
        .route(
            "/client/:client_id/history",
            get(endpoints::history::client_history),
        )
        .route("/pet/:pet_id", get(endpoints::history::pet_appointments))
        .route("/pet/:pet_id/all", get(endpoints::history::pet_all))
        .route(
            "/pet/:pet_id/scheduled-id",
            get(endpoints::history::pet_scheduled_id),
        )
        .route("/:id", get(endpoints::appointments::detail));

    Router::new()
        .route("/health", get(endpoints::health::check))
        .nest("/appointment", appointments)
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{NaiveDate, NaiveDateTime};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::clock::FixedClock;
    use crate::db::{insert_client, insert_doctor, insert_pet};
    use crate::models::{Client, Doctor, Pet};

    struct TestApp {
        core: Arc<CoreState>,
        doctor_id: Uuid,
        pet_id: Uuid,
        _dir: tempfile::TempDir,
    }

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    /// Temp database, clock pinned to 2024-01-01 08:00, one doctor and one pet.
    fn test_app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let core = Arc::new(CoreState::new(
            dir.path().join("clinic.db"),
            Arc::new(FixedClock::new(at(1, 8, 0))),
        ));
        core.initialize().unwrap();

        let conn = core.open_db().unwrap();
        let doctor = Doctor {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            surname: "Ruiz".into(),
            speciality: Some("Surgery".into()),
        };
        let client = Client {
            id: Uuid::new_v4(),
            name: "Luis".into(),
            surname: "Vega".into(),
        };
        let pet = Pet {
            id: Uuid::new_v4(),
            client_id: client.id,
            name: "Toby".into(),
            pet_type: Some("Dog".into()),
        };
        insert_doctor(&conn, &doctor).unwrap();
        insert_client(&conn, &client).unwrap();
        insert_pet(&conn, &pet).unwrap();

        TestApp {
            core,
            doctor_id: doctor.id,
            pet_id: pet.id,
            _dir: dir,
        }
    }

    fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = api_router(app.core.clone()).oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn block(app: &TestApp, start: &str, end: &str) -> serde_json::Value {
        serde_json::json!({
            "doctor_id": app.doctor_id,
            "start": start,
            "end": end,
            "reason": "CONTROL",
        })
    }

    #[tokio::test]
    async fn health_reports_clinic_time_and_no_store() {
        let app = test_app();
        let response = api_router(app.core.clone())
            .oneshot(request("GET", "/health", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("Cache-Control").unwrap(),
            "no-store"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["clinic_time"], "2024-01-01T08:00:00");
    }

    #[tokio::test]
    async fn create_book_and_reject_second_booking() {
        let app = test_app();

        let (status, created) = send(
            &app,
            request(
                "POST",
                "/appointment/create",
                Some(block(&app, "2024-01-02T09:00:00", "2024-01-02T09:15:00")),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "AVAILABLE");
        assert_eq!(created["doctor_name"], "Ana Ruiz");
        let id = created["id"].as_str().unwrap().to_string();

        let (status, booked) = send(
            &app,
            request(
                "PATCH",
                &format!("/appointment/assign/{id}"),
                Some(serde_json::json!({ "petId": app.pet_id })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(booked["status"], "TO_BEGIN");
        assert_eq!(booked["pet_name"], "Toby");
        assert_eq!(booked["client_name"], "Luis Vega");

        let (status, body) = send(
            &app,
            request(
                "PATCH",
                &format!("/appointment/assign/{id}"),
                Some(serde_json::json!({ "pet_id": app.pet_id })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "ALREADY_BOOKED");
    }

    #[tokio::test]
    async fn duplicate_block_is_conflict() {
        let app = test_app();
        let body = block(&app, "2024-01-02T09:00:00", "2024-01-02T09:15:00");

        let (status, _) = send(&app, request("POST", "/appointment/create", Some(body.clone()))).await;
        assert_eq!(status, StatusCode::CREATED);

        let overlapping = block(&app, "2024-01-02T09:10:00", "2024-01-02T09:25:00");
        let (status, body) = send(&app, request("POST", "/appointment/create", Some(overlapping))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "DUPLICATE_SLOT");
    }

    #[tokio::test]
    async fn past_block_is_bad_request() {
        let app = test_app();
        let past = block(&app, "2023-12-31T09:00:00", "2023-12-31T09:15:00");

        let (status, body) = send(&app, request("POST", "/appointment/create", Some(past))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "IN_PAST");
    }

    #[tokio::test]
    async fn unknown_appointment_is_404() {
        let app = test_app();
        let uri = format!("/appointment/{}", Uuid::new_v4());

        let (status, body) = send(&app, request("GET", &uri, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn malformed_id_is_400() {
        let app = test_app();
        let (status, body) = send(&app, request("GET", "/appointment/not-a-uuid", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn malformed_body_is_400() {
        let app = test_app();
        let req = Request::builder()
            .method("POST")
            .uri("/appointment/create")
            .header("Content-Type", "application/json")
            .body(Body::from("{\"doctor_id\": 42}"))
            .unwrap();

        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn upload_then_list_available_by_reason() {
        let app = test_app();
        let upload = serde_json::json!({
            "start": "2024-01-02T09:00:00",
            "end": "2024-01-02T10:00:00",
            "reason": "VACCINATION",
            "minHour": "09:00",
            "maxHour": "17:00",
        });

        let (status, body) = send(
            &app,
            request(
                "POST",
                &format!("/appointment/uploadAvailability/{}", app.doctor_id),
                Some(upload),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["created"], 4);

        let (status, open) = send(
            &app,
            request("GET", "/appointment/available/reason/vaccination", None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(open.as_array().unwrap().len(), 4);

        let (status, days) = send(
            &app,
            request("GET", "/appointment/available/reason/VACCINATION/days", None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(days, serde_json::json!(["2024-01-02"]));

        let (status, _) = send(
            &app,
            request("GET", "/appointment/available/reason/GROOMING", None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cancel_with_notice_returns_replacement() {
        let app = test_app();
        let (_, created) = send(
            &app,
            request(
                "POST",
                "/appointment/create",
                Some(block(&app, "2024-01-05T09:00:00", "2024-01-05T09:15:00")),
            ),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            request("DELETE", &format!("/appointment/cancel/{id}"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["canceled"]["status"], "CANCELED");
        assert_eq!(body["replacement"]["status"], "AVAILABLE");
        assert_eq!(body["replacement"]["start_time"], "2024-01-05T09:00:00");

        let (status, body) = send(
            &app,
            request("DELETE", &format!("/appointment/cancel/{id}"), None),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "NOT_CANCELABLE");
    }

    #[tokio::test]
    async fn doctor_schedule_is_paged() {
        let app = test_app();
        let range = serde_json::json!({
            "doctorId": app.doctor_id,
            "start": "2024-01-02T09:00:00",
            "end": "2024-01-02T10:00:00",
            "reason": "CONTROL",
        });
        let (status, bulk) = send(&app, request("POST", "/appointment/create-multiple", Some(range))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(bulk["created"].as_array().unwrap().len(), 4);

        let uri = format!("/appointment/doctor/{}?page=1&size=3", app.doctor_id);
        let (status, page) = send(&app, request("GET", &uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 4);
        assert_eq!(page["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn pet_without_booking_has_no_scheduled_id() {
        let app = test_app();
        let uri = format!("/appointment/pet/{}/scheduled-id", app.pet_id);
        let (status, _) = send(&app, request("GET", &uri, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
