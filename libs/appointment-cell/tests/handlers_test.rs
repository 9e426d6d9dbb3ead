use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, NaiveTime};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::router::appointment_routes;
use shared_database::{AppState, InMemoryStore, SlotStore};
use shared_models::scheduling::SlotEntry;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

struct TestApp {
    router: Router,
    store: Arc<InMemoryStore>,
    secret: String,
    professional: TestUser,
}

impl TestApp {
    async fn new(fee: Option<f64>) -> Self {
        let config = TestConfig::default();
        let professional = TestUser::professional("pro@example.com");
        let store = Arc::new(InMemoryStore::with_professionals([(professional.uuid(), fee)]));
        store
            .insert_slots(
                professional.uuid(),
                &[SlotEntry {
                    date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
                    start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
                }],
            )
            .await
            .unwrap();

        let state = AppState::new(config.to_arc(), store.clone());

        Self {
            router: appointment_routes(state),
            store,
            secret: config.jwt_secret,
            professional,
        }
    }

    fn booking_body(&self, patient: &TestUser) -> Value {
        json!({
            "patientId": patient.id,
            "professionalId": self.professional.id,
            "date": "2025-07-01",
            "startTime": "09:00",
            "endTime": "09:30",
            "type": "Consulta",
            "reason": "chequeo"
        })
    }

    async fn send(&self, method: &str, uri: &str, user: &TestUser, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", JwtTestUtils::bearer(user, &self.secret));
        let body = match body {
            Some(value) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

#[tokio::test]
async fn patient_books_and_reads_back() {
    let app = TestApp::new(Some(50.0)).await;
    let patient = TestUser::patient("a@example.com");

    let (status, body) = app.send("POST", "/", &patient, Some(app.booking_body(&patient))).await;
    assert_eq!(status, StatusCode::CREATED);
    let appointment_id = body["appointmentId"].as_str().unwrap().to_string();

    let (status, details) = app.send("GET", &format!("/{}", appointment_id), &patient, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["appointment"]["status"], "Confirmed");
    assert_eq!(details["appointment"]["type"], "Consulta");
    assert_eq!(details["appointment"]["scheduledAt"], "2025-07-01T09:00:00");
    assert_eq!(details["billing"]["amount"], 50.0);
    assert_eq!(details["billing"]["status"], "Pending");

    let (status, _) = app
        .send("GET", &format!("/{}", appointment_id), &app.professional, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let stranger = TestUser::patient("nosy@example.com");
    let (status, _) = app.send("GET", &format!("/{}", appointment_id), &stranger, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn second_booking_is_a_conflict() {
    let app = TestApp::new(Some(50.0)).await;
    let a = TestUser::patient("a@example.com");
    let b = TestUser::patient("b@example.com");

    app.send("POST", "/", &a, Some(app.booking_body(&a))).await;
    let (status, body) = app.send("POST", "/", &b, Some(app.booking_body(&b))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "ConflictError");
}

#[tokio::test]
async fn missing_fee_is_a_validation_error_and_keeps_the_slot() {
    let app = TestApp::new(None).await;
    let patient = TestUser::patient("a@example.com");

    let (status, body) = app.send("POST", "/", &patient, Some(app.booking_body(&patient))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "ValidationError");
    assert_eq!(app.store.list_slots(Some(app.professional.uuid())).await.unwrap().len(), 1);
}

#[tokio::test]
async fn patients_cannot_book_for_others() {
    let app = TestApp::new(Some(50.0)).await;
    let patient = TestUser::patient("a@example.com");
    let other = TestUser::patient("b@example.com");

    let (status, _) = app.send("POST", "/", &patient, Some(app.booking_body(&other))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.store.appointments().await.is_empty());
}

#[tokio::test]
async fn incomplete_request_is_rejected() {
    let app = TestApp::new(Some(50.0)).await;
    let patient = TestUser::patient("a@example.com");
    let mut body = app.booking_body(&patient);
    body.as_object_mut().unwrap().remove("reason");

    let (status, response) = app.send("POST", "/", &patient, Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["message"].as_str().unwrap().contains("reason"));
}

#[tokio::test]
async fn unknown_appointment_is_not_found() {
    let app = TestApp::new(Some(50.0)).await;
    let admin = TestUser::admin("admin@example.com");

    let (status, body) = app.send("GET", &format!("/{}", Uuid::new_v4()), &admin, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "NotFoundError");
}
