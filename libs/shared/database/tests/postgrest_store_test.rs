use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::{
    matchers::{body_partial_json, header, headers, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use shared_database::{BookingLedger, ProfessionalDirectory, SlotStore, StoreError, SupabaseStore};
use shared_models::scheduling::{
    Appointment, AppointmentStatus, BillingRecord, NewBooking, SlotEntry, SlotKey,
};
use shared_utils::test_utils::{PostgrestFixtures, TestConfig};

async fn setup() -> (MockServer, SupabaseStore) {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(mock_server.uri()).to_app_config();
    let store = SupabaseStore::new(&config);
    (mock_server, store)
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
}

fn new_booking(slot_id: Uuid, professional_id: Uuid) -> NewBooking {
    let appointment = Appointment {
        id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        professional_id,
        scheduled_at: day().and_time(time(9, 0)),
        status: AppointmentStatus::Confirmed,
        appointment_type: "Consulta".to_string(),
        reason: "chequeo".to_string(),
        consultation_fee: 50.0,
        created_at: Utc::now(),
    };
    let billing = BillingRecord::for_appointment(&appointment);
    NewBooking { slot_id, appointment, billing }
}

#[tokio::test]
async fn lists_slots_for_one_professional_in_order() {
    let (mock_server, store) = setup().await;
    let professional_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_slots"))
        .and(query_param("professional_id", format!("eq.{}", professional_id)))
        .and(query_param("order", "slot_date.asc,start_time.asc"))
        .and(header("apikey", "test-service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            PostgrestFixtures::slot_row(Uuid::new_v4(), professional_id, "2025-07-01", "09:00:00", "09:30:00"),
            PostgrestFixtures::slot_row(Uuid::new_v4(), professional_id, "2025-07-01", "09:30:00", "10:00:00"),
        ])))
        .mount(&mock_server)
        .await;

    let slots = store.list_slots(Some(professional_id)).await.unwrap();

    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].date, day());
    assert_eq!(slots[1].start_time, time(9, 30));
}

#[tokio::test]
async fn find_slot_filters_on_every_key_column() {
    let (mock_server, store) = setup().await;
    let professional_id = Uuid::new_v4();
    let slot_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_slots"))
        .and(query_param("slot_date", "eq.2025-07-01"))
        .and(query_param("start_time", "eq.09:00:00"))
        .and(query_param("end_time", "eq.09:30:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            PostgrestFixtures::slot_row(slot_id, professional_id, "2025-07-01", "09:00:00", "09:30:00"),
        ])))
        .mount(&mock_server)
        .await;

    let key = SlotKey {
        professional_id,
        date: day(),
        start_time: time(9, 0),
        end_time: time(9, 30),
    };
    let slot = store.find_slot(&key).await.unwrap().unwrap();

    assert_eq!(slot.id, slot_id);
}

#[tokio::test]
async fn batch_insert_ignores_duplicates_in_one_request() {
    let (mock_server, store) = setup().await;
    let professional_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/availability_slots"))
        .and(query_param("on_conflict", "professional_id,slot_date,start_time,end_time"))
        .and(headers("Prefer", vec!["resolution=ignore-duplicates", "return=representation"]))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            PostgrestFixtures::slot_row(Uuid::new_v4(), professional_id, "2025-07-01", "09:30:00", "10:00:00"),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let entries = [
        SlotEntry { date: day(), start_time: time(9, 0), end_time: time(9, 30) },
        SlotEntry { date: day(), start_time: time(9, 30), end_time: time(10, 0) },
    ];
    let inserted = store.insert_slots(professional_id, &entries).await.unwrap();

    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0].start_time, time(9, 30));
}

#[tokio::test]
async fn exclusion_violation_is_an_overlap() {
    let (mock_server, store) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/availability_slots"))
        .respond_with(ResponseTemplate::new(409).set_body_json(PostgrestFixtures::error_response(
            "conflicting key value violates exclusion constraint \"availability_slots_no_overlap\"",
            "23P01",
        )))
        .mount(&mock_server)
        .await;

    let entries = [SlotEntry { date: day(), start_time: time(9, 0), end_time: time(10, 0) }];
    let result = store.insert_slots(Uuid::new_v4(), &entries).await;

    assert_matches!(result, Err(StoreError::Overlap(_)));
}

#[tokio::test]
async fn missing_professional_has_no_fee_row() {
    let (mock_server, store) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/healthcare_professionals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    assert_eq!(store.consultation_fee(Uuid::new_v4()).await.unwrap(), None);
}

#[tokio::test]
async fn book_slot_rpc_carries_all_three_writes() {
    let (mock_server, store) = setup().await;
    let professional_id = Uuid::new_v4();
    let slot_id = Uuid::new_v4();
    let booking = new_booking(slot_id, professional_id);

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/book_slot"))
        .and(body_partial_json(json!({
            "p_slot_id": slot_id,
            "p_appointment": { "status": "Confirmed", "appointment_type": "Consulta" },
            "p_billing": { "amount": 50.0, "payment_method": "Pending", "status": "Pending" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(1)
        .mount(&mock_server)
        .await;

    store.commit_booking(&booking).await.unwrap();
}

#[tokio::test]
async fn book_slot_reports_vanished_slot_as_taken() {
    let (mock_server, store) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/book_slot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(false)))
        .mount(&mock_server)
        .await;

    let result = store.commit_booking(&new_booking(Uuid::new_v4(), Uuid::new_v4())).await;
    assert_matches!(result, Err(StoreError::SlotTaken));
}

#[tokio::test]
async fn unique_violation_is_reported_as_taken() {
    let (mock_server, store) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/book_slot"))
        .respond_with(ResponseTemplate::new(409).set_body_json(PostgrestFixtures::error_response(
            "duplicate key value violates unique constraint \"billing_records_appointment_id_key\"",
            "23505",
        )))
        .mount(&mock_server)
        .await;

    let result = store.commit_booking(&new_booking(Uuid::new_v4(), Uuid::new_v4())).await;
    assert_matches!(result, Err(StoreError::SlotTaken));
}

#[tokio::test]
async fn server_errors_surface_as_backend_errors() {
    let (mock_server, store) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/book_slot"))
        .respond_with(ResponseTemplate::new(500).set_body_json(PostgrestFixtures::error_response(
            "connection reset",
            "XX000",
        )))
        .mount(&mock_server)
        .await;

    let result = store.commit_booking(&new_booking(Uuid::new_v4(), Uuid::new_v4())).await;
    assert_matches!(result, Err(StoreError::Backend(_)));
}

#[tokio::test]
async fn reads_back_appointment_and_billing() {
    let (mock_server, store) = setup().await;
    let appointment_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let professional_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            PostgrestFixtures::appointment_row(appointment_id, patient_id, professional_id, 45.0),
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/billing_records"))
        .and(query_param("appointment_id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            PostgrestFixtures::billing_row(Uuid::new_v4(), appointment_id, patient_id, professional_id, 45.0),
        ])))
        .mount(&mock_server)
        .await;

    let appointment = store.get_appointment(appointment_id).await.unwrap().unwrap();
    let billing = store.get_billing_record(appointment_id).await.unwrap().unwrap();

    assert_eq!(appointment.scheduled_at, day().and_time(time(9, 0)));
    assert_eq!(billing.amount, appointment.consultation_fee);
}
