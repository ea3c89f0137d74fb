use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use billing_cell::router::{payment_routes, treatment_routes};
use shared_utils::test_utils::{MockStoreRows, TestConfig};

fn treatment_app(store_url: &str) -> Router {
    treatment_routes(TestConfig::with_store_url(store_url).to_arc())
}

fn payment_app(store_url: &str) -> Router {
    payment_routes(TestConfig::with_store_url(store_url).to_arc())
}

async fn mount_lock_mocks(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/rest/v1/scheduling_locks"))
        .respond_with(ResponseTemplate::new(201))
        .mount(mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/scheduling_locks"))
        .respond_with(ResponseTemplate::new(204))
        .mount(mock_server)
        .await;
}

async fn send_json(app: Router, method_str: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method_str)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        json!(null)
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn recording_a_treatment_completes_the_appointment_and_creates_the_stub() {
    let mock_server = MockServer::start().await;
    mount_lock_mocks(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointment"))
        .and(query_param("appointment_id", "eq.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::appointment(9, 1, 2, "2025-11-13", "09:00:00", "scheduled")
        ])))
        .mount(&mock_server)
        .await;

    // No prior treatment or payment for this appointment.
    Mock::given(method("GET"))
        .and(path("/rest/v1/treatment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/payment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/treatment"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreRows::treatment(21, 9, 1, 2)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointment"))
        .and(query_param("appointment_id", "eq.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::appointment(9, 1, 2, "2025-11-13", "09:00:00", "completed")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/payment"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreRows::payment(31, 9, 1, "unpaid")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, body) = send_json(
        treatment_app(&mock_server.uri()),
        "POST",
        "/",
        json!({
            "appointment_id": 9,
            "symptom": "ไอ เจ็บคอ",
            "diagnosis": "หวัด",
            "advice": "พักผ่อนมาก ๆ"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["treatment_id"], 21);
    assert_eq!(body["data"]["appointment_id"], 9);
    assert_eq!(body["data"]["payment_id"], 31);
}

#[tokio::test]
async fn a_second_treatment_reports_the_existing_one_and_writes_nothing() {
    let mock_server = MockServer::start().await;
    mount_lock_mocks(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointment"))
        .and(query_param("appointment_id", "eq.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::appointment(9, 1, 2, "2025-11-13", "09:00:00", "completed")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/treatment"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "treatment_id": 21 }])),
        )
        .mount(&mock_server)
        .await;

    // The workflow must stop before inserting anything.
    Mock::given(method("POST"))
        .and(path("/rest/v1/treatment"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/payment"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (status, body) = send_json(
        treatment_app(&mock_server.uri()),
        "POST",
        "/",
        json!({
            "appointment_id": 9,
            "diagnosis": "หวัด",
            "advice": "พักผ่อนมาก ๆ"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["treatment_id"], 21);
}

#[tokio::test]
async fn treatment_for_missing_appointment_is_a_404() {
    let mock_server = MockServer::start().await;
    mount_lock_mocks(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let (status, body) = send_json(
        treatment_app(&mock_server.uri()),
        "POST",
        "/",
        json!({
            "appointment_id": 999,
            "diagnosis": "หวัด",
            "advice": "พักผ่อนมาก ๆ"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn treatment_requires_diagnosis_and_advice() {
    let mock_server = MockServer::start().await;

    let (status, body) = send_json(
        treatment_app(&mock_server.uri()),
        "POST",
        "/",
        json!({ "appointment_id": 9, "diagnosis": "   " }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn existing_payment_stub_is_reused_instead_of_duplicated() {
    let mock_server = MockServer::start().await;
    mount_lock_mocks(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointment"))
        .and(query_param("appointment_id", "eq.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::appointment(9, 1, 2, "2025-11-13", "09:00:00", "scheduled")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/treatment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/payment"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "payment_id": 77 }])),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/treatment"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreRows::treatment(22, 9, 1, 2)
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::appointment(9, 1, 2, "2025-11-13", "09:00:00", "completed")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/payment"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (status, body) = send_json(
        treatment_app(&mock_server.uri()),
        "POST",
        "/",
        json!({
            "appointment_id": 9,
            "diagnosis": "หวัด",
            "advice": "พักผ่อนมาก ๆ"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["payment_id"], 77);
}

#[tokio::test]
async fn paying_settles_the_payment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/payment"))
        .and(query_param("payment_id", "eq.31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "payment_id": 31,
            "patient_id": 1,
            "appointment_id": 9,
            "amount": 450.0,
            "payment_method": "transfer",
            "payment_date": "2025-11-13",
            "status": "paid"
        }])))
        .mount(&mock_server)
        .await;

    let (status, body) = send_json(
        payment_app(&mock_server.uri()),
        "PUT",
        "/31/pay",
        json!({ "amount": 450.0, "payment_method": "transfer" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["status"], "paid");
    assert_eq!(body["data"]["amount"], 450.0);
}

#[tokio::test]
async fn pay_rejects_non_positive_amounts_and_unknown_methods() {
    let mock_server = MockServer::start().await;

    let (status, _) = send_json(
        payment_app(&mock_server.uri()),
        "PUT",
        "/31/pay",
        json!({ "amount": 0.0, "payment_method": "cash" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        payment_app(&mock_server.uri()),
        "PUT",
        "/31/pay",
        json!({ "amount": 100.0, "payment_method": "cheque" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn paying_a_missing_payment_is_a_404() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/payment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let (status, body) = send_json(
        payment_app(&mock_server.uri()),
        "PUT",
        "/999/pay",
        json!({ "amount": 100.0, "payment_method": "cash" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn unpaid_listing_flattens_and_orders_by_visit_time() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/payment"))
        .and(query_param("status", "eq.unpaid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "payment_id": 32,
                "amount": 0.0,
                "status": "unpaid",
                "appointment": {
                    "appointment_id": 10,
                    "appointment_date": "2025-11-14",
                    "appointment_time": "10:00:00"
                },
                "patient": { "patient_id": 2, "first_name": "สมหญิง", "last_name": "สุขใจ" }
            },
            {
                "payment_id": 31,
                "amount": 0.0,
                "status": "unpaid",
                "appointment": {
                    "appointment_id": 9,
                    "appointment_date": "2025-11-13",
                    "appointment_time": "09:00:00"
                },
                "patient": { "patient_id": 1, "first_name": "สมชาย", "last_name": "ทดสอบ" }
            }
        ])))
        .mount(&mock_server)
        .await;

    let app = payment_app(&mock_server.uri());
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/unpaid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["data"][0]["payment_id"], 31);
    assert_eq!(body["data"][0]["patient_name"], "สมชาย ทดสอบ");
    assert_eq!(body["data"][0]["appointment_time"], "09:00");
    assert_eq!(body["data"][1]["payment_id"], 32);
}

#[tokio::test]
async fn lock_store_outage_is_an_infrastructure_error() {
    let mock_server = MockServer::start().await;

    // Every touch of the lock table fails; that is an outage, not contention.
    Mock::given(path("/rest/v1/scheduling_locks"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let (status, body) = send_json(
        treatment_app(&mock_server.uri()),
        "POST",
        "/",
        json!({
            "appointment_id": 9,
            "diagnosis": "หวัด",
            "advice": "พักผ่อนมาก ๆ"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn wrong_typed_body_answers_with_the_error_envelope() {
    let mock_server = MockServer::start().await;

    let (status, body) = send_json(
        payment_app(&mock_server.uri()),
        "PUT",
        "/31/pay",
        json!({ "amount": "450", "payment_method": "cash" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn failure_after_the_insert_rolls_the_treatment_back() {
    let mock_server = MockServer::start().await;
    mount_lock_mocks(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointment"))
        .and(query_param("appointment_id", "eq.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::appointment(9, 1, 2, "2025-11-13", "09:00:00", "scheduled")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/treatment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/treatment"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreRows::treatment(23, 9, 1, 2)
        ])))
        .mount(&mock_server)
        .await;

    // Completing the appointment blows up.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointment"))
        .and(body_json(json!({ "status": "completed" })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    // Compensation must delete the treatment and restore the old status.
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/treatment"))
        .and(query_param("treatment_id", "eq.23"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointment"))
        .and(body_json(json!({ "status": "scheduled" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, body) = send_json(
        treatment_app(&mock_server.uri()),
        "POST",
        "/",
        json!({
            "appointment_id": 9,
            "diagnosis": "หวัด",
            "advice": "พักผ่อนมาก ๆ"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
}
