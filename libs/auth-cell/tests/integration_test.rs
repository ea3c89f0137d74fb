use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::router::auth_routes;
use shared_utils::test_utils::TestConfig;

fn create_test_app(store_url: &str) -> Router {
    auth_routes(TestConfig::with_store_url(store_url).to_arc())
}

async fn post_login(app: Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
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
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn doctor_credentials_win_the_doctor_role() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor"))
        .and(query_param("username", "eq.doc1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "doctor_id": 2,
            "first_name": "วิภา",
            "last_name": "รักษาดี",
            "username": "doc1"
        }])))
        .mount(&mock_server)
        .await;

    let (status, body) = post_login(
        create_test_app(&mock_server.uri()),
        json!({ "username": "doc1", "password": "secret" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["role"], "doctor");
    assert_eq!(body["user"]["name"], "วิภา รักษาดี");
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn owner_position_maps_to_the_owner_role() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/employee"))
        .and(query_param("username", "eq.boss"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "employee_id": 1,
            "first_name": "สมศรี",
            "last_name": "ใจดี",
            "username": "boss",
            "position": "owner"
        }])))
        .mount(&mock_server)
        .await;

    let (status, body) = post_login(
        create_test_app(&mock_server.uri()),
        json!({ "username": "boss", "password": "secret" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "owner");
    assert_eq!(body["user"]["position"], "owner");
}

#[tokio::test]
async fn other_positions_map_to_staff() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/employee"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "employee_id": 4,
            "first_name": "สมศรี",
            "last_name": "ใจดี",
            "username": "desk",
            "position": "receptionist"
        }])))
        .mount(&mock_server)
        .await;

    let (_, body) = post_login(
        create_test_app(&mock_server.uri()),
        json!({ "username": "desk", "password": "secret" }),
    )
    .await;

    assert_eq!(body["role"], "staff");
}

#[tokio::test]
async fn missing_fields_are_a_400() {
    let mock_server = MockServer::start().await;

    let (status, body) = post_login(
        create_test_app(&mock_server.uri()),
        json!({ "username": "doc1" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn unknown_credentials_are_a_401() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/employee"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let (status, body) = post_login(
        create_test_app(&mock_server.uri()),
        json!({ "username": "ghost", "password": "nope" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "error");
}
