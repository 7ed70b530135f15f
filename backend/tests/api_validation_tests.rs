mod common;

use axum::{body::Body, http::Request};
use common::*;
use http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

// None of these requests reach S3 or DynamoDB
const UNREACHABLE_DEMO_URL: &str = "http://127.0.0.1:9/car.png";

#[tokio::test]
async fn test_health_endpoint() {
    let context = TestContext::new(UNREACHABLE_DEMO_URL).await;

    let response = context.send_get_request("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["semver"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_openapi_document_is_served_in_development() {
    let context = TestContext::new(UNREACHABLE_DEMO_URL).await;

    let response = context.send_get_request("/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["info"]["title"], "Approved Cars");
    assert!(body["paths"]["/v1/images/upload-urls"].is_object());
    assert!(body["paths"]["/v1/auth/register"].is_object());
}

#[tokio::test]
async fn test_register_rejects_invalid_username() {
    let context = TestContext::new(UNREACHABLE_DEMO_URL).await;

    let too_long = "a".repeat(65);
    for username in ["ab", "has space", "semi;colon", too_long.as_str()] {
        let response = context.register(username, "long-enough-password").await;
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "username {username:?} should be rejected"
        );

        let body = parse_response_body(response).await;
        assert_eq!(body["error"]["code"], "invalid_username");
        assert_eq!(body["allowRetry"], false);
    }
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let context = TestContext::new(UNREACHABLE_DEMO_URL).await;

    let response = context.register("inspector", "short").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = parse_response_body(response).await;
    assert_eq!(body["error"]["code"], "invalid_password");
}

#[tokio::test]
async fn test_login_rejects_unknown_fields() {
    let context = TestContext::new(UNREACHABLE_DEMO_URL).await;

    let response = context
        .send_post_request(
            "/v1/auth/login",
            json!({
                "username": "inspector",
                "password": "long-enough-password",
                "remember_me": true
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = parse_response_body(response).await;
    assert_eq!(body["error"]["code"], "invalid_json");
}

#[tokio::test]
async fn test_missing_content_type_header() {
    let context = TestContext::new(UNREACHABLE_DEMO_URL).await;

    let request = Request::builder()
        .uri("/v1/auth/login")
        .method("POST")
        .body(Body::from(
            json!({ "username": "inspector", "password": "long-enough-password" }).to_string(),
        ))
        .unwrap();
    let response = context.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = parse_response_body(response).await;
    assert_eq!(body["error"]["code"], "invalid_content_type");
}

#[tokio::test]
async fn test_upload_url_request_validation() {
    let context = TestContext::new(UNREACHABLE_DEMO_URL).await;

    let valid = json!({
        "filename": "car.png",
        "content_length": 1024,
        "username": "inspector",
        "password": "long-enough-password"
    });

    let cases = [
        ("content_length", json!(0), "invalid_content_length"),
        ("content_length", json!(15 * 1024 * 1024 + 1), "invalid_content_length"),
        ("content_type", json!("application/pdf"), "invalid_content_type"),
        ("filename", json!("   "), "invalid_filename"),
        ("filename", json!(format!("{}.png", "a".repeat(252))), "invalid_filename"),
        ("filename", json!("payload.exe"), "unsupported_image_type"),
        ("password", json!("short"), "invalid_password"),
    ];

    for (field, value, code) in cases {
        let mut payload = valid.clone();
        payload[field] = value.clone();

        let response = context
            .send_post_request("/v1/images/upload-urls", payload)
            .await;
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "{field} = {value} should be rejected"
        );

        let body = parse_response_body(response).await;
        assert_eq!(body["error"]["code"], code, "{field} = {value}");
    }
}
