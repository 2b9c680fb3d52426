mod common;

use api_lib::web;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register_and_login(app: &Router, username: &str, role: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/register",
        None,
        json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "correct horse",
            "role": role,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "User registered successfully");

    let (status, body) = call(
        app,
        Method::POST,
        "/login",
        None,
        json!({"username": username, "password": "correct horse"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let app = web::router(common::app());

    let (status, body) = call(&app, Method::GET, "/permissions", None, Value::Null).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"success": false, "message": "Authentication required"}));

    let (status, body) = call(&app, Method::GET, "/permissions", Some("not-a-jwt"), Value::Null).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn login_token_unlocks_the_callers_permissions() {
    let app = web::router(common::app());
    let token = register_and_login(&app, "sam", "student").await;

    let (status, body) = call(&app, Method::GET, "/permissions", Some(&token), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["role"], "student");
    assert!(body["permissions"]
        .as_array()
        .unwrap()
        .contains(&json!("join_video_conference")));

    let (status, body) = call(
        &app,
        Method::POST,
        "/verify-token",
        None,
        json!({"token": token}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "sam");
    assert_eq!(body["user"]["role"], "student");
}

#[tokio::test]
async fn malformed_bodies_get_the_error_envelope() {
    let app = web::router(common::app());

    let (status, body) = call(&app, Method::POST, "/login", None, json!({"username": "ada"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("missing field `password`"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let app = web::router(common::app());
    register_and_login(&app, "sam", "student").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/register",
        None,
        json!({"username": "sam", "email": "other@example.com", "password": "pw"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Username already exists");
}

#[tokio::test]
async fn course_authoring_and_enrollment_over_http() {
    let app = web::router(common::app());
    let instructor = register_and_login(&app, "tina", "instructor").await;
    let student = register_and_login(&app, "sam", "student").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/courses",
        Some(&student),
        json!({"title": "Sneaky"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Permission denied");

    let (status, body) = call(
        &app,
        Method::POST,
        "/courses",
        Some(&instructor),
        json!({"title": "Rust 101", "category": "programming", "difficulty_level": "intermediate"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let course_id = body["course_id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/courses/{}/modules", course_id),
        Some(&instructor),
        json!({"title": "Basics", "order": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let module_id = body["module_id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/modules/{}/lessons", module_id),
        Some(&instructor),
        json!({"title": "Hello", "content_type": "video", "order": 1, "video_url": "https://cdn.example.com/hello.mp4"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let enroll_uri = format!("/courses/{}/enroll", course_id);
    let (status, body) = call(&app, Method::POST, &enroll_uri, Some(&student), Value::Null).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Course not found or not published");

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/courses/{}/publish", course_id),
        Some(&instructor),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::POST, &enroll_uri, Some(&student), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Student enrolled successfully");
    let (status, body) = call(&app, Method::POST, &enroll_uri, Some(&student), Value::Null).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Student already enrolled");

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/courses/{}/content", course_id),
        Some(&student),
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let lesson = &body["course"]["modules"][0]["lessons"][0];
    assert_eq!(lesson["video_url"], "https://cdn.example.com/hello.mp4");
    assert_eq!(body["course"]["difficulty_level"], "intermediate");

    let (status, body) = call(&app, Method::GET, "/my-courses", Some(&student), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["courses"][0]["instructor"], "tina");
}

#[tokio::test]
async fn conference_lifecycle_over_http() {
    let app = web::router(common::app());
    let instructor = register_and_login(&app, "tina", "instructor").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/conferences",
        Some(&instructor),
        json!({
            "title": "Office hours",
            "scheduled_start": "2030-01-01T10:00:00Z",
            "scheduled_end": "2030-01-01T11:00:00Z",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Conference room created successfully");
    let room_id = body["room_id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/conferences/{}/end", room_id),
        Some(&instructor),
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Conference is not active");

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/conferences/{}/start", room_id),
        Some(&instructor),
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["meeting_url"].as_str().unwrap().starts_with("https://meet.example.com/room/"));

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/conferences/{}", room_id),
        Some(&instructor),
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
    assert_eq!(body["host"], "tina");
}
