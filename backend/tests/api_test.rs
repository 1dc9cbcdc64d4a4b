use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use homework_backend::db::{self, SqliteAssignmentStore};
use homework_backend::routes::router;
use homework_backend::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn setup_app() -> Router {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to create test db");
    router(AppState::new(Arc::new(SqliteAssignmentStore::new(pool))))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(req).await.expect("request failed");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    (status, body.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let (status, bytes) = send(app, req).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response is not JSON")
    };
    (status, value)
}

async fn create(app: &Router, body: Value) -> Value {
    let (status, created) = send_json(app, Method::POST, "/api/assignments", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", created);
    created
}

#[tokio::test]
async fn test_health() {
    let app = setup_app().await;
    let (status, _) = send_json(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_essay_example() {
    let app = setup_app().await;

    let created = create(
        &app,
        json!({ "title": "Essay", "due_date": "2024-05-01", "priority": 1 }),
    )
    .await;

    assert_eq!(created["title"], "Essay");
    assert_eq!(created["priority"], 1);
    assert_eq!(created["completed"], false);
    assert!(created["estimated_time"].is_null());
    assert_eq!(created["due_date"], "2024-05-01");
    assert_eq!(created["created_at"], created["updated_at"]);

    let id = created["id"].as_str().unwrap();
    let (status, fetched) =
        send_json(&app, Method::GET, &format!("/api/assignments/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["due_date"], "2024-05-01");
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_create_from_form_post() {
    let app = setup_app().await;

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/assignments")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(
            "title=+Lab+report+&course=Chemistry&notes=&due_date=2024-06-10&priority=&estimated_time=90",
        ))
        .unwrap();
    let (status, bytes) = send(&app, req).await;
    assert_eq!(status, StatusCode::CREATED);

    let created: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(created["title"], "Lab report");
    assert_eq!(created["course"], "Chemistry");
    assert_eq!(created["priority"], 2);
    assert_eq!(created["estimated_time"], 90);
}

#[tokio::test]
async fn test_create_rejects_invalid_payload() {
    let app = setup_app().await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/assignments",
        Some(json!({ "title": "   ", "due_date": "2024-05-01", "priority": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "priority"]);

    // 何も保存されていない
    let (_, list) = send_json(&app, Method::GET, "/api/assignments", None).await;
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_create_reports_wrong_json_types_per_field() {
    let app = setup_app().await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/assignments",
        Some(json!({ "title": 123, "due_date": "2024-05-01", "priority": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation error");
    assert_eq!(body["fields"][0]["field"], "title");
    assert_eq!(body["fields"][0]["message"], "title must be a string");
    assert_eq!(body["fields"][1]["field"], "priority");
    assert_eq!(body["fields"].as_array().unwrap().len(), 2);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/assignments",
        Some(json!({ "title": "Essay", "due_date": "2024-05-01", "priority": 2.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "priority");
    assert_eq!(body["fields"][0]["message"], "priority must be an integer");

    let (_, list) = send_json(&app, Method::GET, "/api/assignments", None).await;
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_update_reports_wrong_json_types_per_field() {
    let app = setup_app().await;

    let created = create(&app, json!({ "title": "Essay", "due_date": "2024-05-01" })).await;
    let uri = format!("/api/assignments/{}", created["id"].as_str().unwrap());

    let (status, body) = send_json(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({ "course": ["Math"], "completed": "maybe" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "course");
    assert_eq!(body["fields"][1]["field"], "completed");

    let (_, fetched) = send_json(&app, Method::GET, &uri, None).await;
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_create_rejects_malformed_date() {
    let app = setup_app().await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/assignments",
        Some(json!({ "title": "Essay", "due_date": "May 1st" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Invalid date format"));
    assert_eq!(body["fields"][0]["field"], "due_date");
}

#[tokio::test]
async fn test_unsupported_content_type() {
    let app = setup_app().await;

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/assignments")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("title=Essay"))
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_and_unknown_ids() {
    let app = setup_app().await;
    let unknown = uuid::Uuid::new_v4();

    for (method, suffix) in [(Method::GET, ""), (Method::POST, "/toggle")] {
        let (status, _) =
            send_json(&app, method.clone(), &format!("/api/assignments/not-an-id{}", suffix), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            send_json(&app, method, &format!("/api/assignments/{}{}", unknown, suffix), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let (status, _) = send_json(
        &app,
        Method::PATCH,
        &format!("/api/assignments/{}", unknown),
        Some(json!({ "title": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(&app, Method::DELETE, "/api/assignments/123", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_partial_update_changes_only_supplied_fields() {
    let app = setup_app().await;

    let created = create(
        &app,
        json!({
            "title": "Essay",
            "course": "English",
            "notes": "draft first",
            "due_date": "2024-05-01",
            "priority": 1,
            "estimated_time": 120
        }),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = send_json(
        &app,
        Method::PATCH,
        &format!("/api/assignments/{}", id),
        Some(json!({ "title": "  Final essay ", "due_date": "2024-05-03" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(updated["title"], "Final essay");
    assert_eq!(updated["due_date"], "2024-05-03");
    for field in ["id", "course", "notes", "priority", "estimated_time", "completed", "created_at"] {
        assert_eq!(updated[field], created[field], "{} changed", field);
    }
    assert!(updated["updated_at"].as_str().unwrap() > created["updated_at"].as_str().unwrap());
}

#[tokio::test]
async fn test_update_validation_does_not_mutate() {
    let app = setup_app().await;

    let created = create(&app, json!({ "title": "Essay", "due_date": "2024-05-01" })).await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/api/assignments/{}", id);

    let (status, _) = send_json(&app, Method::PATCH, &uri, Some(json!({ "priority": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(&app, Method::PATCH, &uri, Some(json!({ "due_date": "01/05/2024" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, fetched) = send_json(&app, Method::GET, &uri, None).await;
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_toggle_twice_restores_state() {
    let app = setup_app().await;

    let created = create(&app, json!({ "title": "Quiz", "due_date": "2024-05-01" })).await;
    let uri = format!("/api/assignments/{}/toggle", created["id"].as_str().unwrap());

    let (status, first) = send_json(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["completed"], true);

    let (_, second) = send_json(&app, Method::POST, &uri, None).await;
    assert_eq!(second["completed"], false);

    let t0 = created["updated_at"].as_str().unwrap();
    let t1 = first["updated_at"].as_str().unwrap();
    let t2 = second["updated_at"].as_str().unwrap();
    assert!(t0 < t1 && t1 < t2);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let app = setup_app().await;

    let created = create(&app, json!({ "title": "Quiz", "due_date": "2024-05-01" })).await;
    let uri = format!("/api/assignments/{}", created["id"].as_str().unwrap());

    let (status, _) = send_json(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send_json(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_list_is_sorted_by_due_date() {
    let app = setup_app().await;

    create(&app, json!({ "title": "c", "due_date": "2024-05-03" })).await;
    create(&app, json!({ "title": "a", "due_date": "2024-05-01" })).await;
    create(&app, json!({ "title": "b", "due_date": "2024-05-01" })).await;

    let (_, list) = send_json(&app, Method::GET, "/api/assignments", None).await;
    let titles: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();
    // 同じ期限なら後から作った方が先
    assert_eq!(titles, vec!["b", "a", "c"]);

    let (status, groups) = send_json(&app, Method::GET, "/api/assignments/grouped", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(groups[0]["label"], "Wed, May 01");
    assert_eq!(groups[0]["assignments"].as_array().unwrap().len(), 2);
    assert_eq!(groups[1]["label"], "Fri, May 03");
}

#[tokio::test]
async fn test_search_filters_and_facets() {
    let app = setup_app().await;

    create(
        &app,
        json!({ "title": "Reading", "course": "History", "notes": "Essay due friday", "due_date": "2024-05-02" }),
    )
    .await;
    create(&app, json!({ "title": "Lab", "course": "Chemistry", "due_date": "2024-05-01" })).await;
    let done = create(&app, json!({ "title": "Old essay", "course": "History", "due_date": "2024-04-01" })).await;
    send_json(
        &app,
        Method::POST,
        &format!("/api/assignments/{}/toggle", done["id"].as_str().unwrap()),
        None,
    )
    .await;

    let (status, results) = send_json(&app, Method::GET, "/api/assignments/search?q=essay", None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = results["assignments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Reading"]);
    assert_eq!(results["courses"], json!(["Chemistry", "History"]));

    let (_, results) = send_json(
        &app,
        Method::GET,
        "/api/assignments/search?q=ESSAY&show_completed=true",
        None,
    )
    .await;
    assert_eq!(results["assignments"].as_array().unwrap().len(), 2);

    let (_, results) = send_json(
        &app,
        Method::GET,
        "/api/assignments/search?course=Chemistry&due_from=bogus&min_time=",
        None,
    )
    .await;
    assert_eq!(results["assignments"].as_array().unwrap().len(), 1);
    assert_eq!(results["assignments"][0]["title"], "Lab");
}

#[tokio::test]
async fn test_export_csv() {
    let app = setup_app().await;

    create(
        &app,
        json!({ "title": "Essay, part 1", "course": "English", "due_date": "2024-05-01", "estimated_time": 45 }),
    )
    .await;
    let done = create(&app, json!({ "title": "Quiz", "due_date": "2024-05-02" })).await;
    send_json(
        &app,
        Method::POST,
        &format!("/api/assignments/{}/toggle", done["id"].as_str().unwrap()),
        None,
    )
    .await;

    let req = Request::builder()
        .uri("/api/assignments/export?show_completed=true")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    assert!(
        response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("assignments.csv")
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let csv = String::from_utf8(body.to_vec()).unwrap();
    let lines: Vec<&str> = csv.trim_end().split("\r\n").collect();
    assert_eq!(
        lines,
        vec![
            "Title,Course,Due Date,Priority,Estimated Time (min),Notes,Completed",
            "\"Essay, part 1\",English,2024-05-01,2,45,,No",
            "Quiz,,2024-05-02,2,,,Yes",
        ]
    );
}
