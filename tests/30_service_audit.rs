mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::*;

#[tokio::test]
async fn created_service_is_reported() {
    let app = test_app();

    let (status, _) =
        send_json(&app, Method::POST, "/api/v2/system/service", Some(root_user()), json!({ "name": "mysql" })).await;
    assert_eq!(status, StatusCode::OK);

    let reports = app.store.list_reports().await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].service_name, "mysql");
    assert_eq!(reports[0].user_email, ROOT_EMAIL);
    assert_eq!(reports[0].action.as_deref(), Some("Service created"));
    assert_eq!(reports[0].request_verb, "POST");
}

#[tokio::test]
async fn deleted_service_name_is_captured_before_the_delete() {
    let app = test_app();
    let db_id = app.store.service_id("db").await.unwrap();

    let uri = format!("/api/v2/system/service/{}", db_id);
    let (status, _) = send_empty(&app, Method::DELETE, &uri, Some(root_user())).await;
    assert_eq!(status, StatusCode::OK);

    let reports = app.store.list_reports().await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].service_name, "db");
    assert_eq!(reports[0].action.as_deref(), Some("Service deleted"));
    assert_eq!(reports[0].request_verb, "DELETE");
}

#[tokio::test]
async fn batch_update_reports_each_service() {
    let app = test_app();
    let db_id = app.store.service_id("db").await.unwrap();
    let logs_id = app.store.service_id("logs").await.unwrap();

    let (status, _) = send_json(
        &app,
        Method::PATCH,
        "/api/v2/system/service",
        Some(root_user()),
        json!({ "resource": [{ "id": db_id, "label": "DB" }, { "id": logs_id.to_string() }] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<String> = app.store.list_reports().await.into_iter().map(|r| r.service_name).collect();
    assert_eq!(names, vec!["db", "logs"]);
}

#[tokio::test]
async fn ids_parameter_names_the_services() {
    let app = test_app();
    let files_id = app.store.service_id("files").await.unwrap();
    let email_id = app.store.service_id("email").await.unwrap();

    let uri = format!("/api/v2/system/service?ids={},{}", files_id, email_id);
    let (status, _) = send_empty(&app, Method::DELETE, &uri, Some(root_user())).await;
    assert_eq!(status, StatusCode::OK);

    let reports = app.store.list_reports().await;
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.action.as_deref() == Some("Service deleted")));
}

#[tokio::test]
async fn failed_requests_are_not_reported() {
    let app = test_app();

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/v2/system/service",
        Some(root_user()),
        json!({ "name": "broken", "fail": true }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.store.list_reports().await.is_empty());
}

#[tokio::test]
async fn reads_and_other_resources_are_not_reported() {
    let app = test_app();
    let db_id = app.store.service_id("db").await.unwrap();

    let uri = format!("/api/v2/system/service/{}", db_id);
    let (status, _) = send_empty(&app, Method::GET, &uri, Some(root_user())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_empty(&app, Method::DELETE, "/api/v2/system/service_report", Some(root_user())).await;
    assert_eq!(status, StatusCode::OK);

    assert!(app.store.list_reports().await.is_empty());
}

#[tokio::test]
async fn unknown_service_id_is_reported_blank() {
    let app = test_app();

    let (status, _) = send_empty(&app, Method::DELETE, "/api/v2/system/service/9999", Some(root_user())).await;
    assert_eq!(status, StatusCode::OK);

    let reports = app.store.list_reports().await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].service_name, "");
}
