mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::*;
use df_compliance::compliance::catalogue;
use df_compliance::compliance::license::LicenseTier;
use df_compliance::compliance::store::RoleStore;

async fn restrict_to(app: &TestApp, tabs: serde_json::Value) -> i64 {
    send_json(
        app,
        Method::PUT,
        "/api/v2/system/admin",
        Some(root_user()),
        json!({ "id": RESTRICTED_ID, "email": RESTRICTED_EMAIL, "is_restricted_admin": true, "access_by_tabs": tabs }),
    )
    .await;
    let name = format!("{}'s role", RESTRICTED_EMAIL);
    app.state.stores.roles.find_by_name(&name).await.unwrap().expect("role").id
}

#[tokio::test]
async fn role_read_lists_granted_tabs() {
    let app = test_app();
    let role_id = restrict_to(&app, json!(["apps", "files"])).await;

    let uri = format!("/api/v2/system/role/{}?accessible_tabs=true", role_id);
    let (status, body) = send_empty(&app, Method::GET, &uri, Some(root_user())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accessible_tabs"], json!(["apps", "roles", "files"]));
}

#[tokio::test]
async fn unlinked_role_sees_every_tab() {
    let app = test_app();

    let (_, body) =
        send_empty(&app, Method::GET, "/api/v2/system/role/4242?accessible_tabs=1", Some(root_user())).await;
    assert_eq!(body["accessible_tabs"], json!(catalogue::all_tabs()));
}

#[tokio::test]
async fn without_the_flag_nothing_is_added() {
    let app = test_app();
    let role_id = restrict_to(&app, json!(["apps"])).await;

    let uri = format!("/api/v2/system/role/{}", role_id);
    let (_, body) = send_empty(&app, Method::GET, &uri, Some(root_user())).await;
    assert!(body.get("accessible_tabs").is_none());
    assert_eq!(body["id"], json!(role_id));
}

#[tokio::test]
async fn lists_are_left_intact() {
    let app = test_app();

    let (status, body) =
        send_empty(&app, Method::GET, "/api/v2/system/role?accessible_tabs=true", Some(root_user())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "resource": [] }));
}

#[tokio::test]
async fn non_gold_responses_are_untouched() {
    let app = test_app_with_license(LicenseTier::Silver);

    let (_, body) =
        send_empty(&app, Method::GET, "/api/v2/system/role/4242?accessible_tabs=true", Some(root_user())).await;
    assert_eq!(body, json!({ "id": 4242, "name": "role 4242" }));
}
