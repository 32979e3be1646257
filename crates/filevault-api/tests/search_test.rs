//! Search API integration tests.
//!
//! Run with: `cargo test -p filevault-api --test search_test`

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use filevault_services::test_helpers::sample_record;
use helpers::{api_path, bearer, setup_test_app};
use uuid::Uuid;

async fn upload(client: &TestServer, owner: Uuid, name: &str) -> String {
    let form = MultipartForm::new().add_part("file", Part::bytes(b"content".to_vec()).file_name(name));
    let response = client
        .post(&api_path("/files"))
        .add_header("Authorization", bearer(owner))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), 201);
    response.json::<serde_json::Value>()["file_id"]
        .as_str()
        .expect("file_id")
        .to_string()
}

#[tokio::test]
async fn test_search_unauthorized() {
    let app = setup_test_app();

    let response = app
        .client()
        .get(&api_path("/search"))
        .add_query_param("name", "report")
        .await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_search_by_name_is_cached() {
    let app = setup_test_app();
    let owner = Uuid::new_v4();
    upload(app.client(), owner, "Quarterly-Report.pdf").await;
    upload(app.client(), owner, "holiday.jpg").await;

    let search = || {
        app.client()
            .get(&api_path("/search"))
            .add_query_param("name", "report")
            .add_query_param("limit", "10")
            .add_query_param("offset", "0")
            .add_header("Authorization", bearer(owner))
    };

    let first = search().await;
    assert_eq!(first.status_code(), 200);
    let results: Vec<serde_json::Value> = first.json();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["file_name"], "Quarterly-Report.pdf");
    let queries = app.store.query_count();

    let second = search().await;
    assert_eq!(second.status_code(), 200);
    assert_eq!(second.text(), first.text());
    assert_eq!(app.store.query_count(), queries);
}

#[tokio::test]
async fn test_upload_invalidates_owner_searches() {
    let app = setup_test_app();
    let owner = Uuid::new_v4();
    upload(app.client(), owner, "report-1.txt").await;

    let search = || {
        app.client()
            .get(&api_path("/search"))
            .add_query_param("name", "report")
            .add_header("Authorization", bearer(owner))
    };

    assert_eq!(search().await.json::<Vec<serde_json::Value>>().len(), 1);
    upload(app.client(), owner, "report-2.txt").await;
    assert_eq!(search().await.json::<Vec<serde_json::Value>>().len(), 2);
}

#[tokio::test]
async fn test_rename_invalidates_owner_searches() {
    let app = setup_test_app();
    let owner = Uuid::new_v4();
    let file_id = upload(app.client(), owner, "report.txt").await;

    let search = || {
        app.client()
            .get(&api_path("/search"))
            .add_query_param("name", "report")
            .add_header("Authorization", bearer(owner))
    };
    assert_eq!(search().await.json::<Vec<serde_json::Value>>().len(), 1);

    let rename = app
        .client()
        .patch(&api_path(&format!("/files/{}", file_id)))
        .add_header("Authorization", bearer(owner))
        .json(&serde_json::json!({ "name": "summary.txt" }))
        .await;
    assert_eq!(rename.status_code(), 200);

    assert!(search().await.json::<Vec<serde_json::Value>>().is_empty());
}

#[tokio::test]
async fn test_search_pagination() {
    let app = setup_test_app();
    let owner = Uuid::new_v4();
    for i in 0..3 {
        upload(app.client(), owner, &format!("file-{}.txt", i)).await;
    }

    let page = |offset: &'static str| {
        app.client()
            .get(&api_path("/search"))
            .add_query_param("limit", "2")
            .add_query_param("offset", offset)
            .add_header("Authorization", bearer(owner))
    };

    assert_eq!(page("0").await.json::<Vec<serde_json::Value>>().len(), 2);
    assert_eq!(page("2").await.json::<Vec<serde_json::Value>>().len(), 1);
}

#[tokio::test]
async fn test_search_invalid_date() {
    let app = setup_test_app();

    let response = app
        .client()
        .get(&api_path("/search"))
        .add_query_param("date", "03/01/2024")
        .add_header("Authorization", bearer(Uuid::new_v4()))
        .await;

    assert_eq!(response.status_code(), 400);
    let data: serde_json::Value = response.json();
    assert!(data["error"].as_str().unwrap_or("").contains("Invalid date"));
}

#[tokio::test]
async fn test_search_invalid_limit() {
    let app = setup_test_app();

    let response = app
        .client()
        .get(&api_path("/search"))
        .add_query_param("limit", "-3")
        .add_header("Authorization", bearer(Uuid::new_v4()))
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_search_by_date() {
    let app = setup_test_app();
    let owner = Uuid::new_v4();
    for (name, day) in [("first.txt", 1), ("second.txt", 2), ("also-second.txt", 2)] {
        let mut file = sample_record(owner, name);
        file.upload_date = Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap();
        app.store.seed(file);
    }

    let response = app
        .client()
        .get(&api_path("/search"))
        .add_query_param("date", "2024-06-02")
        .add_header("Authorization", bearer(owner))
        .await;

    assert_eq!(response.status_code(), 200);
    let results: Vec<serde_json::Value> = response.json();
    let mut names: Vec<&str> = results
        .iter()
        .map(|r| r["file_name"].as_str().expect("file_name"))
        .collect();
    names.sort();
    assert_eq!(names, vec!["also-second.txt", "second.txt"]);
}
