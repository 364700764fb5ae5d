mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn report_rows_split_addresses() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_plan().await;
    app.create_subscriber(&catalog, "Asha Rao").await;

    let response = app.get("/subscribers/report").await;
    assert_eq!(response.status(), 200);

    let rows: Vec<Value> = response.json().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Name"], "Asha Rao");
    assert_eq!(rows[0]["Category"], "Library");
    assert_eq!(rows[0]["Type"], "Paid");
    assert_eq!(rows[0]["Address line 1"], "12 Temple Road Near Bus Stand Opposite");
    assert_eq!(rows[0]["Address line 2"], "Government High School");
    assert_eq!(rows[0]["Pincode"], "576101");
}

#[tokio::test]
async fn report_filters_by_names() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_plan().await;
    app.create_subscriber(&catalog, "Asha Rao").await;
    let school = app.create_lookup("/categories", "School").await;
    let mut body = common::subscriber_body(&catalog, "Ravi Kumar");
    body["category"] = json!(school);
    app.create("/subscribers", body).await;

    let rows: Vec<Value> = app
        .get("/subscribers/report?subscriberCategory=School")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Name"], "Ravi Kumar");

    let response = app
        .get("/subscribers/report?subscriberCategory=Hospital")
        .await;
    assert_eq!(response.status(), 404);

    let response = app.get("/subscribers/report?char_limit=0").await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn pdf_download() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_plan().await;
    for name in ["Asha Rao", "Ravi Kumar", "Meera Nair"] {
        app.create_subscriber(&catalog, name).await;
    }

    let response = app
        .get("/subscribers/report/pdf?cols=2&rows=1&orientation=landscape")
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/pdf"
    );
    assert_eq!(
        response.headers().get("content-disposition").unwrap(),
        "attachment; filename=\"subscriber_report.pdf\""
    );

    let bytes = response.bytes().await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn pdf_rejects_bad_layout() {
    let app = TestApp::spawn().await;

    let response = app.get("/subscribers/report/pdf?orientation=diagonal").await;
    assert_eq!(response.status(), 422);

    let response = app.get("/subscribers/report/pdf?cols=11").await;
    assert_eq!(response.status(), 422);

    // An empty report still renders one page.
    let response = app.get("/subscribers/report/pdf").await;
    assert_eq!(response.status(), 200);
}
