mod common;

use common::TestApp;
use serde_json::{json, Value};

async fn subscriber_flag(app: &TestApp, subscriber: &str) -> bool {
    let body: Value = app
        .get(&format!("/subscribers/{}", subscriber))
        .await
        .json()
        .await
        .unwrap();
    body["hasActiveSubscriptions"].as_bool().unwrap()
}

#[tokio::test]
async fn default_period_and_aggregate_flag() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_plan().await;
    let subscriber = app.create_subscriber(&catalog, "Asha Rao").await;
    assert!(!subscriber_flag(&app, &subscriber).await);

    let response = app
        .post(
            "/subscriptions",
            &json!({ "subscriber": subscriber, "subscription_plan": catalog.plan }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["start_date"], "2024-04-10");
    assert_eq!(body["end_date"], "2024-10-31");
    assert_eq!(body["active"], true);
    assert_eq!(body["payment_status"], "Pending");
    assert!(subscriber_flag(&app, &subscriber).await);

    let response = app
        .delete(&format!("/subscriptions/{}", body["_id"].as_str().unwrap()))
        .await;
    assert_eq!(response.status(), 200);
    assert!(!subscriber_flag(&app, &subscriber).await);
}

#[tokio::test]
async fn lapsed_period_is_inactive() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_plan().await;
    let subscriber = app.create_subscriber(&catalog, "Asha Rao").await;

    let response = app
        .post(
            "/subscriptions",
            &json!({
                "subscriber": subscriber,
                "subscription_plan": catalog.plan,
                "start_date": "2023-01-15",
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["end_date"], "2023-07-31");
    assert_eq!(body["active"], false);
    assert!(!subscriber_flag(&app, &subscriber).await);
}

#[tokio::test]
async fn editing_into_the_past_clears_the_flag() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_plan().await;
    let subscriber = app.create_subscriber(&catalog, "Asha Rao").await;
    let id = app
        .create(
            "/subscriptions",
            json!({ "subscriber": subscriber, "subscription_plan": catalog.plan }),
        )
        .await;
    assert!(subscriber_flag(&app, &subscriber).await);

    let response = app
        .put(
            &format!("/subscriptions/{}", id),
            &json!({
                "subscriber": subscriber,
                "subscription_plan": catalog.plan,
                "start_date": "2023-01-15",
                "payment_status": "Paid",
                "payment_date": "2023-01-10",
            }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["active"], false);
    assert_eq!(body["payment_status"], "Paid");
    assert_eq!(body["payment_date"], "2023-01-10");
    assert!(!subscriber_flag(&app, &subscriber).await);
}

#[tokio::test]
async fn overlapping_subscription_conflicts() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_plan().await;
    let subscriber = app.create_subscriber(&catalog, "Asha Rao").await;
    let body = json!({ "subscriber": subscriber, "subscription_plan": catalog.plan });

    app.create("/subscriptions", body.clone()).await;
    let response = app.post("/subscriptions", &body).await;
    assert_eq!(response.status(), 409);

    // A later, disjoint period is fine.
    let response = app
        .post(
            "/subscriptions",
            &json!({
                "subscriber": subscriber,
                "subscription_plan": catalog.plan,
                "start_date": "2024-11-01",
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let listed: Vec<Value> = app
        .get(&format!("/subscriptions/by-subscriber/{}", subscriber))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn invalid_requests() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_plan().await;
    let subscriber = app.create_subscriber(&catalog, "Asha Rao").await;

    let null_plan = app
        .post(
            "/subscriptions",
            &json!({ "subscriber": subscriber, "subscription_plan": null }),
        )
        .await;
    assert_eq!(null_plan.status(), 422);

    let bad_date = app
        .post(
            "/subscriptions",
            &json!({
                "subscriber": subscriber,
                "subscription_plan": catalog.plan,
                "start_date": "15/01/2024",
            }),
        )
        .await;
    assert_eq!(bad_date.status(), 422);

    let unknown_subscriber = app
        .post(
            "/subscriptions",
            &json!({ "subscriber": "SUBS999999", "subscription_plan": catalog.plan }),
        )
        .await;
    assert_eq!(unknown_subscriber.status(), 404);

    let unknown_mode = app
        .post(
            "/subscriptions",
            &json!({
                "subscriber": subscriber,
                "subscription_plan": catalog.plan,
                "payment_mode": "PMODE999999",
            }),
        )
        .await;
    assert_eq!(unknown_mode.status(), 404);
}

#[tokio::test]
async fn payment_mode_reference() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_plan().await;
    let subscriber = app.create_subscriber(&catalog, "Asha Rao").await;
    let mode = app
        .create(
            "/payment-modes",
            json!({ "name": "UPI", "details": "Scan the counter QR" }),
        )
        .await;

    let response = app
        .post(
            "/subscriptions",
            &json!({
                "subscriber": subscriber,
                "subscription_plan": catalog.plan,
                "payment_mode": mode,
                "payment_id": "TXN-42",
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["payment_mode"], mode.as_str());
    assert_eq!(body["payment_id"], "TXN-42");
}
