#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use std::sync::Arc;
use subscription_service::config::SubscriptionConfig;
use subscription_service::services::{FixedClock, MemoryStore};
use subscription_service::Application;

pub const ADMIN_USERNAME: &str = "asha";
pub const ADMIN_PASSWORD: &str = "s3cret-pass";

/// Business "today" of every test app is 2024-03-15 (+05:30).
pub fn test_clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2024, 3, 15, 6, 0, 0).unwrap())
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: Client,
    pub token: String,
}

impl TestApp {
    /// Spawn on a random port with an empty in-memory store and a logged-in admin.
    pub async fn spawn() -> Self {
        let app = Self::spawn_anonymous().await;
        app.signup(ADMIN_USERNAME, 1).await;
        let token = app.login(ADMIN_USERNAME, ADMIN_PASSWORD).await;
        TestApp { token, ..app }
    }

    pub async fn spawn_anonymous() -> Self {
        let mut config = SubscriptionConfig::for_memory_store();
        config.common.host = "127.0.0.1".to_string();
        config.common.port = 0;

        let application = Application::build_with(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(test_clock()),
        )
        .await
        .expect("Failed to build test application");

        let port = application.port();
        tokio::spawn(async move {
            application.run_until_stopped().await.ok();
        });

        let address = format!("http://127.0.0.1:{}", port);
        let client = Client::new();
        for _ in 0..50 {
            if client
                .get(format!("{}/health", address))
                .send()
                .await
                .is_ok()
            {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            port,
            client,
            token: String::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.token)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.authed(self.client.get(self.url(path)))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.authed(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(&self, path: &str, body: &Value) -> Response {
        self.authed(self.client.put(self.url(path)))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.authed(self.client.delete(self.url(path)))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn signup(&self, username: &str, suffix: u8) -> Response {
        self.client
            .post(self.url("/admins/signup"))
            .json(&json!({
                "username": username,
                "password": ADMIN_PASSWORD,
                "email": format!("{}@example.com", username),
                "first_name": "Asha",
                "last_name": "Rao",
                "aadhaar": format!("12345678901{}", suffix),
                "mobile": format!("987654321{}", suffix),
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .client
            .post(self.url("/admins/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), 200, "login failed for {}", username);

        let body: Value = response.json().await.expect("Failed to parse JSON");
        body["token"].as_str().expect("token missing").to_string()
    }

    /// POST and return the created record's `_id`.
    pub async fn create(&self, path: &str, body: Value) -> String {
        let response = self.post(path, &body).await;
        assert_eq!(response.status(), 201, "create {} failed", path);
        let created: Value = response.json().await.expect("Failed to parse JSON");
        created["_id"].as_str().expect("_id missing").to_string()
    }

    pub async fn create_lookup(&self, path: &str, name: &str) -> String {
        self.create(path, json!({ "name": name })).await
    }

    /// English / Print language and mode plus one 6-month plan at 500.
    pub async fn seed_plan(&self) -> Catalog {
        let language = self.create_lookup("/languages", "English").await;
        let mode = self.create_lookup("/modes", "Print").await;
        let plan = self
            .create(
                "/plans",
                json!({
                    "subscription_language": language,
                    "subscription_mode": mode,
                    "duration_in_months": 6,
                    "subscription_price": "500",
                }),
            )
            .await;
        let category = self.create_lookup("/categories", "Library").await;
        let stype = self.create_lookup("/subscriber-types", "Paid").await;

        Catalog {
            language,
            mode,
            plan,
            category,
            stype,
        }
    }

    pub async fn create_subscriber(&self, catalog: &Catalog, name: &str) -> String {
        self.create("/subscribers", subscriber_body(catalog, name)).await
    }
}

pub struct Catalog {
    pub language: String,
    pub mode: String,
    pub plan: String,
    pub category: String,
    pub stype: String,
}

pub fn subscriber_body(catalog: &Catalog, name: &str) -> Value {
    json!({
        "name": name,
        "address": "12 Temple Road Near Bus Stand Opposite Government High School",
        "city_town": "Udupi",
        "district": "Udupi",
        "state": "Karnataka",
        "pincode": "576101",
        "phone": "9000000000",
        "category": catalog.category,
        "stype": catalog.stype,
    })
}
