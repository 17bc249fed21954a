use catalog_service::config::{CatalogConfig, CorsConfig, MongoConfig, PaginationConfig};
use catalog_service::services::MongoDb;
use catalog_service::startup::Application;
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use uuid::Uuid;

const DEFAULT_TEST_URI: &str = "mongodb://localhost:27017/?serverSelectionTimeoutMS=2000";

pub fn test_config(uri: Option<String>, database: &str) -> CatalogConfig {
    CatalogConfig {
        common: CoreConfig {
            port: 0, // Random port for testing
            log_level: "error".to_string(),
            otlp_endpoint: None,
        },
        mongodb: MongoConfig {
            uri: uri.map(Secret::new),
            database: database.to_string(),
            collection: "products".to_string(),
        },
        pagination: PaginationConfig::default(),
        cors: CorsConfig {
            allowed_origins: vec!["*".to_string()],
        },
    }
}

pub struct TestApp {
    pub address: String,
    pub db: MongoDb,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawns the service against a fresh database. Returns `None` when no
    /// MongoDB answers, so store-backed tests can bail out early.
    pub async fn spawn() -> Option<Self> {
        let uri = std::env::var("MONGODB_URI").unwrap_or_else(|_| DEFAULT_TEST_URI.to_string());
        let db_name = format!("catalog_test_{}", Uuid::new_v4().simple());

        let app = Application::build(test_config(Some(uri), &db_name))
            .await
            .expect("Failed to build test application");

        let db = app.db().expect("store handle should be configured").clone();
        if let Err(e) = db.health_check().await {
            eprintln!("Skipping store-backed test, MongoDB is unreachable: {}", e);
            return None;
        }

        let address = format!("http://127.0.0.1:{}", app.port());
        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client.get(&address).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        Some(TestApp {
            address,
            db,
            client,
        })
    }

    pub async fn create_product(&self, body: Value) -> String {
        let response = self
            .client
            .post(format!("{}/products", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request");
        assert!(response.status().is_success());

        let body: Value = response.json().await.expect("Failed to parse JSON");
        body["data"]["insertedId"]
            .as_str()
            .expect("insertedId should be a hex string")
            .to_string()
    }

    pub async fn create_named(&self, name: &str) -> String {
        self.create_product(json!({ "name": name })).await
    }

    pub async fn get_json(&self, path_and_query: &str) -> Value {
        self.client
            .get(format!("{}{}", self.address, path_and_query))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .expect("Failed to parse JSON")
    }

    /// Drops the per-test database.
    pub async fn cleanup(&self) {
        let _ = self.db.database().drop(None).await;
    }
}
