use checkout_service::config::{
    Config, GraphConfig, InvoiceConfig, LoggingConfig, RapydConfig, ServerConfig,
    SharePointConfig,
};
use checkout_service::startup::Application;
use secrecy::Secret;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_SITE_ID: &str = "contoso.sharepoint.com,site-guid,web-guid";
pub const TEST_LIST_ID: &str = "invoice-list";
pub const TEST_TENANT_ID: &str = "tenant-123";
pub const TEST_TOKEN: &str = "test-graph-token";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    /// Stands in for both Graph and the token endpoint.
    pub graph: MockServer,
    pub rapyd: MockServer,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_rapyd_keys("rak_test", "rsk_test").await
    }

    pub async fn spawn_with_rapyd_keys(access_key: &str, secret_key: &str) -> Self {
        let graph = MockServer::start().await;
        let rapyd = MockServer::start().await;

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            sharepoint: SharePointConfig {
                site_id: TEST_SITE_ID.to_string(),
                list_id: TEST_LIST_ID.to_string(),
            },
            graph: GraphConfig {
                base_url: format!("{}/v1.0", graph.uri()),
                authority_url: graph.uri(),
                tenant_id: TEST_TENANT_ID.to_string(),
                client_id: "test-client".to_string(),
                client_secret: Secret::new("test-client-secret".to_string()),
                scope: "https://graph.microsoft.com/.default".to_string(),
                timeout_secs: 5,
            },
            rapyd: RapydConfig {
                access_key: Secret::new(access_key.to_string()),
                secret_key: Secret::new(secret_key.to_string()),
                base_url: rapyd.uri(),
                country: "US".to_string(),
                currency: "USD".to_string(),
                complete_checkout_url: Some("https://example.com/paid".to_string()),
                cancel_checkout_url: None,
                timeout_secs: 5,
            },
            invoice: InvoiceConfig {
                number_prefix: "TEST".to_string(),
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                json: false,
            },
            service_name: "checkout-service-test".to_string(),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            graph,
            rapyd,
            client,
        }
    }

    pub fn items_path(&self) -> String {
        format!("/v1.0/sites/{}/lists/{}/items", TEST_SITE_ID, TEST_LIST_ID)
    }

    /// Serve a client-credentials token, expecting `expected_calls` requests.
    pub async fn mock_token(&self, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(format!("/{}/oauth2/v2.0/token", TEST_TENANT_ID)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": TEST_TOKEN
            })))
            .expect(expected_calls)
            .mount(&self.graph)
            .await;
    }

    /// Make Rapyd issue `checkout_id` for every checkout request.
    pub async fn mock_checkout(&self, checkout_id: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/checkout"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": {
                    "error_code": "",
                    "status": "SUCCESS",
                    "message": "",
                    "response_code": "",
                    "operation_id": "op-1"
                },
                "data": {
                    "id": checkout_id,
                    "redirect_url": format!("https://sandboxcheckout.rapyd.net/?token={}", checkout_id),
                    "status": "NEW"
                }
            })))
            .mount(&self.rapyd)
            .await;
    }

    pub async fn post_invoice(&self, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}/invoices", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_payment_status(&self, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}/callbacks/payment", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_metrics(&self) -> String {
        self.client
            .get(format!("{}/metrics", self.address))
            .send()
            .await
            .expect("Failed to execute request")
            .text()
            .await
            .expect("Failed to read metrics body")
    }
}
