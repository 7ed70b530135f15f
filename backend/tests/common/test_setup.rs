use std::sync::Arc;

use approved_cars::{
    provisioning::DemoImage,
    server,
    state::{AppServices, ResourceNames},
    types::Environment,
};
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_s3::Client as S3Client;
use axum::{body::Body, http::Request, response::Response, Router};
use tower::ServiceExt;
use uuid::Uuid;

/// Test configuration for LocalStack
const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";
const TEST_REGION: &str = "us-east-1";

/// Initialize tracing once for the test binary
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Unique resource names so tests can run in parallel
pub fn unique_resource_names() -> ResourceNames {
    let id = Uuid::new_v4().simple();
    ResourceNames {
        bucket: format!("test-cars-{id}"),
        images_table: format!("test-car-images-{id}"),
        credentials_table: format!("test-car-logins-{id}"),
    }
}

pub async fn localstack_clients() -> (Arc<S3Client>, Arc<DynamoDbClient>) {
    let credentials = Credentials::from_keys(
        "test", // AWS_ACCESS_KEY_ID
        "test", // AWS_SECRET_ACCESS_KEY
        None,   // no session token
    );
    let config = aws_config::defaults(BehaviorVersion::latest())
        .endpoint_url(LOCALSTACK_ENDPOINT)
        .region(Region::new(TEST_REGION))
        .credentials_provider(credentials)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&config)
        .force_path_style(true)
        .build();

    (
        Arc::new(S3Client::from_conf(s3_config)),
        Arc::new(DynamoDbClient::new(&config)),
    )
}

/// S3 client whose every request fails to connect
pub fn unreachable_s3_client() -> Arc<S3Client> {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .endpoint_url("http://127.0.0.1:9")
        .region(Region::new(TEST_REGION))
        .credentials_provider(Credentials::from_keys("test", "test", None))
        .retry_config(aws_sdk_s3::config::retry::RetryConfig::disabled())
        .force_path_style(true)
        .build();

    Arc::new(S3Client::from_conf(config))
}

/// Router plus services wired against LocalStack with unique resource names
///
/// Resources are torn down when the context is dropped.
pub struct TestContext {
    pub router: Router,
    pub services: AppServices,
    pub names: ResourceNames,
    pub s3_client: Arc<S3Client>,
    pub dynamodb_client: Arc<DynamoDbClient>,
}

impl TestContext {
    /// Creates the context without touching any AWS resource
    pub async fn new(demo_image_url: &str) -> Self {
        setup_test_env();

        let (s3_client, dynamodb_client) = localstack_clients().await;
        let names = unique_resource_names();

        let services = AppServices::new(
            s3_client.clone(),
            dynamodb_client.clone(),
            names.clone(),
            DemoImage {
                url: demo_image_url.to_string(),
                name: "car_image.png".to_string(),
            },
            300,
        )
        .expect("Failed to build services");

        let environment = Environment::Development {
            aws_endpoint_override: None,
        };
        let router = server::router(environment, &services);

        Self {
            router,
            services,
            names,
            s3_client,
            dynamodb_client,
        }
    }

    /// Creates the context and provisions its bucket and tables
    pub async fn provisioned(demo_image_url: &str) -> Self {
        let context = Self::new(demo_image_url).await;
        context
            .services
            .provisioner
            .ensure_all()
            .await
            .expect("Failed to provision test resources");
        context
    }

    pub async fn send_post_request(&self, route: &str, payload: serde_json::Value) -> Response {
        let request = Request::builder()
            .uri(route)
            .method("POST")
            .header("Content-Type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("Failed to build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    pub async fn send_get_request(&self, route: &str) -> Response {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())
            .expect("Failed to build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Registers a login through the API
    pub async fn register(&self, username: &str, password: &str) -> Response {
        self.send_post_request(
            "/v1/auth/register",
            serde_json::json!({ "username": username, "password": password }),
        )
        .await
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let provisioner = self.services.provisioner.clone();

        // Use tokio runtime to delete the bucket and tables
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let _ = provisioner.teardown().await;
            });
        }
    }
}
