//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};

const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";
const DEFAULT_BUCKET_NAME: &str = "approved-cars-3632442";
const DEFAULT_IMAGES_TABLE: &str = "approved-car-images";
const DEFAULT_CREDENTIALS_TABLE: &str = "approved-car-logins";
const DEFAULT_DEMO_IMAGE_URL: &str =
    "https://www.linearity.io/blog/content/images/2023/06/how-to-create-a-car-NewBlogCover.png";
const DEFAULT_DEMO_IMAGE_NAME: &str = "car_image.png";

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development {
        /// Optional override for the `LocalStack` endpoint
        aws_endpoint_override: Option<String>,
    },
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development {
                aws_endpoint_override: non_empty_var("AWS_ENDPOINT_URL"),
            },
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Returns the S3 bucket name holding the vehicle images
    ///
    /// # Panics
    ///
    /// Panics in production and staging if `S3_BUCKET_NAME` is not set
    #[must_use]
    pub fn s3_bucket(&self) -> String {
        match self {
            Self::Production | Self::Staging => {
                env::var("S3_BUCKET_NAME").expect("S3_BUCKET_NAME environment variable is not set")
            }
            Self::Development { .. } => {
                non_empty_var("S3_BUCKET_NAME").unwrap_or_else(|| DEFAULT_BUCKET_NAME.to_string())
            }
        }
    }

    /// `DynamoDB` table holding one metadata record per image
    #[must_use]
    pub fn images_table(&self) -> String {
        non_empty_var("IMAGES_TABLE_NAME").unwrap_or_else(|| DEFAULT_IMAGES_TABLE.to_string())
    }

    /// `DynamoDB` table holding login credentials
    #[must_use]
    pub fn credentials_table(&self) -> String {
        non_empty_var("CREDENTIALS_TABLE_NAME")
            .unwrap_or_else(|| DEFAULT_CREDENTIALS_TABLE.to_string())
    }

    /// URL of the demo image seeded into the gallery
    #[must_use]
    pub fn demo_image_url(&self) -> String {
        non_empty_var("DEMO_IMAGE_URL").unwrap_or_else(|| DEFAULT_DEMO_IMAGE_URL.to_string())
    }

    /// File name recorded for the demo image
    #[must_use]
    pub fn demo_image_name(&self) -> String {
        non_empty_var("DEMO_IMAGE_NAME").unwrap_or_else(|| DEFAULT_DEMO_IMAGE_NAME.to_string())
    }

    /// Whether every bucket and table is torn down and recreated on process start
    #[must_use]
    pub fn reset_on_start(&self) -> bool {
        env::var("RESET_RESOURCES_ON_START")
            .ok()
            .map_or(matches!(self, Self::Development { .. }), |val| {
                matches!(val.trim().to_lowercase().as_str(), "1" | "true" | "yes")
            })
    }

    /// Credential created at startup, from `SEED_USERNAME` and `SEED_PASSWORD`
    #[must_use]
    pub fn seed_login(&self) -> Option<(String, String)> {
        Some((non_empty_var("SEED_USERNAME")?, non_empty_var("SEED_PASSWORD")?))
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development { .. } | Self::Staging)
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            // Regular AWS endpoints for production and staging
            Self::Production | Self::Staging => None,
            // LocalStack endpoint for development
            Self::Development {
                aws_endpoint_override,
            } => Some(
                aws_endpoint_override
                    .as_deref()
                    .unwrap_or(LOCALSTACK_ENDPOINT),
            ),
        }
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut config_builder = aws_config::load_defaults(BehaviorVersion::latest())
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }

    /// AWS S3 service configuration
    pub async fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let aws_config = self.aws_config().await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder();

        // Override "force path style" to true for compatibility with LocalStack
        // https://github.com/awslabs/aws-sdk-rust/discussions/874
        if matches!(self, Self::Development { .. }) {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }

    /// Presigned URL expiry time in seconds
    #[must_use]
    pub fn presigned_url_expiry_secs(&self) -> u64 {
        let default = 15 * 60;
        match self {
            Self::Production | Self::Staging => default,
            Self::Development { .. } => env::var("PRESIGNED_URL_EXPIRY_SECS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(default),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
