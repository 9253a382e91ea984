use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::config::Region;

pub const S3_ENDPOINT: &str = "S3_ENDPOINT";
pub const SQS_ENDPOINT: &str = "SQS_ENDPOINT";
pub const LAMBDA_ENDPOINT: &str = "LAMBDA_ENDPOINT";

/// Optional endpoint overrides, for pointing the clients at a local stack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Endpoints {
    pub s3: Option<String>,
    pub sqs: Option<String>,
    pub lambda: Option<String>,
}

impl Endpoints {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Self {
            s3: get(S3_ENDPOINT),
            sqs: get(SQS_ENDPOINT),
            lambda: get(LAMBDA_ENDPOINT),
        }
    }
}

pub async fn load_shared_config() -> SdkConfig {
    let region_provider = RegionProviderChain::default_provider().or_else(Region::new("us-east-1"));
    aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await
}

pub fn s3_client(shared_config: &SdkConfig, endpoints: &Endpoints) -> aws_sdk_s3::Client {
    match &endpoints.s3 {
        Some(endpoint) => {
            tracing::info!("Using local S3 endpoint: {}", endpoint);
            let conf = aws_sdk_s3::config::Builder::from(shared_config)
                .endpoint_url(endpoint)
                .force_path_style(true)
                .build();
            aws_sdk_s3::Client::from_conf(conf)
        }
        None => aws_sdk_s3::Client::new(shared_config),
    }
}

pub fn sqs_client(shared_config: &SdkConfig, endpoints: &Endpoints) -> aws_sdk_sqs::Client {
    match &endpoints.sqs {
        Some(endpoint) => {
            tracing::info!("Using local SQS endpoint: {}", endpoint);
            let conf = aws_sdk_sqs::config::Builder::from(shared_config)
                .endpoint_url(endpoint)
                .build();
            aws_sdk_sqs::Client::from_conf(conf)
        }
        None => aws_sdk_sqs::Client::new(shared_config),
    }
}

pub fn lambda_client(shared_config: &SdkConfig, endpoints: &Endpoints) -> aws_sdk_lambda::Client {
    match &endpoints.lambda {
        Some(endpoint) => {
            tracing::info!("Using local Lambda endpoint: {}", endpoint);
            let conf = aws_sdk_lambda::config::Builder::from(shared_config)
                .endpoint_url(endpoint)
                .build();
            aws_sdk_lambda::Client::from_conf(conf)
        }
        None => aws_sdk_lambda::Client::new(shared_config),
    }
}
