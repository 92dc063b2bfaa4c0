use aws_sdk_bedrockruntime::Client;

/// Build a Bedrock runtime client from the default AWS config.
pub async fn build_client() -> Client {
    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    Client::new(&config)
}

pub fn from_config(config: &aws_config::SdkConfig) -> Client {
    Client::new(config)
}
