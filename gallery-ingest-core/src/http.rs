use std::time::Duration;

use reqwest::Client;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client shared by the network-facing components.
///
/// Idle pooling is disabled: every request opens its own connection and
/// releases it when the response is consumed.
pub fn build_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(0)
        .user_agent(concat!("gallery-ingest/", env!("CARGO_PKG_VERSION")))
        .build()
}
