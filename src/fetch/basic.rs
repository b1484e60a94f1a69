use std::time::Duration;

use super::client::HttpClient;
use async_trait::async_trait;
use tracing::warn;

const USER_AGENT: &str = concat!("equipment_monitor/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Plain `reqwest` client used to download logs published over HTTP.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "HTTP client setup failed, using reqwest defaults");
                reqwest::Client::new()
            });
        Self(client)
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_client_builds_requests() {
        let client = BasicClient::default();
        let req = client
            .0
            .get("http://localhost/log.txt")
            .build()
            .unwrap();

        assert_eq!(req.url().path(), "/log.txt");
        assert!(USER_AGENT.starts_with("equipment_monitor/"));
    }
}
