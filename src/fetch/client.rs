use async_trait::async_trait;
use reqwest::{Request, Response};

/// Transport used by [`super::load_source`] for URL sources.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
