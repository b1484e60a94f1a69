//! Loading raw log bytes from a local path or an HTTP URL.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use tracing::debug;

use crate::error::{Error, Result};

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(
        reqwest::Method::GET,
        url.parse().map_err(|_| Error::Url(url.to_string()))?,
    );

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Reads a log from a file path, or fetches it when `source` is a URL.
#[tracing::instrument(skip(client))]
pub async fn load_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    let bytes = if is_url(source) {
        fetch_bytes(client, source).await?
    } else {
        tokio::fs::read(source).await?
    };
    debug!(bytes = bytes.len(), "Source loaded");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/log.txt"));
        assert!(is_url("http://10.0.0.1/a"));
        assert!(!is_url("logs/http_dump.txt"));
        assert!(!is_url("/tmp/monitor.txt"));
    }

    #[tokio::test]
    async fn test_load_source_reads_local_file() {
        let path = std::env::temp_dir().join("equipment_monitor_fetch_test.txt");
        std::fs::write(&path, b"Fecha/Hora;Equipo").unwrap();

        let bytes = load_source(&BasicClient::new(), path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(bytes, b"Fecha/Hora;Equipo");

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_load_source_missing_file() {
        let err = load_source(&BasicClient::new(), "/nonexistent/equipment_monitor.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
