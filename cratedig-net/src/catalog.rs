use crate::error::{NetError, Result};
use async_trait::async_trait;
use cratedig_core::{parse_catalog, Catalog, ServerConfig};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use std::time::Duration;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "cratedig::catalog";

/// Where the album catalog comes from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the full catalog in server order.
    async fn fetch(&self) -> Result<Catalog>;
}

/// Fetches the catalog from the server's library endpoint.
pub struct CatalogClient {
    client: ClientWithMiddleware,
    url: String,
}

impl CatalogClient {
    /// Build a client with the configured timeout and transient-error retries.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let base_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("Cratedig/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(base_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            url: config.catalog_url.clone(),
        })
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    async fn fetch(&self) -> Result<Catalog> {
        info!(target: LOG_TARGET, "Fetching catalog from {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        debug!(target: LOG_TARGET, "Catalog response status: {status}");
        if !status.is_success() {
            warn!(target: LOG_TARGET, "Catalog endpoint returned status: {status}");
            return Err(NetError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let catalog = parse_catalog(&body)?;
        info!(target: LOG_TARGET, "Fetched {} albums", catalog.len());
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response per connection.
    async fn serve(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/library", listener.local_addr().unwrap());
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0_u8; 4096];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        url
    }

    fn client(url: String) -> CatalogClient {
        CatalogClient::new(&ServerConfig {
            catalog_url: url,
            max_retries: 0,
            ..ServerConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_parses_catalog() {
        let url = serve(
            "200 OK",
            r#"[{"id":"a1","title":"Kind of Blue","artist":"Miles Davis","discs":[{"disc_number":1,"tracks":[{"title":"So What","file_path":"/m/so-what.flac","duration":562.0}]}]}]"#,
        )
        .await;

        let catalog = client(url).fetch().await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].title, "Kind of Blue");
        assert_eq!(catalog[0].discs[0].tracks[0].title, "So What");
    }

    #[tokio::test]
    async fn test_fetch_reports_status() {
        let url = serve("503 Service Unavailable", "[]").await;
        let err = client(url).fetch().await.unwrap_err();
        assert!(matches!(err, NetError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_fetch_rejects_malformed_body() {
        let url = serve("200 OK", r#"{"albums":[]}"#).await;
        let err = client(url).fetch().await.unwrap_err();
        assert!(matches!(err, NetError::Core(_)));
    }
}
