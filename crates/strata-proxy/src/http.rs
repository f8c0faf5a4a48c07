// HTTP record source
//
// Fetches the full record set with a single GET. Non-success statuses are
// surfaced with a short body preview; the body itself goes through the
// shared envelope decoder.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use strata_core::{CoreError, DataProxy, Record};
use tracing::{debug, warn};
use url::Url;

use crate::envelope::decode_records;
use crate::error::{Error, preview};
use crate::transport::TransportConfig;

/// Reads records from a JSON endpoint.
#[derive(Debug, Clone)]
pub struct HttpProxy {
    http: reqwest::Client,
    url: Url,
}

impl HttpProxy {
    /// Create a proxy for `url`, building a client from `transport`.
    pub fn new(url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            url,
        })
    }

    /// Parse `url` and create a proxy for it.
    pub fn parse(url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        Self::new(Url::parse(url)?, transport)
    }

    /// Create a proxy with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, url: Url) -> Self {
        Self { http, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// GET the endpoint and decode its records.
    pub async fn fetch(&self) -> Result<Vec<Record>, Error> {
        debug!("GET {}", self.url);

        let resp = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body: preview(&body, 200).to_owned(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let records = decode_records(&body)?;
        debug!(url = %self.url, count = records.len(), "records fetched");
        Ok(records)
    }
}

impl DataProxy for HttpProxy {
    fn read(&self) -> BoxFuture<'_, Result<Vec<Record>, CoreError>> {
        async move {
            self.fetch().await.map_err(|e| {
                warn!(url = %self.url, error = %e, "HTTP proxy read failed");
                CoreError::from(e)
            })
        }
        .boxed()
    }
}
