use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA, USER_AGENT};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    // None when the body could not be read
    pub body: Option<String>,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One GET against the result service. `Err` carries a description of a
/// request that never produced a response.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn get(&self, url: &reqwest::Url) -> Result<HttpReply, String>;
}

#[derive(Clone, Debug, Default)]
pub struct TransportOptions {
    pub proxy: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Error)]
pub enum TransportSetupError {
    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(options: &TransportOptions) -> Result<Self, TransportSetupError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("examresult/", env!("CARGO_PKG_VERSION"))),
        );

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(seconds) = options.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| TransportSetupError::ProxySetup {
                proxy: proxy.to_string(),
                source: e,
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TransportSetupError::HttpClientBuild { source: e })?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &reqwest::Url) -> Result<HttpReply, String> {
        let resp = self
            .client
            .get(url.clone())
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = resp.status().as_u16();
        let body = resp.text().await.ok();
        Ok(HttpReply { status, body })
    }
}
