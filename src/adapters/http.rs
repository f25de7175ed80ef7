use crate::core::{CertificateIndex, HostIntel, ProviderSettings};
use crate::domain::model::Credentials;
use crate::domain::provider::{CertificatePage, HostView};
use crate::utils::error::{ProbeError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://search.censys.io/api";

/// Every v2 response wraps its payload in `{"code", "status", "result"}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResult {
    hits: Vec<serde_json::Value>,
    links: SearchLinks,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchLinks {
    next: Option<String>,
}

/// Censys search API v2 client, authenticated with HTTP basic auth.
#[derive(Clone)]
pub struct CensysClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl CensysClient {
    pub fn new(credentials: Credentials, settings: &impl ProviderSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, operation: &str, request: RequestBuilder) -> Result<T> {
        let response = request
            .basic_auth(&self.credentials.api_id, Some(&self.credentials.api_secret))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("{} response status: {}", operation, status);

        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProbeError::ProviderError {
                operation: operation.to_string(),
                status: status.as_u16(),
                message: error_message(&body, status.canonical_reason()),
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| ProbeError::malformed(format!("{}: {}", operation, e)))?;
        Ok(envelope.result)
    }
}

/// Pulls the human-readable reason out of a Censys error body.
fn error_message(body: &str, fallback: Option<&str>) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let from_json = parsed.as_ref().and_then(|value| {
        value
            .get("error")
            .or_else(|| value.get("status"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    });

    from_json
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.chars().take(200).collect())
        })
        .or_else(|| fallback.map(str::to_string))
        .unwrap_or_else(|| "no error detail".to_string())
}

#[async_trait]
impl HostIntel for CensysClient {
    async fn view_host(&self, ip: &str) -> Result<HostView> {
        let url = format!("{}/v2/hosts/{}", self.base_url, ip);
        tracing::debug!("Making host view request to: {}", url);
        self.fetch("host view", self.client.get(url)).await
    }
}

#[async_trait]
impl CertificateIndex for CensysClient {
    async fn search_certificates(
        &self,
        query: &str,
        per_page: usize,
        cursor: Option<&str>,
    ) -> Result<CertificatePage> {
        let url = format!("{}/v2/certificates/search", self.base_url);
        let per_page = per_page.to_string();

        let mut request = self
            .client
            .get(url)
            .query(&[("q", query), ("per_page", per_page.as_str())]);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let result: SearchResult = self.fetch("certificate search", request).await?;
        Ok(CertificatePage {
            hits: result.hits,
            next_cursor: result.links.next.filter(|next| !next.is_empty()),
        })
    }
}
