use crate::domain::model::Credentials;
use crate::domain::provider::{CertificatePage, HostView};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait CredentialProvider {
    fn load(&self) -> Result<Credentials>;
}

pub trait ProviderSettings: Send + Sync {
    fn base_url(&self) -> &str;
    fn timeout(&self) -> Duration;
    fn per_page(&self) -> usize;
    fn max_pages(&self) -> usize;
    fn concurrency(&self) -> usize;
}

/// Host-intelligence endpoint answering IP-scoped "view" queries.
#[async_trait]
pub trait HostIntel: Send + Sync {
    async fn view_host(&self, ip: &str) -> Result<HostView>;
}

/// Certificate index answering search queries one page at a time.
#[async_trait]
pub trait CertificateIndex: Send + Sync {
    async fn search_certificates(
        &self,
        query: &str,
        per_page: usize,
        cursor: Option<&str>,
    ) -> Result<CertificatePage>;
}
