pub mod batch;
pub mod certificate;
pub mod correlator;
pub mod exposure;
pub mod report;

pub use crate::domain::model::{
    CertificateRecord, Collected, CorrelationResult, Finding, ServiceExposure, Target,
};
pub use crate::domain::ports::{CertificateIndex, HostIntel, ProviderSettings, Storage};
pub use crate::utils::error::Result;

use crate::utils::error::ProbeError;
use std::future::Future;
use std::time::Duration;

/// Runs one provider call under a deadline; running out of time is a query failure like any other.
pub(crate) async fn bounded<T, F>(operation: &str, limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ProbeError::Timeout {
            operation: operation.to_string(),
            seconds: limit.as_secs(),
        }),
    }
}
