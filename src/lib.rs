pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{CensysClient, LocalStorage};
pub use config::AppConfig;
pub use core::{
    batch::{BatchReport, BatchRunner, BatchSummary},
    certificate::CertificateTrustClient,
    correlator::Correlator,
    exposure::HostExposureClient,
    report::{ReportFormat, ReportWriter},
};
pub use domain::model::{CertificateRecord, CorrelationResult, Credentials, Finding, ServiceExposure, Target};
pub use utils::error::{ProbeError, Result};
