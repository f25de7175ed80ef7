use crate::utils::error::ProbeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// API identity for the intelligence provider. Loaded once, never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_id: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_id: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_id: api_id.into(),
            api_secret: api_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_id", &self.api_id)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// A network service the provider reports as reachable on the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceExposure {
    pub port: u16,
    pub protocol: String,
}

impl ServiceExposure {
    pub fn new(port: u16, protocol: impl Into<String>) -> Self {
        Self {
            port,
            protocol: protocol.into(),
        }
    }

    pub fn is_https_capable(&self) -> bool {
        self.protocol == "https" || self.port == 443
    }
}

/// True when at least one exposure speaks HTTPS.
pub fn any_https_capable(services: &[ServiceExposure]) -> bool {
    services.iter().any(ServiceExposure::is_https_capable)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub signature_algorithm: String,
    pub common_names: Vec<String>,
    /// Provider timestamp, passed through unparsed.
    pub validity_start: String,
    pub validity_end: String,
    pub organization_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub services: Vec<ServiceExposure>,
    pub certificates: Vec<CertificateRecord>,
}

impl CorrelationResult {
    pub fn is_https_capable(&self) -> bool {
        any_https_capable(&self.services)
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.certificates.is_empty()
    }
}

/// One host to look up: the address to view and the name its certificates should carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub ip: IpAddr,
    pub hostname: String,
}

impl Target {
    pub fn new(ip: IpAddr, hostname: impl Into<String>) -> Self {
        Self {
            ip,
            hostname: hostname.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.hostname, self.ip)
    }
}

/// A target paired with what was learned about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(flatten)]
    pub target: Target,
    #[serde(flatten)]
    pub result: CorrelationResult,
}

/// Items gathered from a provider, plus the failure that cut the lookup short, if any.
#[derive(Debug)]
pub struct Collected<T> {
    pub items: Vec<T>,
    pub failure: Option<ProbeError>,
}

impl<T> Collected<T> {
    pub fn complete(items: Vec<T>) -> Self {
        Self {
            items,
            failure: None,
        }
    }

    pub fn partial(items: Vec<T>, failure: ProbeError) -> Self {
        Self {
            items,
            failure: Some(failure),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}
