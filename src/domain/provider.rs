//! Response shapes as the intelligence provider sends them.
//!
//! Everything here is lenient on purpose: optional fields default, and
//! string-or-list fields are accepted in both forms. Conversion into the
//! strict model types happens once, in the clients.

use serde::Deserialize;

/// Body of a host "view": the services collection, entries left raw
/// because the provider mixes service-specific keys into each record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HostView {
    pub services: Vec<serde_json::Value>,
}

/// The subset of a service record the exposure client reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawService {
    pub port: Option<i64>,
    pub service_name: Option<String>,
    pub transport_protocol: Option<String>,
}

/// One page of certificate search hits and the cursor for the next one.
#[derive(Debug, Clone, Default)]
pub struct CertificatePage {
    pub hits: Vec<serde_json::Value>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CertificateDocument {
    pub parsed: ParsedCertificate,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParsedCertificate {
    pub signature_algorithm: Option<SignatureAlgorithm>,
    pub subject: CertificateSubject,
    pub validity: CertificateValidity,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignatureAlgorithm {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CertificateSubject {
    pub common_name: Option<OneOrMany>,
    pub organization: Option<OneOrMany>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CertificateValidity {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// A field the provider sends either as a bare string or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}
