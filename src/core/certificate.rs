use crate::core::{bounded, CertificateIndex, CertificateRecord, Collected, Result};
use crate::domain::provider::CertificateDocument;
use crate::utils::error::ProbeError;
use std::time::Duration;

pub const TRUSTED_TAG: &str = "trusted";

const UNKNOWN_ALGORITHM: &str = "Unknown";

/// Search expression for trusted certificates whose subject or SAN names `hostname`.
pub fn trusted_query(hostname: &str) -> String {
    format!("tags: {} and names: {}", TRUSTED_TAG, hostname)
}

/// Looks up the trusted certificates issued for a hostname.
pub struct CertificateTrustClient<C: CertificateIndex> {
    index: C,
    timeout: Duration,
    per_page: usize,
    max_pages: usize,
}

impl<C: CertificateIndex> CertificateTrustClient<C> {
    pub fn new(index: C, timeout: Duration, per_page: usize, max_pages: usize) -> Self {
        Self {
            index,
            timeout,
            per_page: per_page.max(1),
            max_pages: max_pages.max(1),
        }
    }

    pub async fn search_trusted_certificates(&self, hostname: &str) -> Vec<CertificateRecord> {
        self.collect_certificates(hostname).await.items
    }

    /// Walks the search pages in order. Hits are consumed once; when a page or a
    /// document fails, the records read before it are returned with the failure.
    pub async fn collect_certificates(&self, hostname: &str) -> Collected<CertificateRecord> {
        let query = trusted_query(hostname);
        tracing::info!(hostname, query = %query, "🔎 Searching trusted certificates");

        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        for page_number in 1..=self.max_pages {
            let search = self
                .index
                .search_certificates(&query, self.per_page, cursor.as_deref());

            let page = match bounded("certificate search", self.timeout, search).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(
                        hostname,
                        page = page_number,
                        kept = records.len(),
                        error = %e,
                        "⚠️ Certificate search failed: {}",
                        e
                    );
                    return Collected::partial(records, e);
                }
            };

            for hit in page.hits {
                match normalize_certificate(hit) {
                    Ok(record) => {
                        tracing::info!(
                            hostname,
                            signature_algorithm = %record.signature_algorithm,
                            common_names = ?record.common_names,
                            organizations = ?record.organization_names,
                            validity_start = %record.validity_start,
                            validity_end = %record.validity_end,
                            "📜 Trusted certificate found"
                        );
                        records.push(record);
                    }
                    Err(e) => {
                        tracing::error!(hostname, kept = records.len(), error = %e, "❌ Unreadable certificate document");
                        return Collected::partial(records, e);
                    }
                }
            }

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        tracing::info!(hostname, count = records.len(), "✅ Found {} trusted certificates", records.len());
        Collected::complete(records)
    }
}

/// Reads one certificate search hit into a [`CertificateRecord`].
pub fn normalize_certificate(hit: serde_json::Value) -> Result<CertificateRecord> {
    let document: CertificateDocument = serde_json::from_value(hit)
        .map_err(|e| ProbeError::malformed(format!("certificate document: {}", e)))?;
    let parsed = document.parsed;

    let signature_algorithm = parsed
        .signature_algorithm
        .and_then(|algorithm| algorithm.name)
        .unwrap_or_else(|| UNKNOWN_ALGORITHM.to_string());

    Ok(CertificateRecord {
        signature_algorithm,
        common_names: parsed
            .subject
            .common_name
            .map(|names| names.into_vec())
            .unwrap_or_default(),
        validity_start: parsed.validity.start.unwrap_or_default(),
        validity_end: parsed.validity.end.unwrap_or_default(),
        organization_names: parsed
            .subject
            .organization
            .map(|names| names.into_vec())
            .unwrap_or_default(),
    })
}
