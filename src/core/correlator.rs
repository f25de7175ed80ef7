use crate::core::certificate::CertificateTrustClient;
use crate::core::exposure::HostExposureClient;
use crate::core::{CertificateIndex, CorrelationResult, HostIntel, Target};
use crate::domain::model::any_https_capable;
use crate::utils::error::{ErrorCategory, ProbeError};
use tracing::Instrument;

/// Combines the exposure lookup with the certificate lookup for one target.
///
/// Certificates are only searched when at least one exposed service is
/// HTTPS-capable. Provider failures degrade to empty or partial lists and
/// are reported through the log; a correlation always yields a result.
pub struct Correlator<H: HostIntel, C: CertificateIndex> {
    exposures: HostExposureClient<H>,
    certificates: CertificateTrustClient<C>,
}

impl<H: HostIntel, C: CertificateIndex> Correlator<H, C> {
    pub fn new(exposures: HostExposureClient<H>, certificates: CertificateTrustClient<C>) -> Self {
        Self {
            exposures,
            certificates,
        }
    }

    pub async fn correlate(&self, ip: &str, hostname: &str) -> CorrelationResult {
        let span = tracing::info_span!("correlate", ip, hostname);
        self.run(ip, hostname).instrument(span).await
    }

    pub async fn correlate_target(&self, target: &Target) -> CorrelationResult {
        self.correlate(&target.ip.to_string(), &target.hostname).await
    }

    async fn run(&self, ip: &str, hostname: &str) -> CorrelationResult {
        tracing::info!("🚀 Correlation started");
        let mut result = CorrelationResult::default();

        let exposures = self.exposures.collect_exposures(ip).await;
        result.services = exposures.items;
        let lookup_failed = exposures.failure.is_some();
        if is_execution_failure(exposures.failure) {
            return result;
        }

        // A failed lookup was already reported by the exposure client.
        if result.services.is_empty() && !lookup_failed {
            tracing::warn!("⚠️ No exposure information available for {}", hostname);
        }

        let https = any_https_capable(&result.services);
        tracing::info!(https, "🔐 HTTPS capable: {}", https);
        if !https {
            return result;
        }

        let certificates = self.certificates.collect_certificates(hostname).await;
        result.certificates = certificates.items;
        if is_execution_failure(certificates.failure) {
            return result;
        }

        tracing::info!(
            services = result.services.len(),
            certificates = result.certificates.len(),
            "🏁 Correlation finished"
        );
        result
    }
}

/// Query failures were already logged by the client and just mean "nothing
/// found". Anything else stops the correlation with what was gathered so far.
fn is_execution_failure(failure: Option<ProbeError>) -> bool {
    match failure {
        Some(e) if e.category() != ErrorCategory::Query => {
            tracing::error!(error = %e, "❌ Correlation execution failed: {}", e);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Result, ServiceExposure};
    use crate::domain::provider::{CertificatePage, HostView};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    #[derive(Clone)]
    struct MockHost {
        view: Arc<Mutex<Option<Result<HostView>>>>,
    }

    impl MockHost {
        fn with_services(services: Vec<serde_json::Value>) -> Self {
            Self {
                view: Arc::new(Mutex::new(Some(Ok(HostView { services })))),
            }
        }

        fn failing(error: ProbeError) -> Self {
            Self {
                view: Arc::new(Mutex::new(Some(Err(error)))),
            }
        }
    }

    #[async_trait]
    impl HostIntel for MockHost {
        async fn view_host(&self, _ip: &str) -> Result<HostView> {
            self.view
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(HostView::default()))
        }
    }

    #[derive(Clone, Default)]
    struct MockIndex {
        calls: Arc<AtomicUsize>,
        queries: Arc<Mutex<Vec<String>>>,
        hits: Vec<serde_json::Value>,
    }

    impl MockIndex {
        fn with_hits(hits: Vec<serde_json::Value>) -> Self {
            Self {
                hits,
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CertificateIndex for MockIndex {
        async fn search_certificates(
            &self,
            query: &str,
            _per_page: usize,
            _cursor: Option<&str>,
        ) -> Result<CertificatePage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.to_string());
            Ok(CertificatePage {
                hits: self.hits.clone(),
                next_cursor: None,
            })
        }
    }

    fn correlator(host: MockHost, index: MockIndex) -> Correlator<MockHost, MockIndex> {
        let timeout = Duration::from_secs(5);
        Correlator::new(
            HostExposureClient::new(host, timeout),
            CertificateTrustClient::new(index, timeout, 100, 1),
        )
    }

    fn example_certificate() -> serde_json::Value {
        json!({
            "parsed": {
                "signature_algorithm": {"name": "SHA256WithRSA"},
                "subject": {"common_name": "example.com", "organization": ["Example Org"]},
                "validity": {"start": "2024-01-01", "end": "2025-01-01"}
            }
        })
    }

    #[tokio::test]
    async fn test_no_services_skips_certificate_search() {
        let index = MockIndex::with_hits(vec![example_certificate()]);
        let correlator = correlator(MockHost::with_services(vec![]), index.clone());

        let result = correlator.correlate("10.0.0.1", "example.com").await;

        assert!(result.services.is_empty());
        assert!(result.certificates.is_empty());
        assert_eq!(index.calls(), 0);
    }

    #[tokio::test]
    async fn test_port_443_triggers_search_once() {
        let index = MockIndex::with_hits(vec![example_certificate()]);
        let host = MockHost::with_services(vec![
            json!({"port": 443, "service_name": "HTTP", "transport_protocol": "TCP"}),
        ]);
        let correlator = correlator(host, index.clone());

        let result = correlator.correlate("10.0.0.1", "example.com").await;

        assert_eq!(result.services, vec![ServiceExposure::new(443, "http")]);
        assert_eq!(result.certificates.len(), 1);
        assert_eq!(index.calls(), 1);
        assert_eq!(
            index.queries.lock().unwrap().as_slice(),
            ["tags: trusted and names: example.com"]
        );
    }

    #[tokio::test]
    async fn test_https_on_other_port_triggers_search() {
        let index = MockIndex::with_hits(vec![]);
        let host = MockHost::with_services(vec![
            json!({"port": 8443, "service_name": "HTTPS", "transport_protocol": "TCP"}),
        ]);
        let correlator = correlator(host, index.clone());

        let result = correlator.correlate("10.0.0.1", "example.com").await;

        assert!(result.is_https_capable());
        assert_eq!(index.calls(), 1);
    }

    #[tokio::test]
    async fn test_plain_services_skip_search() {
        let index = MockIndex::with_hits(vec![example_certificate()]);
        let host = MockHost::with_services(vec![
            json!({"port": 22, "service_name": "SSH", "transport_protocol": "TCP"}),
            json!({"port": 80, "service_name": "HTTP", "transport_protocol": "TCP"}),
        ]);
        let correlator = correlator(host, index.clone());

        let result = correlator.correlate("10.0.0.1", "example.com").await;

        assert_eq!(result.services.len(), 2);
        assert!(result.certificates.is_empty());
        assert_eq!(index.calls(), 0);
    }

    #[tokio::test]
    async fn test_example_com_scenario() {
        let index = MockIndex::with_hits(vec![example_certificate()]);
        let host = MockHost::with_services(vec![
            json!({"port": 443, "service_name": "https", "transport_protocol": "tcp"}),
        ]);
        let correlator = correlator(host, index);

        let result = correlator.correlate("93.184.216.34", "example.com").await;

        assert_eq!(
            result,
            CorrelationResult {
                services: vec![ServiceExposure::new(443, "https")],
                certificates: vec![crate::core::CertificateRecord {
                    signature_algorithm: "SHA256WithRSA".to_string(),
                    common_names: vec!["example.com".to_string()],
                    validity_start: "2024-01-01".to_string(),
                    validity_end: "2025-01-01".to_string(),
                    organization_names: vec!["Example Org".to_string()],
                }],
            }
        );
    }

    #[tokio::test]
    async fn test_exposure_transport_failure() {
        let index = MockIndex::with_hits(vec![example_certificate()]);
        let host = MockHost::failing(ProbeError::Timeout {
            operation: "host view".to_string(),
            seconds: 30,
        });
        let correlator = correlator(host, index.clone());

        let result = correlator.correlate("10.0.0.1", "example.com").await;

        assert!(result.is_empty());
        assert_eq!(index.calls(), 0);
    }

    #[derive(Clone, Default)]
    struct LevelCounter {
        warnings: Arc<AtomicUsize>,
        errors: Arc<AtomicUsize>,
    }

    impl<S: tracing::Subscriber> Layer<S> for LevelCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            match *event.metadata().level() {
                tracing::Level::WARN => {
                    self.warnings.fetch_add(1, Ordering::SeqCst);
                }
                tracing::Level::ERROR => {
                    self.errors.fetch_add(1, Ordering::SeqCst);
                }
                _ => {}
            }
        }
    }

    #[tokio::test]
    async fn test_exposure_failure_logs_a_single_warning() {
        let counter = LevelCounter::default();
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::registry().with(counter.clone()),
        );

        let index = MockIndex::with_hits(vec![example_certificate()]);
        let host = MockHost::failing(ProbeError::ProviderError {
            operation: "host view".to_string(),
            status: 503,
            message: "Service Unavailable".to_string(),
        });
        let result = correlator(host, index.clone())
            .correlate("10.0.0.1", "example.com")
            .await;

        assert!(result.is_empty());
        assert_eq!(index.calls(), 0);
        assert_eq!(counter.warnings.load(Ordering::SeqCst), 1);
        assert_eq!(counter.errors.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_host_view_logs_a_single_warning() {
        let counter = LevelCounter::default();
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::registry().with(counter.clone()),
        );

        let result = correlator(MockHost::with_services(vec![]), MockIndex::default())
            .correlate("10.0.0.1", "example.com")
            .await;

        assert!(result.is_empty());
        assert_eq!(counter.warnings.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_service_returns_partial_without_search() {
        let index = MockIndex::with_hits(vec![example_certificate()]);
        let host = MockHost::with_services(vec![
            json!({"port": 80, "service_name": "HTTP", "transport_protocol": "TCP"}),
            json!({"port": "not-a-port"}),
            json!({"port": 443, "service_name": "HTTPS", "transport_protocol": "TCP"}),
        ]);
        let correlator = correlator(host, index.clone());

        let result = correlator.correlate("10.0.0.1", "example.com").await;

        assert_eq!(result.services, vec![ServiceExposure::new(80, "http")]);
        assert!(result.certificates.is_empty());
        assert_eq!(index.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_certificate_keeps_services_and_earlier_records() {
        let index = MockIndex::with_hits(vec![
            example_certificate(),
            json!({"parsed": "not-an-object"}),
        ]);
        let host = MockHost::with_services(vec![
            json!({"port": 443, "service_name": "HTTPS", "transport_protocol": "TCP"}),
        ]);
        let correlator = correlator(host, index);

        let result = correlator.correlate("10.0.0.1", "example.com").await;

        assert_eq!(result.services.len(), 1);
        assert_eq!(result.certificates.len(), 1);
    }

    #[tokio::test]
    async fn test_correlate_target_uses_ip_and_hostname() {
        let index = MockIndex::with_hits(vec![]);
        let host = MockHost::with_services(vec![
            json!({"port": 443, "service_name": "HTTPS", "transport_protocol": "TCP"}),
        ]);
        let correlator = correlator(host, index.clone());
        let target = Target::new("2001:db8::1".parse().unwrap(), "v6.example.com");

        correlator.correlate_target(&target).await;

        assert_eq!(
            index.queries.lock().unwrap().as_slice(),
            ["tags: trusted and names: v6.example.com"]
        );
    }
}
