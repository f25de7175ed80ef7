use crate::core::correlator::Correlator;
use crate::core::{CertificateIndex, CorrelationResult, Finding, HostIntel, Target};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Totals over one batch of correlations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub targets: usize,
    pub https_capable: usize,
    pub services: usize,
    pub certificates: usize,
    pub elapsed_ms: u128,
}

impl BatchSummary {
    pub fn from_findings(findings: &[Finding], elapsed: Duration) -> Self {
        Self {
            targets: findings.len(),
            https_capable: findings
                .iter()
                .filter(|f| f.result.is_https_capable())
                .count(),
            services: findings.iter().map(|f| f.result.services.len()).sum(),
            certificates: findings.iter().map(|f| f.result.certificates.len()).sum(),
            elapsed_ms: elapsed.as_millis(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub findings: Vec<Finding>,
    pub summary: BatchSummary,
}

/// Runs independent correlations side by side, never more than `concurrency` at once.
pub struct BatchRunner<H: HostIntel, C: CertificateIndex> {
    correlator: Arc<Correlator<H, C>>,
    concurrency: usize,
}

impl<H, C> BatchRunner<H, C>
where
    H: HostIntel + 'static,
    C: CertificateIndex + 'static,
{
    pub fn new(correlator: Correlator<H, C>, concurrency: usize) -> Self {
        Self {
            correlator: Arc::new(correlator),
            concurrency: concurrency.max(1),
        }
    }

    /// Findings come back in the order the targets were given.
    pub async fn run(&self, targets: Vec<Target>) -> BatchReport {
        let started = Instant::now();
        tracing::info!(
            targets = targets.len(),
            concurrency = self.concurrency,
            "📡 Starting batch of {} targets",
            targets.len()
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, target) in targets.iter().cloned().enumerate() {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let correlator = Arc::clone(&self.correlator);
            tasks.spawn(async move {
                let result = correlator.correlate_target(&target).await;
                drop(permit);
                (index, result)
            });
        }

        let mut slots: Vec<Option<CorrelationResult>> = vec![None; targets.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::error!(error = %e, "❌ Correlation task failed: {}", e),
            }
        }

        let findings: Vec<Finding> = targets
            .into_iter()
            .zip(slots)
            .map(|(target, slot)| {
                let result = slot.unwrap_or_else(|| {
                    tracing::error!(
                        ip = %target.ip,
                        hostname = %target.hostname,
                        "❌ Correlation execution failed, reporting no findings"
                    );
                    CorrelationResult::default()
                });
                Finding { target, result }
            })
            .collect();

        let summary = BatchSummary::from_findings(&findings, started.elapsed());
        tracing::info!(
            targets = summary.targets,
            https_capable = summary.https_capable,
            services = summary.services,
            certificates = summary.certificates,
            "📊 Batch finished in {}ms",
            summary.elapsed_ms
        );

        BatchReport { findings, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::certificate::CertificateTrustClient;
    use crate::core::exposure::HostExposureClient;
    use crate::core::{Result, ServiceExposure};
    use crate::domain::provider::{CertificatePage, HostView};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reports 443 for addresses ending in `.1`, nothing elsewhere, and tracks peak parallelism.
    #[derive(Clone, Default)]
    struct TrackingHost {
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
        panic_on: Option<String>,
    }

    #[async_trait]
    impl HostIntel for TrackingHost {
        async fn view_host(&self, ip: &str) -> Result<HostView> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.panic_on.as_deref() == Some(ip) {
                panic!("simulated fault");
            }

            let services = if ip.ends_with(".1") {
                vec![json!({"port": 443, "service_name": "HTTPS", "transport_protocol": "TCP"})]
            } else {
                vec![]
            };
            Ok(HostView { services })
        }
    }

    #[derive(Clone)]
    struct OneCertificate;

    #[async_trait]
    impl CertificateIndex for OneCertificate {
        async fn search_certificates(
            &self,
            _query: &str,
            _per_page: usize,
            _cursor: Option<&str>,
        ) -> Result<CertificatePage> {
            Ok(CertificatePage {
                hits: vec![json!({"parsed": {"subject": {"common_name": "example.com"}}})],
                next_cursor: None,
            })
        }
    }

    fn runner(host: TrackingHost, concurrency: usize) -> BatchRunner<TrackingHost, OneCertificate> {
        let timeout = Duration::from_secs(5);
        let correlator = Correlator::new(
            HostExposureClient::new(host, timeout),
            CertificateTrustClient::new(OneCertificate, timeout, 100, 1),
        );
        BatchRunner::new(correlator, concurrency)
    }

    fn targets(count: usize) -> Vec<Target> {
        (0..count)
            .map(|i| {
                Target::new(
                    format!("10.0.0.{}", i + 1).parse().unwrap(),
                    format!("host{}.example.com", i + 1),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_findings_follow_input_order() {
        let report = runner(TrackingHost::default(), 3).run(targets(5)).await;

        let hostnames: Vec<&str> = report
            .findings
            .iter()
            .map(|f| f.target.hostname.as_str())
            .collect();
        assert_eq!(
            hostnames,
            vec![
                "host1.example.com",
                "host2.example.com",
                "host3.example.com",
                "host4.example.com",
                "host5.example.com"
            ]
        );
        assert_eq!(report.findings[0].result.services, vec![ServiceExposure::new(443, "https")]);
        assert_eq!(report.findings[0].result.certificates.len(), 1);
        assert!(report.findings[1].result.is_empty());
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let host = TrackingHost::default();
        let report = runner(host.clone(), 2).run(targets(8)).await;

        assert_eq!(report.findings.len(), 8);
        assert!(host.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_summary_totals() {
        let report = runner(TrackingHost::default(), 4).run(targets(3)).await;

        assert_eq!(report.summary.targets, 3);
        assert_eq!(report.summary.https_capable, 1);
        assert_eq!(report.summary.services, 1);
        assert_eq!(report.summary.certificates, 1);
    }

    #[tokio::test]
    async fn test_panicking_target_gets_empty_result() {
        let host = TrackingHost {
            panic_on: Some("10.0.0.1".to_string()),
            ..TrackingHost::default()
        };
        let report = runner(host, 2).run(targets(3)).await;

        assert_eq!(report.findings.len(), 3);
        assert!(report.findings[0].result.is_empty());
        assert_eq!(report.findings[0].target.hostname, "host1.example.com");
        assert_eq!(report.findings[2].target.hostname, "host3.example.com");
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let report = runner(TrackingHost::default(), 4).run(vec![]).await;

        assert!(report.findings.is_empty());
        assert_eq!(report.summary.targets, 0);
    }

    #[test]
    fn test_summary_from_findings() {
        let findings = vec![Finding {
            target: Target::new("10.0.0.1".parse().unwrap(), "a.example.com"),
            result: CorrelationResult {
                services: vec![ServiceExposure::new(80, "http"), ServiceExposure::new(8443, "https")],
                certificates: vec![],
            },
        }];

        let summary = BatchSummary::from_findings(&findings, Duration::from_millis(150));

        assert_eq!(summary.https_capable, 1);
        assert_eq!(summary.services, 2);
        assert_eq!(summary.elapsed_ms, 150);
    }
}
