use crate::core::{bounded, Collected, HostIntel, Result, ServiceExposure};
use crate::domain::provider::RawService;
use crate::utils::error::ProbeError;
use std::time::Duration;

/// Turns a host "view" into the list of services exposed on that address.
pub struct HostExposureClient<H: HostIntel> {
    intel: H,
    timeout: Duration,
}

impl<H: HostIntel> HostExposureClient<H> {
    pub fn new(intel: H, timeout: Duration) -> Self {
        Self { intel, timeout }
    }

    /// Services exposed on `ip`, in provider order. A failed lookup reads as "nothing exposed".
    pub async fn fetch_exposures(&self, ip: &str) -> Vec<ServiceExposure> {
        self.collect_exposures(ip).await.items
    }

    /// Like [`fetch_exposures`](Self::fetch_exposures), but keeps the failure that stopped the lookup.
    pub async fn collect_exposures(&self, ip: &str) -> Collected<ServiceExposure> {
        tracing::info!(ip, "🔎 Querying host view");

        let view = match bounded("host view", self.timeout, self.intel.view_host(ip)).await {
            Ok(view) => view,
            Err(e) => {
                tracing::warn!(ip, error = %e, "⚠️ Host view failed: {}", e);
                return Collected::partial(Vec::new(), e);
            }
        };

        let mut services = Vec::with_capacity(view.services.len());
        for (index, entry) in view.services.into_iter().enumerate() {
            match normalize_service(entry) {
                Ok(service) => {
                    tracing::info!(
                        ip,
                        port = service.port,
                        protocol = %service.protocol,
                        "🚪 Open port {}: {}/{}",
                        index + 1,
                        service.port,
                        service.protocol
                    );
                    services.push(service);
                }
                Err(e) => {
                    tracing::error!(ip, index, error = %e, "❌ Unreadable service entry");
                    return Collected::partial(services, e);
                }
            }
        }

        tracing::info!(ip, count = services.len(), "✅ Host view returned {} services", services.len());
        Collected::complete(services)
    }
}

/// Reads one raw service record into a [`ServiceExposure`].
///
/// The protocol is the lower-cased service name, or the lower-cased transport
/// protocol when the provider could not identify the service.
pub fn normalize_service(entry: serde_json::Value) -> Result<ServiceExposure> {
    let raw: RawService = serde_json::from_value(entry)
        .map_err(|e| ProbeError::malformed(format!("service entry: {}", e)))?;

    let port = raw
        .port
        .ok_or_else(|| ProbeError::malformed("service entry has no port"))?;
    let port = u16::try_from(port)
        .map_err(|_| ProbeError::malformed(format!("service port {} is out of range", port)))?;

    let service_name = raw.service_name.unwrap_or_default().to_lowercase();
    let transport = raw.transport_protocol.unwrap_or_default().to_lowercase();

    let protocol = if service_name == "unknown" {
        transport
    } else {
        service_name
    };

    Ok(ServiceExposure { port, protocol })
}
