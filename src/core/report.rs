use crate::core::{Finding, Result, Storage};
use crate::utils::error::ProbeError;
use std::str::FromStr;

const LIST_SEPARATOR: &str = "; ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl FromStr for ReportFormat {
    type Err = ProbeError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            other => Err(ProbeError::InvalidConfigValueError {
                field: "report.formats".to_string(),
                value: other.to_string(),
                reason: "Unsupported format. Valid formats: csv, json".to_string(),
            }),
        }
    }
}

/// `ip,hostname,port,protocol`, one row per exposed service.
pub fn render_services_csv(findings: &[Finding]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["ip", "hostname", "port", "protocol"])?;

    for finding in findings {
        let ip = finding.target.ip.to_string();
        for service in &finding.result.services {
            let port = service.port.to_string();
            writer.write_record([
                ip.as_str(),
                finding.target.hostname.as_str(),
                port.as_str(),
                service.protocol.as_str(),
            ])?;
        }
    }

    writer
        .into_inner()
        .map_err(|e| ProbeError::IoError(e.into_error()))
}

/// One row per certificate; name lists are joined with `; `.
pub fn render_certificates_csv(findings: &[Finding]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "ip",
        "hostname",
        "signature_algorithm",
        "common_names",
        "validity_start",
        "validity_end",
        "organization_names",
    ])?;

    for finding in findings {
        let ip = finding.target.ip.to_string();
        for certificate in &finding.result.certificates {
            let common_names = certificate.common_names.join(LIST_SEPARATOR);
            let organizations = certificate.organization_names.join(LIST_SEPARATOR);
            writer.write_record([
                ip.as_str(),
                finding.target.hostname.as_str(),
                certificate.signature_algorithm.as_str(),
                common_names.as_str(),
                certificate.validity_start.as_str(),
                certificate.validity_end.as_str(),
                organizations.as_str(),
            ])?;
        }
    }

    writer
        .into_inner()
        .map_err(|e| ProbeError::IoError(e.into_error()))
}

pub fn render_json(findings: &[Finding]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(findings)?)
}

/// Persists batch findings through a [`Storage`] backend.
pub struct ReportWriter<S: Storage> {
    storage: S,
    formats: Vec<ReportFormat>,
}

impl<S: Storage> ReportWriter<S> {
    pub fn new(storage: S, formats: Vec<ReportFormat>) -> Self {
        Self { storage, formats }
    }

    /// Writes every configured format and returns the relative paths written.
    pub async fn write(&self, findings: &[Finding], stamp: &str) -> Result<Vec<String>> {
        let mut written = Vec::new();

        for format in &self.formats {
            match format {
                ReportFormat::Csv => {
                    let services = format!("services_{}.csv", stamp);
                    self.storage
                        .write_file(&services, &render_services_csv(findings)?)
                        .await?;
                    written.push(services);

                    let certificates = format!("certificates_{}.csv", stamp);
                    self.storage
                        .write_file(&certificates, &render_certificates_csv(findings)?)
                        .await?;
                    written.push(certificates);
                }
                ReportFormat::Json => {
                    let path = format!("findings_{}.json", stamp);
                    self.storage.write_file(&path, &render_json(findings)?).await?;
                    written.push(path);
                }
            }
        }

        tracing::info!("📁 Wrote {} report files", written.len());
        Ok(written)
    }
}

/// Filename stamp for one run, e.g. `20240101_120000`.
pub fn report_stamp() -> String {
    chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string()
}
