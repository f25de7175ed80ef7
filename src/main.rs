use clap::Parser;
use exposure_correlator::core::report::{render_json, report_stamp};
use exposure_correlator::domain::ports::{CredentialProvider, ProviderSettings};
use exposure_correlator::utils::{logger, validation::Validate};
use exposure_correlator::{
    AppConfig, BatchRunner, BatchSummary, CensysClient, CertificateTrustClient, CliConfig,
    Correlator, HostExposureClient, LocalStorage, ProbeError, ReportWriter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting exposure-correlator");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    match run(&cli).await {
        Ok(summary) => {
            println!(
                "✅ {} targets, {} HTTPS-capable, {} services, {} trusted certificates ({} ms)",
                summary.targets,
                summary.https_capable,
                summary.services,
                summary.certificates,
                summary.elapsed_ms
            );
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

async fn run(cli: &CliConfig) -> Result<BatchSummary, ProbeError> {
    cli.validate()?;

    let mut config = AppConfig::from_file(&cli.config)?;
    apply_overrides(&mut config, cli);
    config.validate()?;

    let credentials = config.load()?;
    let targets = cli.collect_targets()?;
    if targets.is_empty() {
        tracing::warn!("Target list is empty, nothing to correlate");
    }

    let client = CensysClient::new(credentials, &config)?;
    let exposures = HostExposureClient::new(client.clone(), config.timeout());
    let certificates = CertificateTrustClient::new(
        client,
        config.timeout(),
        config.per_page(),
        config.max_pages(),
    );
    let runner = BatchRunner::new(
        Correlator::new(exposures, certificates),
        config.concurrency(),
    );

    tracing::info!(
        "🔍 Correlating {} targets (concurrency {})",
        targets.len(),
        config.concurrency()
    );
    let report = runner.run(targets).await;

    if cli.stdout {
        let json = render_json(&report.findings)?;
        println!("{}", String::from_utf8_lossy(&json));
    } else {
        let storage = LocalStorage::new(config.output_path().to_string());
        let writer = ReportWriter::new(storage, config.report_formats()?);
        for path in writer.write(&report.findings, &report_stamp()).await? {
            println!("📁 {}/{}", config.output_path(), path);
        }
    }

    Ok(report.summary)
}

fn apply_overrides(config: &mut AppConfig, cli: &CliConfig) {
    if let Some(concurrency) = cli.concurrency {
        config.scan.concurrency = Some(concurrency);
    }
    if let Some(output) = &cli.output {
        config.report.output_path = Some(output.clone());
    }
    if !cli.format.is_empty() {
        config.report.formats = Some(cli.format.clone());
    }
}
