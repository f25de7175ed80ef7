use crate::config::targets::{load_targets, parse_target};
use crate::domain::model::Target;
use crate::utils::error::{ProbeError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "exposure-correlator")]
#[command(about = "Look up exposed services and trusted certificates for target hosts")]
pub struct CliConfig {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// File with one `<ip> <hostname>` target per line
    #[arg(short, long)]
    pub targets: Option<String>,

    /// A single target as `ip,hostname` (repeatable)
    #[arg(long = "target", value_name = "IP,HOSTNAME")]
    pub target: Vec<String>,

    /// Override scan.concurrency from the config file
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Override report.output_path from the config file
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override report.formats, e.g. `csv,json`
    #[arg(long, value_delimiter = ',')]
    pub format: Vec<String>,

    /// Print findings as JSON on stdout instead of writing report files
    #[arg(long)]
    pub stdout: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliConfig {
    /// Targets from `--targets` followed by those given with `--target`.
    pub fn collect_targets(&self) -> Result<Vec<Target>> {
        let mut targets = match &self.targets {
            Some(path) => load_targets(path)?,
            None => Vec::new(),
        };

        for entry in &self.target {
            targets.push(parse_target(entry)?);
        }

        Ok(targets)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("config", &self.config)?;

        if self.targets.is_none() && self.target.is_empty() {
            return Err(ProbeError::ValidationError {
                message: "no targets given; use --targets <file> or --target <ip,hostname>"
                    .to_string(),
            });
        }

        if let Some(concurrency) = self.concurrency {
            validation::validate_range("concurrency", concurrency, 1, 64)?;
        }

        if let Some(output) = &self.output {
            validation::validate_path("output", output)?;
        }

        Ok(())
    }
}
