use crate::adapters::http::DEFAULT_BASE_URL;
use crate::core::report::ReportFormat;
use crate::domain::model::Credentials;
use crate::domain::ports::{CredentialProvider, ProviderSettings};
use crate::utils::error::{ProbeError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_PER_PAGE: usize = 100;
pub const DEFAULT_MAX_PAGES: usize = 1;
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_OUTPUT_PATH: &str = "./report";
pub const MAX_PAGES_LIMIT: usize = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub censys: Option<CensysConfig>,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CensysConfig {
    pub api_id: Option<String>,
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub per_page: Option<usize>,
    pub max_pages: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    pub output_path: Option<String>,
    pub formats: Option<Vec<String>>,
}

impl AppConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::config(format!("cannot read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses TOML content after expanding `${VAR}` references.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Unset variables are left as-is so validation can name the field that needs them.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ProbeError::config(e.to_string()))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("provider.base_url", self.base_url())?;
        validation::validate_range(
            "provider.timeout_seconds",
            self.timeout_seconds(),
            1,
            600,
        )?;
        validation::validate_range("provider.per_page", self.per_page(), 1, 100)?;
        validation::validate_range("provider.max_pages", self.max_pages(), 1, MAX_PAGES_LIMIT)?;
        validation::validate_range("scan.concurrency", self.concurrency(), 1, 64)?;
        validation::validate_path("report.output_path", self.output_path())?;
        if let Some(formats) = &self.report.formats {
            let formats: Vec<String> = formats.iter().map(|f| f.trim().to_lowercase()).collect();
            validation::validate_one_of("report.formats", &formats, &["csv", "json"])?;
        }

        Ok(())
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.provider
            .timeout_seconds
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    pub fn output_path(&self) -> &str {
        self.report
            .output_path
            .as_deref()
            .unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    pub fn report_formats(&self) -> Result<Vec<ReportFormat>> {
        match &self.report.formats {
            Some(formats) => formats.iter().map(|f| f.parse::<ReportFormat>()).collect(),
            None => Ok(vec![ReportFormat::Csv]),
        }
    }
}

impl ProviderSettings for AppConfig {
    fn base_url(&self) -> &str {
        self.provider.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds())
    }

    fn per_page(&self) -> usize {
        self.provider.per_page.unwrap_or(DEFAULT_PER_PAGE)
    }

    fn max_pages(&self) -> usize {
        self.provider.max_pages.unwrap_or(DEFAULT_MAX_PAGES)
    }

    fn concurrency(&self) -> usize {
        self.scan.concurrency.unwrap_or(DEFAULT_CONCURRENCY)
    }
}

impl CredentialProvider for AppConfig {
    fn load(&self) -> Result<Credentials> {
        let section = validation::validate_required_field("censys", &self.censys)?;
        let api_id = validation::validate_required_field("censys.api_id", &section.api_id)?;
        let secret = validation::validate_required_field("censys.secret", &section.secret)?;

        for (field, value) in [("censys.api_id", api_id), ("censys.secret", secret)] {
            validation::validate_non_empty_string(field, value)?;
            validation::validate_expanded(field, value)?;
        }

        Ok(Credentials::new(api_id.trim(), secret.trim()))
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
