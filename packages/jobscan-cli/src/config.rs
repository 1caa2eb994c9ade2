use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use jobscan::{DetectorConfig, PipelineConfig, SelectorRegistry};

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub min_field_confidence: Option<f64>,
    pub enrichment_threshold: Option<f64>,
    pub registry_path: Option<PathBuf>,
    pub max_fields: Option<usize>,
    pub heuristic_repair: Option<bool>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            min_field_confidence: parse_var("JOBSCAN_MIN_FIELD_CONFIDENCE")?,
            enrichment_threshold: parse_var("JOBSCAN_ENRICHMENT_THRESHOLD")?,
            registry_path: env::var("JOBSCAN_REGISTRY_PATH").ok().map(PathBuf::from),
            max_fields: parse_var("JOBSCAN_MAX_FIELDS")?,
            heuristic_repair: parse_var("JOBSCAN_HEURISTIC_REPAIR")?,
        })
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new();
        if let Some(confidence) = self.min_field_confidence {
            config = config.with_min_field_confidence(confidence);
        }
        if let Some(threshold) = self.enrichment_threshold {
            config = config.with_enrichment_threshold(threshold);
        }
        if let Some(repair) = self.heuristic_repair {
            config = config.with_heuristic_repair(repair);
        }
        config
    }

    pub fn detector_config(&self) -> DetectorConfig {
        match self.max_fields {
            Some(max) => DetectorConfig::new().with_max_fields(max),
            None => DetectorConfig::new(),
        }
    }

    /// The registry at `JOBSCAN_REGISTRY_PATH`, else the builtin table.
    pub fn load_registry(&self) -> Result<SelectorRegistry> {
        let Some(path) = &self.registry_path else {
            return Ok(SelectorRegistry::builtin());
        };
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read registry {}", path.display()))?;
        SelectorRegistry::from_json(&json).with_context(|| format!("invalid registry {}", path.display()))
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} has an invalid value")),
        Err(_) => Ok(None),
    }
}
