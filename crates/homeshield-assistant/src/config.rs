//! Configuration for the assistant pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Document chunking settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size (characters)
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err("chunk_overlap must be smaller than chunk_size".to_string());
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 900,
            chunk_overlap: 120,
        }
    }
}

/// Filtered MMR retrieval settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks returned per query
    pub k: usize,

    /// Candidate pool size before MMR re-ranking
    pub fetch_k: usize,

    /// Relevance/diversity trade-off (1.0 = pure relevance)
    pub lambda_mult: f32,

    /// Restrict claim retrieval to the customer's own policy file when known
    pub scope_to_policy_file: bool,
}

impl RetrievalConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.k == 0 {
            return Err("k must be greater than 0".to_string());
        }
        if self.fetch_k < self.k {
            return Err("fetch_k cannot be smaller than k".to_string());
        }
        if !(0.0..=1.0).contains(&self.lambda_mult) {
            return Err("lambda_mult must be within [0, 1]".to_string());
        }
        Ok(())
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: 8,
            fetch_k: 24,
            lambda_mult: 0.5,
            scope_to_policy_file: false,
        }
    }
}

/// Bulk ingestion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Chunks embedded and upserted per request
    pub batch_size: usize,

    /// First back-off delay after a rate-limited batch (milliseconds)
    pub base_delay_ms: u64,

    /// Upper bound for a single back-off delay (milliseconds)
    pub max_delay_ms: u64,

    /// Attempts per batch before giving up
    pub max_retries: u32,

    /// First filename token of a routable policy document
    pub filename_prefix: String,
}

impl IngestionConfig {
    /// Delay before retry number `attempt` (1-based)
    ///
    /// Starts at `base_delay_ms` and grows by 1.8x per attempt, capped at
    /// `max_delay_ms`.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(64) as i32;
        let millis = (self.base_delay_ms as f64) * 1.8f64.powi(exponent);
        Duration::from_millis(millis.min(self.max_delay_ms as f64) as u64)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }
        if self.max_retries == 0 {
            return Err("max_retries must be greater than 0".to_string());
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err("base_delay_ms cannot exceed max_delay_ms".to_string());
        }
        if self.filename_prefix.trim().is_empty() {
            return Err("filename_prefix must not be empty".to_string());
        }
        Ok(())
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            batch_size: 64,
            base_delay_ms: 3_000,
            max_delay_ms: 30_000,
            max_retries: 6,
            filename_prefix: "LHG".to_string(),
        }
    }
}

/// Deterministic business rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Days after the effective date during which claims are denied
    pub waiting_period_days: i64,
}

impl RulesConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.waiting_period_days < 0 {
            return Err("waiting_period_days cannot be negative".to_string());
        }
        Ok(())
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self { waiting_period_days: 30 }
    }
}

/// Configuration for the whole assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Chunking settings
    pub chunking: ChunkingConfig,

    /// Retrieval settings
    pub retrieval: RetrievalConfig,

    /// Ingestion settings
    pub ingestion: IngestionConfig,

    /// Rule overlay settings
    pub rules: RulesConfig,

    /// Sampling temperature for every generation call
    pub temperature: f32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            ingestion: IngestionConfig::default(),
            rules: RulesConfig::default(),
            temperature: 0.0,
        }
    }
}

impl AssistantConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), String> {
        self.chunking.validate()?;
        self.retrieval.validate()?;
        self.ingestion.validate()?;
        self.rules.validate()?;
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("temperature must be within [0, 2]".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
