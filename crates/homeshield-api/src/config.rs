//! Configuration file parsing for the API server.
//!
//! Loads server, provider, retrieval and data settings from a TOML file.
//! Secrets and endpoints can be overridden from environment variables.

use homeshield_assistant::{AssistantConfig, ChunkingConfig, IngestionConfig, RetrievalConfig, RulesConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// API configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Settings are present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8000)
    pub bind_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8000,
        }
    }
}

/// Azure OpenAI resource; used when endpoint and key are both set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    /// Resource endpoint
    pub endpoint: String,
    /// API key
    pub api_key: String,
    /// API version
    pub api_version: String,
    /// Chat deployment name
    pub chat_deployment: String,
    /// Embedding deployment name
    pub embedding_deployment: String,
}

impl AzureConfig {
    /// True when enough is set to talk to Azure
    pub fn is_configured(&self) -> bool {
        !self.endpoint.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            api_version: homeshield_llm::azure::DEFAULT_API_VERSION.to_string(),
            chat_deployment: "gpt-4o-mini".to_string(),
            embedding_deployment: "text-embedding-3-small".to_string(),
        }
    }
}

/// Local Ollama server; used when Azure is not configured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// API endpoint
    pub endpoint: String,
    /// Generation model
    pub chat_model: String,
    /// Embedding model
    pub embedding_model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: homeshield_llm::ollama::DEFAULT_ENDPOINT.to_string(),
            chat_model: "llama3.1".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
        }
    }
}

/// Pinecone index; an in-process index is used when unset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PineconeConfig {
    /// API key
    pub api_key: String,
    /// Index host (e.g., "homeshield-abc123.svc.pinecone.io")
    pub index_host: String,
    /// Namespace holding the policy chunks
    pub namespace: String,
}

impl PineconeConfig {
    /// True when enough is set to talk to Pinecone
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.index_host.trim().is_empty()
    }
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            index_host: String::new(),
            namespace: "homeshield".to_string(),
        }
    }
}

/// Locations of the policy documents and customer table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory of `<Prefix>_<Plan>_<STATE>_<YEAR>.txt` policy documents
    pub policy_dir: PathBuf,
    /// Customer CSV
    pub customers_csv: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            policy_dir: PathBuf::from("policies_docs"),
            customers_csv: PathBuf::from("data/customers.csv"),
        }
    }
}

/// API configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Sampling temperature for every generation call
    pub temperature: f32,
    /// HTTP listener
    pub server: ServerConfig,
    /// Azure OpenAI
    pub azure: AzureConfig,
    /// Ollama
    pub ollama: OllamaConfig,
    /// Pinecone
    pub pinecone: PineconeConfig,
    /// Retrieval
    pub retrieval: RetrievalConfig,
    /// Chunking
    pub chunking: ChunkingConfig,
    /// Ingestion
    pub ingestion: IngestionConfig,
    /// Rule overlay
    pub rules: RulesConfig,
    /// Data locations
    pub data: DataConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Override settings from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_overrides(|key| std::env::var(key).ok());
    }

    /// Override settings from `lookup`; blank values are ignored
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("AZURE_OPENAI_ENDPOINT") {
            self.azure.endpoint = v;
        }
        if let Some(v) = get("AZURE_OPENAI_API_KEY") {
            self.azure.api_key = v;
        }
        if let Some(v) = get("AZURE_OPENAI_API_VERSION") {
            self.azure.api_version = v;
        }
        if let Some(v) = get("AZURE_OPENAI_CHAT_DEPLOYMENT") {
            self.azure.chat_deployment = v;
        }
        if let Some(v) = get("AZURE_OPENAI_EMBEDDING_DEPLOYMENT") {
            self.azure.embedding_deployment = v;
        }
        if let Some(v) = get("PINECONE_API_KEY") {
            self.pinecone.api_key = v;
        }
        if let Some(v) = get("PINECONE_INDEX_HOST") {
            self.pinecone.index_host = v;
        }
        if let Some(v) = get("PINECONE_NAMESPACE") {
            self.pinecone.namespace = v;
        }
        if let Some(v) = get("POLICY_DIR") {
            self.data.policy_dir = PathBuf::from(v);
        }
        if let Some(v) = get("CUSTOMERS_CSV") {
            self.data.customers_csv = PathBuf::from(v);
        }
    }

    /// Check the configuration before anything is built from it
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.assistant_config().validate().map_err(ConfigError::Invalid)?;

        if self.azure.is_configured() {
            if self.azure.chat_deployment.trim().is_empty() {
                return Err(ConfigError::Invalid("azure.chat_deployment is empty".to_string()));
            }
            if self.azure.embedding_deployment.trim().is_empty() {
                return Err(ConfigError::Invalid("azure.embedding_deployment is empty".to_string()));
            }
        }
        if self.pinecone.api_key.trim().is_empty() != self.pinecone.index_host.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "pinecone.api_key and pinecone.index_host must be set together".to_string(),
            ));
        }
        if self.pinecone.namespace.trim().is_empty() {
            return Err(ConfigError::Invalid("pinecone.namespace is empty".to_string()));
        }
        Ok(())
    }

    /// Settings handed to the assistant
    pub fn assistant_config(&self) -> AssistantConfig {
        AssistantConfig {
            chunking: self.chunking.clone(),
            retrieval: self.retrieval.clone(),
            ingestion: self.ingestion.clone(),
            rules: self.rules.clone(),
            temperature: self.temperature,
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.bind_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8000");
        assert!(!config.azure.is_configured());
        assert!(!config.pinecone.is_configured());
        assert_eq!(config.pinecone.namespace, "homeshield");
        assert_eq!(config.rules.waiting_period_days, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            temperature = 0.2

            [server]
            bind_address = "0.0.0.0"
            bind_port = 9000

            [azure]
            endpoint = "https://example.openai.azure.com"
            api_key = "key"

            [retrieval]
            k = 6
            fetch_k = 20

            [data]
            policy_dir = "/srv/policies"
        "#;

        let config = AppConfig::from_toml(toml).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert!(config.azure.is_configured());
        assert_eq!(config.azure.api_version, homeshield_llm::azure::DEFAULT_API_VERSION);
        assert_eq!(config.retrieval.k, 6);
        assert_eq!(config.retrieval.lambda_mult, 0.5);
        assert_eq!(config.data.policy_dir, PathBuf::from("/srv/policies"));
        assert_eq!(config.data.customers_csv, PathBuf::from("data/customers.csv"));
        assert_eq!(config.assistant_config().temperature, 0.2);
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            AppConfig::from_toml("[server]\nbind_port = \"eighty\""),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            AppConfig::from_file("/nonexistent/homeshield.toml"),
            Err(ConfigError::FileRead(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("AZURE_OPENAI_ENDPOINT", "https://env.openai.azure.com"),
            ("AZURE_OPENAI_API_KEY", "env-key"),
            ("PINECONE_API_KEY", "pc-key"),
            ("PINECONE_INDEX_HOST", "idx.svc.pinecone.io"),
            ("PINECONE_NAMESPACE", "   "),
            ("POLICY_DIR", "/env/policies"),
        ]);

        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.azure.endpoint, "https://env.openai.azure.com");
        assert!(config.azure.is_configured());
        assert!(config.pinecone.is_configured());
        assert_eq!(config.pinecone.namespace, "homeshield");
        assert_eq!(config.data.policy_dir, PathBuf::from("/env/policies"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_half_configured_pinecone_is_invalid() {
        let mut config = AppConfig::default();
        config.pinecone.api_key = "pc-key".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_retrieval_is_rejected() {
        let mut config = AppConfig::default();
        config.retrieval.fetch_k = 1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
