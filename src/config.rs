//! Configuration management for ReplyBuddy
//!
//! TOML configuration with built-in defaults, validation and environment
//! overrides. Location: ~/.replybuddy/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{RagError, Result};
use crate::providers::{gemini, ollama};
use crate::rag::{RAGConfig, StepTimeouts, DEFAULT_TOP_K};
use crate::retry::RetryPolicy;
use crate::vector_db::{DEFAULT_COLLECTION, DEFAULT_QDRANT_URL};

/// Placeholder printed instead of secrets
pub const REDACTED: &str = "********";

/// Complete configuration for ReplyBuddy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub ollama: OllamaConfig,
    pub gemini: GeminiConfig,
    pub qdrant: QdrantConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// Which service backs a collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Ollama,
    Gemini,
    /// In-process candle model (embeddings only, feature `local-embeddings`)
    Local,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Backend::Ollama => "ollama",
            Backend::Gemini => "gemini",
            Backend::Local => "local",
        };
        f.write_str(name)
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: Backend,
    /// Model name; backend default when unset
    pub model: Option<String>,
    /// Vector length; must match the knowledge collection
    pub dimension: usize,
}

/// Generative model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub backend: Backend,
    /// Model name; backend default when unset
    pub model: Option<String>,
}

/// Ollama connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub port: u16,
}

/// Gemini API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

/// Qdrant connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantConfig {
    pub url: String,
    pub collection: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

/// Suggested-reply pipeline behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub top_k: usize,
    pub embed_timeout_secs: Option<u64>,
    pub search_timeout_secs: Option<u64>,
    pub generate_timeout_secs: Option<u64>,
    pub retry: RetryPolicy,
}

/// Log output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when no env filter is set
    pub level: String,
    pub json: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Ollama,
            model: None,
            dimension: 768,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Ollama,
            model: None,
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 11434,
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: gemini::DEFAULT_GEMINI_URL.to_string(),
            api_key: None,
        }
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_QDRANT_URL.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            embed_timeout_secs: Some(30),
            search_timeout_secs: Some(10),
            generate_timeout_secs: Some(120),
            retry: RetryPolicy::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "replybuddy=info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults, then apply env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(config_path) => Self::load_from_file(config_path)?,
            None => Self::load_default()?,
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagError::Config(format!("Failed to read config {}: {}", path.display(), e)))?;

        toml::from_str(&contents)
            .map_err(|e| RagError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from the standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(config_path) if config_path.exists() => Self::load_from_file(&config_path),
            _ => Ok(Config::default()),
        }
    }

    /// ~/.replybuddy/config.toml
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".replybuddy").join("config.toml"))
    }

    /// Overlay environment variables (looked up through `get`)
    pub fn apply_env_overrides<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = get("QDRANT_URL") {
            self.qdrant.url = url;
        } else if get("QDRANT_HOST").is_some() || get("QDRANT_PORT").is_some() {
            let host = get("QDRANT_HOST").unwrap_or_else(|| "localhost".to_string());
            let port = get("QDRANT_PORT").unwrap_or_else(|| "6334".to_string());
            self.qdrant.url = format!("http://{}:{}", host, port);
        }

        if let Some(collection) = get("QDRANT_COLLECTION") {
            self.qdrant.collection = collection;
        }
        if let Some(key) = get("QDRANT_API_KEY") {
            self.qdrant.api_key = Some(key);
        }
        if let Some(key) = get("GEMINI_API_KEY").filter(|k| !k.is_empty()) {
            self.gemini.api_key = Some(key);
        }
        if let Some(host) = get("OLLAMA_HOST") {
            let host = host
                .trim_start_matches("http://")
                .trim_start_matches("https://")
                .trim_end_matches('/')
                .to_string();
            let host_port = host
                .rsplit_once(':')
                .and_then(|(h, p)| p.parse::<u16>().ok().map(|port| (h.to_string(), port)));
            match host_port {
                Some((h, port)) => {
                    self.ollama.host = h;
                    self.ollama.port = port;
                }
                None => self.ollama.host = host,
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than 0".to_string()));
        }

        if self.embedding.dimension == 0 {
            return Err(RagError::Config(
                "embedding dimension must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.retry.max_attempts == 0 {
            return Err(RagError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.qdrant.collection.trim().is_empty() {
            return Err(RagError::Config("qdrant collection must not be empty".to_string()));
        }

        if self.generation.backend == Backend::Local {
            return Err(RagError::Config(
                "the local backend only supports embeddings".to_string(),
            ));
        }

        let uses_gemini =
            self.embedding.backend == Backend::Gemini || self.generation.backend == Backend::Gemini;
        if uses_gemini && self.gemini.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(RagError::Config(
                "gemini backend selected but no API key configured (set GEMINI_API_KEY)".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RagError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RagError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| RagError::Config(format!("Failed to write config: {}", e)))
    }

    /// Copy safe to print: API keys replaced by a mask
    pub fn redacted(&self) -> Self {
        let mask = |key: &Option<String>| key.as_ref().map(|_| REDACTED.to_string());

        let mut copy = self.clone();
        copy.gemini.api_key = mask(&self.gemini.api_key);
        copy.qdrant.api_key = mask(&self.qdrant.api_key);
        copy
    }

    /// Get Ollama base URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    /// Embedding model name, falling back to the backend default
    pub fn embedding_model(&self) -> &str {
        if let Some(model) = &self.embedding.model {
            return model;
        }
        match self.embedding.backend {
            Backend::Ollama => ollama::DEFAULT_EMBEDDING_MODEL,
            Backend::Gemini => gemini::DEFAULT_EMBEDDING_MODEL,
            Backend::Local => "nomic-ai/nomic-embed-text-v1.5",
        }
    }

    /// Generation model name, falling back to the backend default
    pub fn generation_model(&self) -> &str {
        if let Some(model) = &self.generation.model {
            return model;
        }
        match self.generation.backend {
            Backend::Gemini => gemini::DEFAULT_MODEL,
            Backend::Ollama | Backend::Local => ollama::DEFAULT_MODEL,
        }
    }

    /// Pipeline settings
    pub fn rag_config(&self) -> RAGConfig {
        let secs = |s: Option<u64>| s.map(Duration::from_secs);

        RAGConfig {
            collection: self.qdrant.collection.clone(),
            top_k: self.pipeline.top_k,
            timeouts: StepTimeouts {
                embed: secs(self.pipeline.embed_timeout_secs),
                search: secs(self.pipeline.search_timeout_secs),
                generate: secs(self.pipeline.generate_timeout_secs),
            },
            retry: self.pipeline.retry.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ollama.host, "127.0.0.1");
        assert_eq!(config.ollama.port, 11434);
        assert_eq!(config.pipeline.top_k, 3);
        assert_eq!(config.embedding.dimension, 768);
        assert_eq!(config.qdrant.collection, "product_knowledge");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_top_k() {
        let mut config = Config::default();
        config.pipeline.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_attempts() {
        let mut config = Config::default();
        config.pipeline.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_gemini_requires_key() {
        let mut config = Config::default();
        config.generation.backend = Backend::Gemini;
        assert!(config.validate().is_err());

        config.gemini.api_key = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_local_generation_rejected() {
        let mut config = Config::default();
        config.generation.backend = Backend::Local;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [generation]
            backend = "gemini"
            model = "gemini-1.5-pro"

            [pipeline]
            top_k = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.generation.backend, Backend::Gemini);
        assert_eq!(config.generation_model(), "gemini-1.5-pro");
        assert_eq!(config.pipeline.top_k, 5);
        assert_eq!(config.pipeline.generate_timeout_secs, Some(120));
        assert_eq!(config.embedding.backend, Backend::Ollama);
        assert_eq!(config.embedding_model(), "nomic-embed-text");
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let parsed: std::result::Result<Config, _> = toml::from_str(
            r#"
            [embedding]
            backend = "openai"
            "#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[
            ("QDRANT_HOST", "qdrant.internal"),
            ("QDRANT_PORT", "7334"),
            ("GEMINI_API_KEY", "abc"),
            ("OLLAMA_HOST", "10.0.0.5:11500"),
        ]));

        assert_eq!(config.qdrant.url, "http://qdrant.internal:7334");
        assert_eq!(config.gemini.api_key.as_deref(), Some("abc"));
        assert_eq!(config.ollama_url(), "http://10.0.0.5:11500");
    }

    #[test]
    fn test_qdrant_url_override_wins() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[
            ("QDRANT_URL", "https://cloud.qdrant.io:6334"),
            ("QDRANT_HOST", "ignored"),
        ]));
        assert_eq!(config.qdrant.url, "https://cloud.qdrant.io:6334");
    }

    #[test]
    fn test_rag_config_conversion() {
        let mut config = Config::default();
        config.pipeline.search_timeout_secs = None;
        let rag = config.rag_config();

        assert_eq!(rag.top_k, 3);
        assert_eq!(rag.timeouts.embed, Some(Duration::from_secs(30)));
        assert_eq!(rag.timeouts.search, None);
        assert_eq!(rag.collection, "product_knowledge");
    }

    #[test]
    fn test_redacted_masks_api_keys() {
        let mut config = Config::default();
        config.gemini.api_key = Some("gemini-secret".to_string());
        config.qdrant.api_key = Some("qdrant-secret".to_string());

        let rendered = toml::to_string_pretty(&config.redacted()).unwrap();
        assert!(!rendered.contains("gemini-secret"));
        assert!(!rendered.contains("qdrant-secret"));
        assert!(rendered.contains(REDACTED));

        // the original is untouched
        assert_eq!(config.gemini.api_key.as_deref(), Some("gemini-secret"));
    }

    #[test]
    fn test_redacted_leaves_unset_keys_unset() {
        let redacted = Config::default().redacted();
        assert!(redacted.gemini.api_key.is_none());
        assert!(redacted.qdrant.api_key.is_none());
        assert_eq!(redacted, Config::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.pipeline.top_k = 4;
        config.save(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let err = Config::load_from_file(Path::new("/nonexistent/replybuddy.toml")).unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }
}
