//! # lode-config
//!
//! Layered configuration loading for Lode using figment.
//!
//! Configuration sources (in priority order):
//! 1. Environment variables (`LODE_*`, nested with `__`)
//! 2. Project-level `lode.toml`
//! 3. User-level `~/.config/lode/config.toml`
//! 4. Built-in defaults
//!
//! The loaded [`LodeConfig`] is an immutable value passed through every call
//! that needs it. There is no process-wide mutable configuration state, so
//! concurrent indexing of repositories with different models is safe.

mod embeddings;
mod error;
mod indexer;
mod llm;
mod search;
mod storage;
mod validity;

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

pub use embeddings::{EmbeddingProvider, EmbeddingsConfig};
pub use error::ConfigError;
pub use indexer::IndexerConfig;
pub use llm::{LlmConfig, LlmProvider, LlmSlotConfig};
pub use search::SearchConfig;
pub use storage::StorageConfig;
pub use validity::ValidityConfig;

/// Complete Lode configuration, all sections defaulted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LodeConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub indexer: IndexerConfig,
    #[serde(default)]
    pub validity: ValidityConfig,
}

impl LodeConfig {
    /// Load configuration with the full layering (defaults → user file →
    /// project file → environment).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if a source fails to parse or merge.
    pub fn load() -> Result<Self, ConfigError> {
        // .env is optional; ignore absence
        let _ = dotenvy::dotenv();

        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs::config_dir() {
            figment = figment.merge(Toml::file(config_dir.join("lode").join("config.toml")));
        }

        figment = figment
            .merge(Toml::file("lode.toml"))
            .merge(Env::prefixed("LODE_").split("__"));

        Ok(figment.extract()?)
    }

    /// Load configuration from a single TOML file plus environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if the file fails to parse.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("LODE_").split("__"));
        Ok(figment.extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_load_without_sources() {
        figment::Jail::expect_with(|_| {
            let config = LodeConfig::load().unwrap();
            assert_eq!(config.search.vector_top_k, 60);
            assert_eq!(config.search.final_top_k, 12);
            assert_eq!(config.embeddings.batch_size, 32);
            assert_eq!(config.indexer.max_file_size_mb, 100);
            Ok(())
        });
    }

    #[test]
    fn toml_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "lode.toml",
                r#"
                [search]
                final_top_k = 5

                [embeddings]
                model = "nomic-embed-text"
                "#,
            )?;
            let config = LodeConfig::load().unwrap();
            assert_eq!(config.search.final_top_k, 5);
            assert_eq!(config.embeddings.model, "nomic-embed-text");
            // untouched sections keep defaults
            assert_eq!(config.search.vector_top_k, 60);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_toml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("lode.toml", "[search]\nfinal_top_k = 5\n")?;
            jail.set_env("LODE_SEARCH__FINAL_TOP_K", "3");
            let config = LodeConfig::load().unwrap();
            assert_eq!(config.search.final_top_k, 3);
            Ok(())
        });
    }
}
