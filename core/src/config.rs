use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::env;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MappingConfig {
    /// Segment count of the unique key that identifies a hierarchical root
    /// (`Root:Web` is two levels from root).
    pub levels_from_root: usize,
    /// Key of a root child used when no ancestor qualifies.
    pub fallback_root_key: String,
    /// Upper bound on the recursion depth a caller may request.
    pub max_depth: usize,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            levels_from_root: 2,
            fallback_root_key: "Web".to_string(),
            max_depth: 16,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// When false the caching mapper forwards every call to the inner mapper.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct RepositoryConfig {
    /// JSON topic document loaded at startup.
    pub source_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub mapping: MappingConfig,
    pub cache: CacheConfig,
    pub repository: RepositoryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Layers `<dir>/default`, `<dir>/<RUN_MODE>` and `TOPICGRAPH__*`
    /// environment variables. Missing files are skipped.
    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join(&run_mode)).required(false))
            .add_source(Environment::with_prefix("TOPICGRAPH").separator("__"));

        builder.build()?.try_deserialize()
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.mapping.levels_from_root, 2);
        assert_eq!(config.mapping.fallback_root_key, "Web");
        assert!(config.cache.enabled);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [mapping]
            max_depth = 4

            [cache]
            enabled = false

            [repository]
            source_path = "topics.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.mapping.max_depth, 4);
        assert_eq!(config.mapping.levels_from_root, 2);
        assert!(!config.cache.enabled);
        assert_eq!(config.repository.source_path.as_deref(), Some("topics.json"));
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn load_from_reads_default_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "[logging]\njson = true\n\n[mapping]\nfallback_root_key = \"Intranet\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(dir.path()).unwrap();
        assert!(config.logging.json);
        assert_eq!(config.mapping.fallback_root_key, "Intranet");
        assert_eq!(config.mapping.max_depth, 16);
    }
}
