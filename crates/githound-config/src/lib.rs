//! Engine-wide configuration for githound
//!
//! `EngineConfig` is the single recognised options surface: which searcher
//! groups are enabled, the cache backend and its limits, and the relevance
//! engine's per-factor weights. Configuration is resolved in layers - safe
//! defaults, a [`Profile`]-selected template, then environment overrides -
//! and validated before use.

pub mod error;
pub mod profile;
pub mod source;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use profile::Profile;
pub use source::{ConfigurationLoader, ConfigurationSource, EnvironmentSource, TomlFileSource};
pub use validation::{validate_non_empty, validate_range, Validate};

use serde::{Deserialize, Serialize};

/// Which in-process cache backend a [`EngineConfig`] selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackendKind {
    /// Plain in-process LRU cache.
    Memory,
    /// A namespaced wrapper suitable for a shared/out-of-process backend.
    Network,
}

impl Default for CacheBackendKind {
    fn default() -> Self {
        Self::Memory
    }
}

impl std::str::FromStr for CacheBackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "network" => Ok(Self::Network),
            other => Err(ConfigError::Generic {
                message: format!("unknown cache backend: {other}"),
            }),
        }
    }
}

/// The seven weighted factors the relevance engine combines into a final
/// score. Must sum to 1.0; [`RankingWeights::normalise`] rescales otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RankingWeights {
    pub query_match: f64,
    pub recency: f64,
    pub file_importance: f64,
    pub author_relevance: f64,
    pub commit_quality: f64,
    pub context_relevance: f64,
    pub frequency: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            query_match: 0.30,
            recency: 0.20,
            file_importance: 0.15,
            author_relevance: 0.10,
            commit_quality: 0.10,
            context_relevance: 0.10,
            frequency: 0.05,
        }
    }
}

impl RankingWeights {
    fn sum(&self) -> f64 {
        self.query_match
            + self.recency
            + self.file_importance
            + self.author_relevance
            + self.commit_quality
            + self.context_relevance
            + self.frequency
    }

    /// Rescale the seven weights so they sum to 1.0. A no-op if they already do.
    pub fn normalise(&mut self) {
        let total = self.sum();
        if total <= 0.0 || (total - 1.0).abs() < f64::EPSILON {
            return;
        }
        self.query_match /= total;
        self.recency /= total;
        self.file_importance /= total;
        self.author_relevance /= total;
        self.commit_quality /= total;
        self.context_relevance /= total;
        self.frequency /= total;
    }
}

/// Cache-related options, grouped to keep [`EngineConfig`] flat elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub backend: CacheBackendKind,
    pub ttl_seconds: u64,
    pub max_size: u64,
    pub max_memory_mb: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackendKind::Memory,
            ttl_seconds: 3600,
            max_size: 10_000,
            max_memory_mb: 256,
        }
    }
}

/// The full recognised options surface for a githound search engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub profile: Profile,

    pub enable_advanced_searchers: bool,
    pub enable_basic_searchers: bool,
    pub enable_ranking: bool,
    pub enable_fuzzy_search: bool,
    pub enable_pattern_detection: bool,

    pub cache: CacheConfig,

    pub max_workers: usize,
    pub default_max_results: Option<usize>,

    pub ranking_weights: RankingWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::with_profile(Profile::default())
    }
}

impl EngineConfig {
    /// Build a configuration seeded with profile-appropriate defaults.
    ///
    /// Profiles only change a handful of operational defaults (worker
    /// count, cache size); every profile still enables the full searcher
    /// set since no recognised option is profile-gated by the spec.
    #[must_use]
    pub fn with_profile(profile: Profile) -> Self {
        let (max_workers, cache) = match profile {
            Profile::Development => (
                4,
                CacheConfig {
                    max_size: 1_000,
                    max_memory_mb: 64,
                    ..CacheConfig::default()
                },
            ),
            Profile::Staging => (4, CacheConfig::default()),
            Profile::Production => (
                8,
                CacheConfig {
                    max_size: 50_000,
                    max_memory_mb: 512,
                    ..CacheConfig::default()
                },
            ),
            Profile::Test => (
                2,
                CacheConfig {
                    enabled: true,
                    max_size: 100,
                    max_memory_mb: 16,
                    ..CacheConfig::default()
                },
            ),
        };

        Self {
            profile,
            enable_advanced_searchers: true,
            enable_basic_searchers: true,
            enable_ranking: true,
            enable_fuzzy_search: true,
            enable_pattern_detection: true,
            cache,
            max_workers,
            default_max_results: None,
            ranking_weights: RankingWeights::default(),
        }
    }

    /// Load configuration from environment variables, falling back to
    /// profile defaults for anything unset.
    ///
    /// # Errors
    /// Returns `ConfigError` if a set variable fails to parse or the
    /// resulting configuration fails validation.
    pub fn from_env() -> ConfigResult<Self> {
        let profile: Profile = std::env::var("GITHOUND_PROFILE")
            .unwrap_or_else(|_| "development".to_string())
            .parse()?;

        let mut config = Self::with_profile(profile);

        if let Ok(v) = std::env::var("GITHOUND_ENABLE_ADVANCED_SEARCHERS") {
            config.enable_advanced_searchers = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("GITHOUND_ENABLE_BASIC_SEARCHERS") {
            config.enable_basic_searchers = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("GITHOUND_ENABLE_RANKING") {
            config.enable_ranking = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("GITHOUND_ENABLE_FUZZY_SEARCH") {
            config.enable_fuzzy_search = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("GITHOUND_ENABLE_PATTERN_DETECTION") {
            config.enable_pattern_detection = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("GITHOUND_ENABLE_CACHING") {
            config.cache.enabled = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("GITHOUND_CACHE_BACKEND") {
            config.cache.backend = v.parse()?;
        }
        if let Ok(v) = std::env::var("GITHOUND_CACHE_TTL_SECONDS") {
            config.cache.ttl_seconds = parse_u64(&v, "GITHOUND_CACHE_TTL_SECONDS")?;
        }
        if let Ok(v) = std::env::var("GITHOUND_CACHE_MAX_SIZE") {
            config.cache.max_size = parse_u64(&v, "GITHOUND_CACHE_MAX_SIZE")?;
        }
        if let Ok(v) = std::env::var("GITHOUND_CACHE_MAX_MEMORY_MB") {
            config.cache.max_memory_mb = parse_u64(&v, "GITHOUND_CACHE_MAX_MEMORY_MB")?;
        }
        if let Ok(v) = std::env::var("GITHOUND_MAX_WORKERS") {
            config.max_workers = parse_u64(&v, "GITHOUND_MAX_WORKERS")? as usize;
        }
        if let Ok(v) = std::env::var("GITHOUND_DEFAULT_MAX_RESULTS") {
            config.default_max_results = Some(parse_u64(&v, "GITHOUND_DEFAULT_MAX_RESULTS")? as usize);
        }

        config.ranking_weights.normalise();
        config.validate()?;
        Ok(config)
    }
}

fn parse_bool(v: &str) -> bool {
    matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_u64(v: &str, field: &str) -> ConfigResult<u64> {
    v.parse().map_err(|_| ConfigError::Generic {
        message: format!("invalid integer for {field}: {v}"),
    })
}

impl Validate for EngineConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_range(u64::from(self.max_workers as u32), 1, 256, "max_workers")?;
        validate_range(self.cache.ttl_seconds, 0, 86_400 * 30, "cache.ttl_seconds")?;
        validate_range(self.cache.max_size, 1, 10_000_000, "cache.max_size")?;
        validate_range(self.cache.max_memory_mb, 1, 65_536, "cache.max_memory_mb")?;

        let sum = self.ranking_weights.sum();
        if (sum - 1.0).abs() > 0.01 {
            return Err(ConfigError::Generic {
                message: format!("ranking_weights must sum to 1.0, got {sum}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let weights = RankingWeights::default();
        assert!((weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn normalise_rescales_uneven_weights() {
        let mut weights = RankingWeights {
            query_match: 1.0,
            recency: 1.0,
            file_importance: 0.0,
            author_relevance: 0.0,
            commit_quality: 0.0,
            context_relevance: 0.0,
            frequency: 0.0,
        };
        weights.normalise();
        assert!((weights.sum() - 1.0).abs() < 1e-9);
        assert!((weights.query_match - 0.5).abs() < 1e-9);
    }

    #[test]
    fn profile_defaults_validate() {
        for profile in [
            Profile::Development,
            Profile::Staging,
            Profile::Production,
            Profile::Test,
        ] {
            let config = EngineConfig::with_profile(profile);
            config.validate().unwrap();
        }
    }

    #[test]
    fn zero_workers_is_invalid() {
        let mut config = EngineConfig::default();
        config.max_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn cache_backend_kind_parses() {
        assert_eq!(
            "network".parse::<CacheBackendKind>().unwrap(),
            CacheBackendKind::Network
        );
        assert!("bogus".parse::<CacheBackendKind>().is_err());
    }
}
