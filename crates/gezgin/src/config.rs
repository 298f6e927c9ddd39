use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub corpus_path: PathBuf,
    pub vector: VectorConfig,
    pub weather: WeatherConfig,
    pub routing: RoutingConfig,
    /// Upper bound for any single external call, in seconds. Expiry is
    /// treated exactly like failure.
    pub external_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    pub endpoint: String,
    pub collection: String,
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub endpoint: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            corpus_path: PathBuf::from("data/place_category_suggestions.json"),
            vector: VectorConfig {
                endpoint: "http://127.0.0.1:8001".to_string(),
                collection: "izmir_locations".to_string(),
                top_k: 5,
            },
            weather: WeatherConfig {
                endpoint: "http://api.weatherapi.com/v1".to_string(),
                api_key: None,
            },
            routing: RoutingConfig {
                endpoint: "http://router.project-osrm.org".to_string(),
            },
            external_timeout_secs: 10,
        }
    }
}

impl PlannerConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.vector.top_k == 0 {
            return Err("vector.top_k must be > 0".into());
        }
        if self.vector.endpoint.is_empty() {
            return Err("vector.endpoint must not be empty".into());
        }
        if self.vector.collection.is_empty() {
            return Err("vector.collection must not be empty".into());
        }
        if self.weather.endpoint.is_empty() {
            return Err("weather.endpoint must not be empty".into());
        }
        if self.routing.endpoint.is_empty() {
            return Err("routing.endpoint must not be empty".into());
        }
        if self.external_timeout_secs == 0 {
            return Err("external_timeout_secs must be > 0".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PlannerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_top_k_is_rejected() {
        let mut config = PlannerConfig::default();
        config.vector.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut config = PlannerConfig::default();
        config.external_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
