use anyhow::{Context, Result};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://shilpanshu-sam2-backend.hf.space";
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;
pub const DEFAULT_COLD_START_SECS: u64 = 15;

/// Runtime configuration loaded from the environment.
/// Every key is optional and falls back to the defaults above.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
    pub cold_start_after: Duration,
    /// Whether an opaque full-colour result still counts as a cutout.
    pub accept_opaque_fallback: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cold_start_after: Duration::from_secs(DEFAULT_COLD_START_SECS),
            accept_opaque_fallback: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Config {
            api_url: lookup("SEGMENTATION_API_URL").unwrap_or(defaults.api_url),
            timeout: parse_secs(&lookup, "SEGMENTATION_TIMEOUT_SECS")?.unwrap_or(defaults.timeout),
            cold_start_after: parse_secs(&lookup, "COLD_START_WARNING_SECS")?
                .unwrap_or(defaults.cold_start_after),
            accept_opaque_fallback: match lookup("ACCEPT_OPAQUE_FALLBACK") {
                Some(value) => value
                    .parse::<bool>()
                    .with_context(|| format!("ACCEPT_OPAQUE_FALLBACK must be true or false, got '{value}'"))?,
                None => defaults.accept_opaque_fallback,
            },
        })
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            value
                .parse::<u64>()
                .map(Duration::from_secs)
                .with_context(|| format!("{key} must be a whole number of seconds, got '{value}'"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(180));
        assert_eq!(config.cold_start_after, Duration::from_secs(15));
        assert!(config.accept_opaque_fallback);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("SEGMENTATION_API_URL", "http://localhost:7860/"),
            ("SEGMENTATION_TIMEOUT_SECS", "30"),
            ("ACCEPT_OPAQUE_FALLBACK", "false"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "http://localhost:7860/");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.accept_opaque_fallback);
    }

    #[test]
    fn test_malformed_timeout_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("SEGMENTATION_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("SEGMENTATION_TIMEOUT_SECS"));
    }
}
