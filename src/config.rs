use crate::resilience::{AdmissionPolicy, RetryPolicy};
use crate::service::ApiVersion;
use crate::upstream::RetryOn;
use crate::upstream::http::DEFAULT_CAT_FACTS_URL;
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FactsConfig {
    pub url: String,
    pub request_timeout: Duration,
    pub admission: AdmissionPolicy,
    pub retry: RetryPolicy,
    pub retry_on: RetryOn,
    /// Number of leading calls that fail transiently, for demonstrating retries.
    pub simulated_failures: u64,
}

impl Default for FactsConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CAT_FACTS_URL.to_string(),
            request_timeout: Duration::from_millis(5_000),
            admission: AdmissionPolicy::default(),
            retry: RetryPolicy::default(),
            retry_on: RetryOn::default(),
            simulated_failures: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DogsConfig {
    /// Version served when a request names none.
    pub default_version: ApiVersion,
    pub seed_sample: bool,
}

impl Default for DogsConfig {
    fn default() -> Self {
        Self {
            default_version: ApiVersion::V1_1,
            seed_sample: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub facts: FactsConfig,
    pub dogs: DogsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            facts: FactsConfig::default(),
            dogs: DogsConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("APP_HOST").unwrap_or(defaults.host);
        let port = parse_var(&lookup, "APP_PORT", defaults.port)?;

        let retry = RetryPolicy {
            max_attempts: parse_var(&lookup, "FACTS_MAX_ATTEMPTS", defaults.facts.retry.max_attempts)?,
            initial_backoff_ms: parse_var(
                &lookup,
                "FACTS_INITIAL_BACKOFF_MS",
                defaults.facts.retry.initial_backoff_ms,
            )?,
            max_backoff_ms: parse_var(
                &lookup,
                "FACTS_MAX_BACKOFF_MS",
                defaults.facts.retry.max_backoff_ms,
            )?,
        };
        if retry.max_attempts == 0 {
            return Err(anyhow!("FACTS_MAX_ATTEMPTS must be at least 1"));
        }

        let max_concurrency = parse_var(
            &lookup,
            "FACTS_MAX_CONCURRENCY",
            defaults.facts.admission.max_concurrency,
        )?;
        if max_concurrency == 0 {
            return Err(anyhow!("FACTS_MAX_CONCURRENCY must be at least 1"));
        }
        let acquire_timeout_ms = lookup("FACTS_ADMISSION_TIMEOUT_MS")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .context("FACTS_ADMISSION_TIMEOUT_MS must be a valid u64")
            })
            .transpose()?;

        let retry_on = match lookup("FACTS_RETRY_ON") {
            Some(raw) => RetryOn::from_str(&raw)
                .map_err(|err| anyhow!("FACTS_RETRY_ON is invalid: {err}"))?,
            None => defaults.facts.retry_on,
        };

        let facts = FactsConfig {
            url: lookup("CAT_FACTS_URL").unwrap_or(defaults.facts.url),
            request_timeout: Duration::from_millis(parse_var(
                &lookup,
                "CAT_FACTS_TIMEOUT_MS",
                defaults.facts.request_timeout.as_millis() as u64,
            )?),
            admission: AdmissionPolicy {
                max_concurrency,
                acquire_timeout_ms,
            },
            retry,
            retry_on,
            simulated_failures: parse_var(
                &lookup,
                "FACTS_SIMULATED_FAILURES",
                defaults.facts.simulated_failures,
            )?,
        };

        let default_version = match lookup("DOGS_DEFAULT_API_VERSION") {
            Some(raw) => raw
                .parse::<ApiVersion>()
                .context("DOGS_DEFAULT_API_VERSION is invalid")?,
            None => defaults.dogs.default_version,
        };
        let dogs = DogsConfig {
            default_version,
            seed_sample: parse_var(&lookup, "DOGS_SEED_SAMPLE", defaults.dogs.seed_sample)?,
        };

        Ok(Self {
            host,
            port,
            facts,
            dogs,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>())),
        None => Ok(default),
    }
}

/// Command-line overrides applied on top of the environment.
#[derive(Debug, Default, Parser)]
#[command(name = "adoptions", version, about = "Dog adoptions and cat facts service")]
pub struct Cli {
    /// Address to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Fail this many leading cat facts calls with a transient error
    #[arg(long)]
    pub simulated_failures: Option<u64>,

    /// Start with an empty dog repository
    #[arg(long)]
    pub no_seed: bool,
}

impl Cli {
    pub fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(failures) = self.simulated_failures {
            config.facts.simulated_failures = failures;
        }
        if self.no_seed {
            config.dogs.seed_sample = false;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.address(), "0.0.0.0:8080");
        assert_eq!(config.facts.admission.max_concurrency, 10);
        assert_eq!(config.facts.admission.acquire_timeout_ms, None);
        assert_eq!(config.facts.retry.max_attempts, 4);
        assert_eq!(config.facts.retry_on, RetryOn::default());
        assert_eq!(config.facts.url, DEFAULT_CAT_FACTS_URL);
        assert_eq!(config.dogs.default_version, ApiVersion::V1_1);
        assert!(config.dogs.seed_sample);
    }

    #[test]
    fn environment_overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("APP_PORT", "9090"),
            ("FACTS_MAX_CONCURRENCY", "2"),
            ("FACTS_ADMISSION_TIMEOUT_MS", "250"),
            ("FACTS_MAX_ATTEMPTS", "6"),
            ("FACTS_RETRY_ON", "unavailable,decode"),
            ("DOGS_DEFAULT_API_VERSION", "1.0"),
            ("DOGS_SEED_SAMPLE", "false"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.facts.admission, AdmissionPolicy::new(2).with_acquire_timeout(250));
        assert_eq!(config.facts.retry.max_attempts, 6);
        assert_eq!(config.facts.retry_on.as_slice().len(), 2);
        assert_eq!(config.dogs.default_version, ApiVersion::V1_0);
        assert!(!config.dogs.seed_sample);
    }

    #[test]
    fn invalid_values_are_reported_by_name() {
        let err = AppConfig::from_lookup(lookup_from(&[("APP_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));

        let err = AppConfig::from_lookup(lookup_from(&[("FACTS_MAX_ATTEMPTS", "0")])).unwrap_err();
        assert!(err.to_string().contains("FACTS_MAX_ATTEMPTS"));

        let err =
            AppConfig::from_lookup(lookup_from(&[("DOGS_DEFAULT_API_VERSION", "3")])).unwrap_err();
        assert!(err.to_string().contains("DOGS_DEFAULT_API_VERSION"));
    }

    #[test]
    fn cli_flags_override_the_environment() {
        let cli = Cli::try_parse_from(["adoptions", "--port", "3000", "--simulated-failures", "3", "--no-seed"])
            .unwrap();
        let config = cli.apply(AppConfig::default());

        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.facts.simulated_failures, 3);
        assert!(!config.dogs.seed_sample);
    }
}
