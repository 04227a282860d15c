// Client configuration. Everything comes from the environment with a
// working default, so running the binary with nothing set talks to a
// service on localhost.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub const ENV_BASE_URL: &str = "LEAFSCAN_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "LEAFSCAN_TIMEOUT_SECS";
pub const ENV_OUTPUT_DIR: &str = "LEAFSCAN_OUTPUT_DIR";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base address of the inference service, without a trailing slash.
    pub base_url: String,
    /// Request timeout. `None` waits for as long as the service takes.
    pub timeout: Option<Duration>,
    /// Directory decoded segmentation masks are written to.
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_BASE_URL)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());

        let timeout = lookup(ENV_TIMEOUT_SECS).and_then(|v| match v.trim().parse::<u64>() {
            Ok(0) => None,
            Ok(secs) => Some(Duration::from_secs(secs)),
            Err(_) => {
                log::warn!("ignoring {}={:?}: not a number of seconds", ENV_TIMEOUT_SECS, v);
                None
            }
        });

        let output_dir = lookup(ENV_OUTPUT_DIR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_output_dir);

        Config {
            base_url: normalize_base_url(&base_url),
            timeout,
            output_dir,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    /// Absolute URL for an API path such as `/predict`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn default_output_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("leafscan")
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
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, None);
        assert!(config.output_dir.ends_with("leafscan"));
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_BASE_URL, "http://inference.lan:9000/"),
            (ENV_TIMEOUT_SECS, "30"),
            (ENV_OUTPUT_DIR, "/tmp/masks"),
        ]));
        assert_eq!(config.base_url, "http://inference.lan:9000");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/masks"));
        assert_eq!(config.endpoint("/predict"), "http://inference.lan:9000/predict");
    }

    #[test]
    fn bad_or_zero_timeout_means_none() {
        let config = Config::from_lookup(lookup_from(&[(ENV_TIMEOUT_SECS, "soon")]));
        assert_eq!(config.timeout, None);
        let config = Config::from_lookup(lookup_from(&[(ENV_TIMEOUT_SECS, "0")]));
        assert_eq!(config.timeout, None);
    }
}
