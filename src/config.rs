// src/config.rs

use crate::errors::ConfigError;
use crate::logging::PROJECT_NAME;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Ports checked on every live host unless overridden.
pub const COMMON_PORTS: &[u16] = &[21, 22, 23, 25, 80, 443, 3389, 8080];

pub const DEFAULT_WORDLIST: &str = "subdomains.txt";
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1_000;
const DEFAULT_DNS_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_RESOLVE_WORKERS: usize = 50;
const DEFAULT_PROBE_WORKERS: usize = 100;

// One or more dot-separated labels; underscores are tolerated since they show
// up in real zones (e.g. `_dmarc`).
static HOSTNAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9_]([a-z0-9_-]{0,61}[a-z0-9_])?(\.[a-z0-9_]([a-z0-9_-]{0,61}[a-z0-9_])?)*$")
        .expect("hostname pattern is valid")
});

/// Returns whether `name` is made of syntactically valid DNS labels.
pub fn is_valid_hostname(name: &str) -> bool {
    name.len() <= 253 && HOSTNAME_RE.is_match(name)
}

/// The root domain under scan, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDomain(String);

impl TargetDomain {
    /// Normalizes user input into a domain name.
    ///
    /// Accepts bare names as well as URLs (`https://example.com/path`), strips
    /// surrounding whitespace and trailing dots, and lowercases the result.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let trimmed = input.trim();
        let host = if trimmed.contains("://") {
            Url::parse(trimmed)
                .ok()
                .and_then(|url| url.host_str().map(String::from))
                .ok_or_else(|| ConfigError::InvalidTarget(trimmed.to_string()))?
        } else {
            // Drop any path the user pasted along with the name.
            trimmed.split('/').next().unwrap_or_default().to_string()
        };

        let normalized = host.trim_end_matches('.').to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(ConfigError::EmptyTarget);
        }
        if !is_valid_hostname(&normalized) {
            return Err(ConfigError::InvalidTarget(normalized));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the fully qualified name of a candidate label under this domain.
    pub fn qualify(&self, label: &str) -> String {
        format!("{}.{}", label.trim_matches('.'), self.0)
    }
}

impl fmt::Display for TargetDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where candidate labels come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordlistSource {
    /// The conventional path; if it is missing the built-in list is used.
    Default(PathBuf),
    /// A path the user asked for explicitly; failing to read it is an error.
    Explicit(PathBuf),
}

/// Settings for one scan run. Read-only once the run has started.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub target: TargetDomain,
    pub wordlist: WordlistSource,
    pub ports: Vec<u16>,
    pub connect_timeout: Duration,
    pub lookup_timeout: Duration,
    pub resolve_workers: usize,
    pub probe_workers: usize,
    pub output_dir: PathBuf,
}

impl ScanConfig {
    /// A configuration with every setting at its default.
    pub fn new(target: TargetDomain) -> Self {
        Self {
            target,
            wordlist: WordlistSource::Default(PathBuf::from(DEFAULT_WORDLIST)),
            ports: COMMON_PORTS.to_vec(),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            lookup_timeout: Duration::from_millis(DEFAULT_DNS_TIMEOUT_MS),
            resolve_workers: DEFAULT_RESOLVE_WORKERS,
            probe_workers: DEFAULT_PROBE_WORKERS,
            output_dir: PathBuf::from("."),
        }
    }

    /// Builds the configuration from the target input and `SUBSCAN_RS_*`
    /// environment overrides.
    pub fn from_env(target_input: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(target_input, |key| std::env::var(key).ok())
    }

    /// Same as [`ScanConfig::from_env`] with an injectable variable lookup.
    pub fn from_lookup<F>(target_input: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(TargetDomain::parse(target_input)?);
        let var = |name: &str| {
            let key = env_key(name);
            lookup(&key).map(|value| (key, value))
        };

        if let Some((_, path)) = var("WORDLIST") {
            config.wordlist = WordlistSource::Explicit(PathBuf::from(path));
        }
        if let Some((key, value)) = var("PORTS") {
            config.ports = parse_ports(&key, &value)?;
        }
        if let Some((key, value)) = var("CONNECT_TIMEOUT_MS") {
            config.connect_timeout = Duration::from_millis(parse_positive(&key, &value)?);
        }
        if let Some((key, value)) = var("DNS_TIMEOUT_MS") {
            config.lookup_timeout = Duration::from_millis(parse_positive(&key, &value)?);
        }
        if let Some((key, value)) = var("RESOLVE_WORKERS") {
            config.resolve_workers = parse_positive(&key, &value)?;
        }
        if let Some((key, value)) = var("PROBE_WORKERS") {
            config.probe_workers = parse_positive(&key, &value)?;
        }
        if let Some((_, dir)) = var("OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        Ok(config)
    }
}

fn env_key(name: &str) -> String {
    format!("{}_{}", PROJECT_NAME.as_str(), name)
}

fn parse_positive<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(parsed),
        Ok(_) => Err(invalid(key, value, "must be greater than zero")),
        Err(_) => Err(invalid(key, value, "not a number")),
    }
}

/// Parses a comma separated port list into a sorted, de-duplicated vector.
fn parse_ports(key: &str, value: &str) -> Result<Vec<u16>, ConfigError> {
    let mut ports = BTreeSet::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match item.parse::<u16>() {
            Ok(0) | Err(_) => return Err(invalid(key, value, "ports must be in 1-65535")),
            Ok(port) => {
                ports.insert(port);
            }
        }
    }
    if ports.is_empty() {
        return Err(invalid(key, value, "port list is empty"));
    }
    Ok(ports.into_iter().collect())
}

fn invalid(key: &str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    }
}
