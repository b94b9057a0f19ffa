use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

pub const DEFAULT_ANALYSIS_ENDPOINT: &str = "http://localhost:8000/api/analyze";
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 45;
pub const DEFAULT_CHUNK_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_STORE_FILENAME: &str = "camcoach-latest.json";
pub const ENV_ANALYSIS_ENDPOINT: &str = "CAMCOACH_ANALYSIS_ENDPOINT";
pub const ENV_STORE_PATH: &str = "CAMCOACH_STORE_PATH";

/// Analysis service endpoint, validated as an absolute URL at construction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisEndpoint(String);

impl AnalysisEndpoint {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        url::Url::parse(&v)?;
        Ok(Self(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AnalysisEndpoint {
    fn default() -> Self {
        Self(DEFAULT_ANALYSIS_ENDPOINT.to_owned())
    }
}

/// Upper bound on how long a single analysis upload may take.
///
/// Deliberately generous: the upstream model runs facial, audio and fusion
/// passes over the whole recording before answering.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadTimeout {
    pub secs: u64,
}

impl UploadTimeout {
    pub fn new(secs: u64) -> Result<Self, ConfigError> {
        if secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Self { secs })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.secs)
    }
}

impl Default for UploadTimeout {
    fn default() -> Self {
        Self {
            secs: DEFAULT_UPLOAD_TIMEOUT_SECS,
        }
    }
}

/// Interval at which the encoder flushes a chunk while recording.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkInterval {
    pub ms: u64,
}

impl ChunkInterval {
    pub fn new(ms: u64) -> Result<Self, ConfigError> {
        if ms == 0 {
            return Err(ConfigError::ZeroChunkInterval);
        }
        Ok(Self { ms })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.ms)
    }
}

impl Default for ChunkInterval {
    fn default() -> Self {
        Self {
            ms: DEFAULT_CHUNK_INTERVAL_MS,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub endpoint: AnalysisEndpoint,
    pub upload_timeout: UploadTimeout,
    pub chunk_interval: ChunkInterval,
    pub store_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: AnalysisEndpoint::default(),
            upload_timeout: UploadTimeout::default(),
            chunk_interval: ChunkInterval::default(),
            store_path: PathBuf::from(DEFAULT_STORE_FILENAME),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("analysis endpoint must not be empty")]
    EmptyEndpoint,
    #[error("analysis endpoint is not a valid url: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("upload timeout must be > 0 s")]
    ZeroTimeout,
    #[error("chunk interval must be > 0 ms")]
    ZeroChunkInterval,
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_endpoint(
    cli_value: Option<String>,
    env: &impl Env,
) -> Result<AnalysisEndpoint, ConfigError> {
    match cli_value {
        Some(v) => AnalysisEndpoint::new(v),
        None => match env.var(ENV_ANALYSIS_ENDPOINT) {
            Some(v) => AnalysisEndpoint::new(v),
            None => Ok(AnalysisEndpoint::default()),
        },
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}
