use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracksym_core::{FallbackMethod, TrackId};
use tracksym_trackspec::{ScenarioSpec, SpecError};

mod binding;
mod driver;

pub use binding::compute_inputs_hash;
pub use driver::{
    compute_all_pairs, compute_pairs_isolated, score_pair, PairError, PairOutcome, PairRecord,
};

pub const FALLBACK_ENV: &str = "TRACKSYM_FALLBACK";

pub fn jcs_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_jcs::to_vec(value)
}

pub fn blake3_hex(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

pub fn config_hash(config: &CompareConfig) -> Result<String, serde_json::Error> {
    Ok(blake3_hex(&jcs_bytes(config)?))
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CompareConfig {
    pub scenario: ScenarioSpec,
    pub fallback: FallbackMethod,
}

impl CompareConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(|err| ConfigError::Parse {
            path: None,
            message: err.to_string(),
        })?;
        config.scenario.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_json_str(&raw).map_err(|err| match err {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        message: String,
    },
    Parse {
        path: Option<PathBuf>,
        message: String,
    },
    Scenario(SpecError),
    Env {
        name: &'static str,
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => {
                write!(f, "failed to read config {}: {}", path.display(), message)
            }
            Self::Parse {
                path: Some(path),
                message,
            } => write!(f, "invalid config {}: {}", path.display(), message),
            Self::Parse {
                path: None,
                message,
            } => write!(f, "invalid config: {}", message),
            Self::Scenario(err) => write!(f, "invalid scenario: {}", err),
            Self::Env { name, message } => write!(f, "{}: {}", name, message),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<SpecError> for ConfigError {
    fn from(value: SpecError) -> Self {
        ConfigError::Scenario(value)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Env,
    Cli,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedConfig {
    pub config: CompareConfig,
    pub source: ConfigSource,
}

pub fn resolve_config(
    file: Option<&Path>,
    env_fallback: Option<&str>,
    cli_fallback: Option<FallbackMethod>,
) -> Result<ResolvedConfig, ConfigError> {
    let (mut config, mut source) = match file {
        Some(path) => (CompareConfig::load(path)?, ConfigSource::File),
        None => (CompareConfig::default(), ConfigSource::Default),
    };

    if let Some(raw) = env_fallback.filter(|raw| !raw.trim().is_empty()) {
        config.fallback = raw.parse().map_err(|message| ConfigError::Env {
            name: FALLBACK_ENV,
            message,
        })?;
        source = ConfigSource::Env;
    }

    if let Some(fallback) = cli_fallback {
        config.fallback = fallback;
        source = ConfigSource::Cli;
    }

    Ok(ResolvedConfig { config, source })
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AuditTrace {
    pub hashes: HashesTrace,
    pub config_source: ConfigSource,
    pub fallback: FallbackMethod,
    pub input: Option<InputTrace>,
    pub error: Option<AuditError>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HashesTrace {
    pub config_hash: String,
    pub inputs_hash: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InputTrace {
    pub path: String,
    pub tracks: Vec<TrackId>,
    pub rows_read: usize,
    pub rows_skipped: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AuditError {
    pub code: String,
    pub message: String,
}
