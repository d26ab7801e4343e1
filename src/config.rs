use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono_tz::Tz;
use thiserror::Error;

use crate::constants::{
    DEFAULT_JOB_TIMEOUT_SECS, DEFAULT_MONGO_DB, DEFAULT_OUTPUT_NAME, DEFAULT_REQUIRED_SECRETS,
    DEFAULT_SA_JSON_PATH, DEFAULT_TARGET_HOUR, DEFAULT_TARGET_TZ, DEFAULT_TARGET_TZ_LABEL,
};

/// Process-wide settings. Every field has a default, so loading never fails.
///
/// Invalid values are replaced by defaults with a warning, so load this after
/// tracing is initialized. Logging settings live in `LogConfig`.
#[derive(Debug, Clone)]
pub struct Config {
    pub trigger: TriggerConfig,
    pub scheduler: SchedulerConfig,
}

/// Inputs of the time-window gate and the secret check.
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    pub timezone: Tz,
    pub target_hour: u32,
    pub tz_label: String,
    pub force_run: bool,
    pub required_secrets: Vec<String>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TARGET_TZ,
            target_hour: DEFAULT_TARGET_HOUR,
            tz_label: DEFAULT_TARGET_TZ_LABEL.to_string(),
            force_run: false,
            required_secrets: DEFAULT_REQUIRED_SECRETS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub job_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let target_hour = match env_or_parse("TARGET_HOUR", DEFAULT_TARGET_HOUR) {
            h if h <= 23 => h,
            h => {
                tracing::warn!(value = h, "TARGET_HOUR out of range, using default");
                DEFAULT_TARGET_HOUR
            }
        };

        Self {
            trigger: TriggerConfig {
                timezone: env_or_parse("TARGET_TZ", DEFAULT_TARGET_TZ),
                target_hour,
                tz_label: env_or("TARGET_TZ_LABEL", DEFAULT_TARGET_TZ_LABEL),
                force_run: env_or_bool("FORCE_RUN", false),
                required_secrets: env_or_list("REQUIRED_SECRETS", DEFAULT_REQUIRED_SECRETS),
            },
            scheduler: SchedulerConfig {
                enabled: env_or_bool("SCHEDULER_ENABLED", false),
                job_timeout_secs: env_or_parse("JOB_TIMEOUT_SECS", DEFAULT_JOB_TIMEOUT_SECS),
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting: {key}")]
    Missing { key: &'static str },
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("Service account JSON not found at SA_JSON_PATH: {}", path.display())]
    ServiceAccountNotFound { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Refetch every finished journal.
    Full,
    /// Fetch only journals newer than the artifact's watermark.
    Incremental,
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Incremental => "inc",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "inc" | "incremental" => Ok(Self::Incremental),
            _ => Err(ConfigError::Invalid {
                key: "RUN_MODE",
                value: s.to_string(),
                reason: "expected \"full\" or \"inc\"".to_string(),
            }),
        }
    }
}

/// Where the Drive service account key comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Full key JSON passed through `DRIVE_SA_JSON`.
    Inline(String),
    /// Key file on disk, from `SA_JSON_PATH`.
    File(PathBuf),
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(_) => f.write_str("Inline(***REDACTED***)"),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

/// Settings for one pipeline invocation. Built once, then passed by reference.
#[derive(Clone)]
pub struct RunConfig {
    pub mongo_uri: String,
    pub mongo_db: String,
    pub drive_folder_id: String,
    pub credential: CredentialSource,
    pub output_name: String,
    pub run_mode: RunMode,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("mongo_uri", &"***REDACTED***")
            .field("mongo_db", &self.mongo_db)
            .field("drive_folder_id", &self.drive_folder_id)
            .field("credential", &self.credential)
            .field("output_name", &self.output_name)
            .field("run_mode", &self.run_mode)
            .finish()
    }
}

/// Highest-precedence layer of the resolver, for callers that embed the pipeline.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub mongo_uri: Option<String>,
    pub mongo_db: Option<String>,
    pub drive_folder_id: Option<String>,
    pub sa_json_path: Option<String>,
    pub drive_sa_json: Option<String>,
    pub output_name: Option<String>,
    pub run_mode: Option<String>,
}

impl ConfigOverrides {
    fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "MONGO_URI" => &self.mongo_uri,
            "MONGO_DB" => &self.mongo_db,
            "DRIVE_FOLDER_ID" => &self.drive_folder_id,
            "SA_JSON_PATH" => &self.sa_json_path,
            "DRIVE_SA_JSON" => &self.drive_sa_json,
            "OUTPUT_NAME" => &self.output_name,
            "RUN_MODE" => &self.run_mode,
            _ => return None,
        };
        value.as_deref()
    }
}

fn compiled_default(key: &str) -> Option<&'static str> {
    match key {
        "MONGO_DB" => Some(DEFAULT_MONGO_DB),
        "SA_JSON_PATH" => Some(DEFAULT_SA_JSON_PATH),
        "OUTPUT_NAME" => Some(DEFAULT_OUTPUT_NAME),
        "RUN_MODE" => Some("inc"),
        _ => None,
    }
}

struct Layers<'a, F> {
    overrides: &'a ConfigOverrides,
    lookup: F,
}

impl<F> Layers<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Override, then environment. Blank values count as unset.
    fn explicit(&self, key: &str) -> Option<String> {
        self.overrides
            .get(key)
            .map(str::to_string)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| (self.lookup)(key).filter(|v| !v.trim().is_empty()))
    }

    fn require(&self, key: &'static str) -> Result<String, ConfigError> {
        self.explicit(key)
            .or_else(|| compiled_default(key).map(str::to_string))
            .ok_or(ConfigError::Missing { key })
    }
}

impl RunConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(&ConfigOverrides::default(), env_lookup)
    }

    /// Resolve through override → environment → compiled default → error.
    pub fn resolve<F>(overrides: &ConfigOverrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let layers = Layers { overrides, lookup };

        let mongo_uri = layers.require("MONGO_URI")?;
        let drive_folder_id = layers.require("DRIVE_FOLDER_ID")?;

        let credential = match layers.explicit("DRIVE_SA_JSON") {
            Some(inline) => CredentialSource::Inline(inline),
            None => {
                let path = PathBuf::from(layers.require("SA_JSON_PATH")?);
                if !path.is_file() {
                    return Err(ConfigError::ServiceAccountNotFound { path });
                }
                CredentialSource::File(path)
            }
        };

        Ok(Self {
            mongo_uri,
            mongo_db: layers.require("MONGO_DB")?,
            drive_folder_id,
            credential,
            output_name: layers.require("OUTPUT_NAME")?,
            run_mode: layers.require("RUN_MODE")?.parse()?,
        })
    }
}

pub fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Comma-separated list; an unset or empty variable yields `default`.
pub fn env_or_list(key: &str, default: &[&str]) -> Vec<String> {
    let parsed: Vec<String> = env::var(key)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if parsed.is_empty() {
        default.iter().map(|s| s.to_string()).collect()
    } else {
        parsed
    }
}
