//! A single gated invocation: window gate, secret check, config, connect, export.

use chrono::{DateTime, Utc};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{env_lookup, ConfigOverrides, RunConfig, TriggerConfig};
use crate::drive::{ArtifactStore, DriveClient, ServiceAccountKey};
use crate::error::PipelineError;
use crate::gate::{GateDecision, WindowGate};
use crate::pipeline::{self, RunReport};
use crate::secrets::missing_secrets;
use crate::source::{JournalSource, MongoSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed(RunReport),
    SkippedWrongWindow { local_hour: u32, target_hour: u32 },
    SkippedMissingSecrets { missing: Vec<String> },
}

impl Outcome {
    pub fn is_skip(&self) -> bool {
        !matches!(self, Self::Completed(_))
    }
}

/// Process exit status: skips are successful no-ops.
pub fn exit_code(result: &Result<Outcome, PipelineError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

/// Builds the live source and destination once configuration is known.
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Source: JournalSource;
    type Store: ArtifactStore;

    async fn connect(&self, config: &RunConfig)
        -> Result<(Self::Source, Self::Store), PipelineError>;
}

/// MongoDB plus Google Drive.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveConnector;

impl Connector for LiveConnector {
    type Source = MongoSource;
    type Store = DriveClient;

    async fn connect(
        &self,
        config: &RunConfig,
    ) -> Result<(MongoSource, DriveClient), PipelineError> {
        let source = MongoSource::connect(&config.mongo_uri, &config.mongo_db).await?;
        let key = ServiceAccountKey::load(&config.credential)?;
        let store = DriveClient::connect(&key).await?;
        tracing::debug!(account = store.account(), "Authenticated to Drive");
        Ok((source, store))
    }
}

/// Gate then secret check. `Some` means the run stops here with that outcome.
pub fn preflight<F>(now: DateTime<Utc>, trigger: &TriggerConfig, lookup: F) -> Option<Outcome>
where
    F: Fn(&str) -> Option<String>,
{
    let gate = WindowGate::from_config(trigger);
    match gate.check(now) {
        GateDecision::Proceed { .. } => {}
        GateDecision::Skip { local_hour } if trigger.force_run => {
            tracing::warn!(
                local_hour,
                "FORCE_RUN set; running outside the {} window",
                gate.window_label()
            );
        }
        GateDecision::Skip { local_hour } => {
            tracing::info!(
                "Triggered outside the {} window (local hour {} in {}); skipping run",
                gate.window_label(),
                local_hour,
                gate.timezone()
            );
            return Some(Outcome::SkippedWrongWindow {
                local_hour,
                target_hour: gate.target_hour(),
            });
        }
    }

    let missing = missing_secrets(&trigger.required_secrets, lookup);
    if !missing.is_empty() {
        tracing::info!(
            "Secrets incomplete; skipping run (missing: {})",
            missing.join(", ")
        );
        return Some(Outcome::SkippedMissingSecrets { missing });
    }

    None
}

pub async fn invoke_with<F, C>(
    now: DateTime<Utc>,
    trigger: &TriggerConfig,
    lookup: F,
    overrides: &ConfigOverrides,
    connector: &C,
) -> Result<Outcome, PipelineError>
where
    F: Fn(&str) -> Option<String>,
    C: Connector,
{
    if let Some(skip) = preflight(now, trigger, &lookup) {
        return Ok(skip);
    }

    let config = RunConfig::resolve(overrides, &lookup)?;
    tracing::debug!(?config, "Resolved run configuration");
    tracing::info!(
        "Starting Nature Counter pipeline in {} mode (destination folder: {})",
        config.run_mode,
        config.drive_folder_id
    );

    let (source, store) = connector.connect(&config).await?;
    let report = pipeline::run(&config, &source, &store).await?;
    Ok(Outcome::Completed(report))
}

/// Production entry point: process environment, live services, one run id.
pub async fn invoke(now: DateTime<Utc>, trigger: &TriggerConfig) -> Result<Outcome, PipelineError> {
    let span = tracing::info_span!("run", run_id = %Uuid::new_v4());
    let result = invoke_with(
        now,
        trigger,
        env_lookup,
        &ConfigOverrides::default(),
        &LiveConnector,
    )
    .instrument(span)
    .await;

    if let Err(e) = &result {
        tracing::error!(code = e.code(), "{e}");
    }
    result
}
