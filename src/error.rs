use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::config::ConfigError;
use crate::drive::DriveError;
use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Drive(#[from] DriveError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Source(_) => "SOURCE_ERROR",
            Self::Drive(_) => "DRIVE_ERROR",
            Self::Artifact(_) => "ARTIFACT_ERROR",
        }
    }
}
