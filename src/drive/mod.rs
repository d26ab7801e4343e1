pub mod auth;
pub mod client;

use thiserror::Error;

pub use auth::ServiceAccountKey;
pub use client::DriveClient;

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("invalid service account key: {0}")]
    Credential(String),
    #[error("failed to read service account key {path}: {source}")]
    ReadKey {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to sign token assertion: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),
    #[error("token exchange failed: HTTP {status} - {message}")]
    Token { status: u16, message: String },
    #[error("Drive folder not accessible. Share {folder_id} with {account} (Editor). Details: {details}")]
    FolderNotAccessible {
        folder_id: String,
        account: String,
        details: String,
    },
    #[error("Drive API error: HTTP {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Drive request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub file_id: String,
    /// `false` when an existing file's content was replaced.
    pub created: bool,
}

/// Folder-scoped file storage holding the exported artifact.
#[allow(async_fn_in_trait)]
pub trait ArtifactStore {
    /// Fails with [`DriveError::FolderNotAccessible`] when the folder cannot be read.
    async fn check_folder(&self, folder_id: &str) -> Result<(), DriveError>;

    /// Id of the non-trashed file called `name` directly inside `folder_id`.
    async fn find_file(&self, folder_id: &str, name: &str) -> Result<Option<String>, DriveError>;

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, DriveError>;

    /// Replace `existing` in place, or create `name` in the folder.
    async fn upload(
        &self,
        folder_id: &str,
        name: &str,
        existing: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<UploadReceipt, DriveError>;
}
