use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use nc_pipeline::config::RunConfig;
use nc_pipeline::cursor::SyncCursor;
use nc_pipeline::drive::{ArtifactStore, DriveError, UploadReceipt};
use nc_pipeline::error::PipelineError;
use nc_pipeline::model::RawJournal;
use nc_pipeline::runner::Connector;
use nc_pipeline::source::{JournalSource, SourceError};

/// In-memory journals collection. Clones share state.
#[derive(Clone, Default)]
pub struct FakeSource {
    rows: Arc<Mutex<Vec<RawJournal>>>,
    fetches: Arc<Mutex<Vec<Option<SyncCursor>>>>,
    pings: Arc<Mutex<usize>>,
    ping_error: Option<String>,
}

impl FakeSource {
    pub fn with_rows(rows: Vec<RawJournal>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
            ..Self::default()
        }
    }

    pub fn unreachable(details: &str) -> Self {
        Self {
            ping_error: Some(details.to_string()),
            ..Self::default()
        }
    }

    pub fn insert(&self, row: RawJournal) {
        self.rows.lock().expect("rows lock").push(row);
    }

    /// Cursor argument of every fetch, in call order.
    pub fn fetches(&self) -> Vec<Option<SyncCursor>> {
        self.fetches.lock().expect("fetches lock").clone()
    }

    pub fn pings(&self) -> usize {
        *self.pings.lock().expect("pings lock")
    }
}

impl JournalSource for FakeSource {
    async fn ping(&self) -> Result<(), SourceError> {
        *self.pings.lock().expect("pings lock") += 1;
        match &self.ping_error {
            Some(details) => Err(SourceError::Connect(details.clone())),
            None => Ok(()),
        }
    }

    async fn fetch(&self, cursor: Option<SyncCursor>) -> Result<Vec<RawJournal>, SourceError> {
        self.fetches.lock().expect("fetches lock").push(cursor);
        let mut rows: Vec<RawJournal> = self
            .rows
            .lock()
            .expect("rows lock")
            .iter()
            .filter(|row| match cursor {
                None => true,
                Some(c) => SyncCursor::parse(&row.journal_id).is_some_and(|id| id > c),
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.journal_id.cmp(&b.journal_id));
        Ok(rows)
    }
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub folder_id: String,
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveCall {
    CheckFolder(String),
    Find(String, String),
    Download(String),
    Upload {
        folder_id: String,
        name: String,
        existing: Option<String>,
    },
}

/// In-memory Drive folder tree. Clones share state.
#[derive(Clone)]
pub struct FakeDrive {
    account: String,
    folders: Vec<String>,
    files: Arc<Mutex<HashMap<String, StoredFile>>>,
    calls: Arc<Mutex<Vec<DriveCall>>>,
    next_id: Arc<Mutex<u32>>,
}

impl FakeDrive {
    pub fn with_folder(folder_id: &str) -> Self {
        Self {
            account: "exporter@nc-pipeline-test.iam.gserviceaccount.com".to_string(),
            folders: vec![folder_id.to_string()],
            files: Arc::default(),
            calls: Arc::default(),
            next_id: Arc::default(),
        }
    }

    pub fn put(&self, folder_id: &str, name: &str, bytes: Vec<u8>) -> String {
        let id = self.allocate_id();
        self.files.lock().expect("files lock").insert(
            id.clone(),
            StoredFile {
                folder_id: folder_id.to_string(),
                name: name.to_string(),
                bytes,
            },
        );
        id
    }

    pub fn file(&self, file_id: &str) -> Option<StoredFile> {
        self.files.lock().expect("files lock").get(file_id).cloned()
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().expect("files lock").len()
    }

    pub fn calls(&self) -> Vec<DriveCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn uploads(&self) -> Vec<DriveCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, DriveCall::Upload { .. }))
            .collect()
    }

    fn allocate_id(&self) -> String {
        let mut next = self.next_id.lock().expect("id lock");
        *next += 1;
        format!("file-{next}")
    }

    fn record(&self, call: DriveCall) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

impl ArtifactStore for FakeDrive {
    async fn check_folder(&self, folder_id: &str) -> Result<(), DriveError> {
        self.record(DriveCall::CheckFolder(folder_id.to_string()));
        if self.folders.iter().any(|f| f == folder_id) {
            Ok(())
        } else {
            Err(DriveError::FolderNotAccessible {
                folder_id: folder_id.to_string(),
                account: self.account.clone(),
                details: "HTTP 404 - File not found".to_string(),
            })
        }
    }

    async fn find_file(&self, folder_id: &str, name: &str) -> Result<Option<String>, DriveError> {
        self.record(DriveCall::Find(folder_id.to_string(), name.to_string()));
        Ok(self
            .files
            .lock()
            .expect("files lock")
            .iter()
            .find(|(_, f)| f.folder_id == folder_id && f.name == name)
            .map(|(id, _)| id.clone()))
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, DriveError> {
        self.record(DriveCall::Download(file_id.to_string()));
        self.file(file_id).map(|f| f.bytes).ok_or_else(|| DriveError::Api {
            status: 404,
            message: format!("File not found: {file_id}"),
        })
    }

    async fn upload(
        &self,
        folder_id: &str,
        name: &str,
        existing: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<UploadReceipt, DriveError> {
        self.record(DriveCall::Upload {
            folder_id: folder_id.to_string(),
            name: name.to_string(),
            existing: existing.map(str::to_string),
        });

        match existing {
            Some(id) => {
                let mut files = self.files.lock().expect("files lock");
                let file = files.get_mut(id).ok_or_else(|| DriveError::Api {
                    status: 404,
                    message: format!("File not found: {id}"),
                })?;
                file.bytes = bytes;
                Ok(UploadReceipt {
                    file_id: id.to_string(),
                    created: false,
                })
            }
            None => Ok(UploadReceipt {
                file_id: self.put(folder_id, name, bytes),
                created: true,
            }),
        }
    }
}

/// Hands out clones of the fakes and counts how often it was asked to.
#[derive(Clone)]
pub struct FakeConnector {
    pub source: FakeSource,
    pub drive: FakeDrive,
    connects: Arc<Mutex<usize>>,
    token_error: Option<String>,
}

impl FakeConnector {
    pub fn new(source: FakeSource, drive: FakeDrive) -> Self {
        Self {
            source,
            drive,
            connects: Arc::default(),
            token_error: None,
        }
    }

    /// Every connect attempt fails the way a rejected token exchange does.
    pub fn rejecting_token(message: &str) -> Self {
        Self {
            token_error: Some(message.to_string()),
            ..Self::new(FakeSource::default(), FakeDrive::with_folder(""))
        }
    }

    pub fn connects(&self) -> usize {
        *self.connects.lock().expect("connects lock")
    }
}

impl Connector for FakeConnector {
    type Source = FakeSource;
    type Store = FakeDrive;

    async fn connect(
        &self,
        _config: &RunConfig,
    ) -> Result<(FakeSource, FakeDrive), PipelineError> {
        *self.connects.lock().expect("connects lock") += 1;
        if let Some(message) = &self.token_error {
            return Err(DriveError::Token {
                status: 400,
                message: message.clone(),
            }
            .into());
        }
        Ok((self.source.clone(), self.drive.clone()))
    }
}
