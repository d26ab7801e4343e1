pub mod mongo;
pub mod query;

use thiserror::Error;

use crate::cursor::SyncCursor;
use crate::model::RawJournal;

pub use mongo::MongoSource;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Mongo connection failed. Check MONGO_URI. Details: {0}")]
    Connect(String),
    #[error("Mongo query failed: {0}")]
    Query(String),
}

/// Where journal rows come from.
#[allow(async_fn_in_trait)]
pub trait JournalSource {
    /// Cheap round trip proving the server is reachable and the credentials work.
    async fn ping(&self) -> Result<(), SourceError>;

    /// Finished journals, newer than `cursor` when one is given, sorted by id.
    async fn fetch(&self, cursor: Option<SyncCursor>) -> Result<Vec<RawJournal>, SourceError>;
}
