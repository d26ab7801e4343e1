//! Incremental watermark.
//!
//! The cursor is not stored by this process. It is recomputed on every run as
//! the greatest journal ObjectId already present in the exported artifact, so
//! the artifact in Drive is the single durable record of sync progress.

use std::fmt;

use mongodb::bson::oid::ObjectId;

use crate::model::JournalRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyncCursor(ObjectId);

impl SyncCursor {
    pub fn new(id: ObjectId) -> Self {
        Self(id)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        ObjectId::parse_str(raw.trim()).ok().map(Self)
    }

    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl fmt::Display for SyncCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

/// Greatest parseable journal id; rows with other ids are ignored.
pub fn watermark(rows: &[JournalRow]) -> Option<SyncCursor> {
    rows.iter()
        .filter_map(|row| SyncCursor::parse(&row.journal_id))
        .max()
}
