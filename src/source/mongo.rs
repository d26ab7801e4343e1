use chrono::{DateTime, SecondsFormat, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Database};

use super::query::journal_pipeline;
use super::{JournalSource, SourceError};
use crate::constants::JOURNALS_COLLECTION;
use crate::cursor::SyncCursor;
use crate::model::RawJournal;

#[derive(Debug, Clone)]
pub struct MongoSource {
    client: Client,
    db: Database,
}

impl MongoSource {
    /// Parse the URI and build a client. No server round trip happens here;
    /// call [`JournalSource::ping`] for that.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, SourceError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| SourceError::Connect(e.to_string()))?;
        let db = client.database(db_name);
        Ok(Self { client, db })
    }
}

impl JournalSource for MongoSource {
    async fn ping(&self) -> Result<(), SourceError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|e| SourceError::Connect(e.to_string()))
    }

    async fn fetch(&self, cursor: Option<SyncCursor>) -> Result<Vec<RawJournal>, SourceError> {
        let docs: Vec<Document> = self
            .db
            .collection::<Document>(JOURNALS_COLLECTION)
            .aggregate(journal_pipeline(cursor))
            .await
            .map_err(|e| SourceError::Query(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| SourceError::Query(e.to_string()))?;

        Ok(docs.iter().map(raw_from_document).collect())
    }
}

pub fn raw_from_document(doc: &Document) -> RawJournal {
    RawJournal {
        journal_id: bson_text(doc.get("journal_id")),
        user_name: bson_text(doc.get("user_name")),
        user_email: bson_text(doc.get("user_email")),
        timestamp: bson_text(doc.get("start_time")),
        end_date_time: bson_text(doc.get("end_time")),
        location_name: bson_text(doc.get("location_name")),
        city: bson_text(doc.get("city")),
        state: bson_text(doc.get("state")),
        zip: bson_text(doc.get("zip")),
        location_country: bson_text(doc.get("location_country")),
        address: bson_text(doc.get("address")),
        place: bson_text(doc.get("place")),
        latitude: bson_number(doc.get("latitude")),
        longitude: bson_number(doc.get("longitude")),
        park_number: bson_text(doc.get("park_number")),
    }
}

/// Text form of a scalar. Datetimes become RFC 3339 in `isoformat` style.
pub fn bson_text(value: Option<&Bson>) -> String {
    match value {
        None | Some(Bson::Null) | Some(Bson::Undefined) => String::new(),
        Some(Bson::String(s)) => s.clone(),
        Some(Bson::Int32(i)) => i.to_string(),
        Some(Bson::Int64(i)) => i.to_string(),
        Some(Bson::Double(f)) => f.to_string(),
        Some(Bson::Boolean(b)) => b.to_string(),
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(Bson::DateTime(dt)) => DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis())
            .map(isoformat)
            .unwrap_or_default(),
        Some(other) => other.to_string(),
    }
}

/// `+00:00` offset, microseconds only when the instant has a fractional second.
fn isoformat(t: DateTime<Utc>) -> String {
    let precision = if t.timestamp_subsec_micros() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    t.to_rfc3339_opts(precision, false)
}

pub fn bson_number(value: Option<&Bson>) -> Option<f64> {
    let number = match value? {
        Bson::Double(f) => Some(*f),
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use mongodb::bson::DateTime as BsonDateTime;

    use super::*;

    #[test]
    fn datetimes_render_like_isoformat() {
        let dt = BsonDateTime::from_millis(1_714_582_800_123);
        assert_eq!(
            bson_text(Some(&Bson::DateTime(dt))),
            "2024-05-01T17:00:00.123000+00:00"
        );
    }

    #[test]
    fn whole_second_datetimes_have_no_fraction() {
        let dt = BsonDateTime::from_millis(1_714_582_800_000);
        assert_eq!(
            bson_text(Some(&Bson::DateTime(dt))),
            "2024-05-01T17:00:00+00:00"
        );
    }

    #[test]
    fn string_timestamps_pass_through() {
        let value = Bson::String("2024-05-01 10:00".to_string());
        assert_eq!(bson_text(Some(&value)), "2024-05-01 10:00");
        assert_eq!(bson_text(Some(&Bson::Null)), "");
        assert_eq!(bson_text(None), "");
    }

    #[test]
    fn numbers_accept_ints_doubles_and_numeric_strings() {
        assert_eq!(bson_number(Some(&Bson::Double(1.5))), Some(1.5));
        assert_eq!(bson_number(Some(&Bson::Int32(-3))), Some(-3.0));
        assert_eq!(bson_number(Some(&Bson::String(" 37.25 ".to_string()))), Some(37.25));
        assert_eq!(bson_number(Some(&Bson::String("north".to_string()))), None);
        assert_eq!(bson_number(Some(&Bson::Null)), None);
    }

    #[test]
    fn projected_document_maps_to_raw_journal() {
        let doc = doc! {
            "journal_id": "65a000000000000000000001",
            "start_time": BsonDateTime::from_millis(0),
            "end_time": Bson::Null,
            "user_name": "Ada",
            "user_email": "ada@example.org",
            "location_name": "Muir Woods",
            "city": "Mill Valley",
            "state": "CA",
            "zip": 94941,
            "location_country": "",
            "address": "",
            "place": "Muir Woods, Mill Valley CA",
            "latitude": 37.891,
            "longitude": "-122.5715",
            "park_number": 12,
        };
        let raw = raw_from_document(&doc);
        assert_eq!(raw.journal_id, "65a000000000000000000001");
        assert_eq!(raw.timestamp, "1970-01-01T00:00:00+00:00");
        assert_eq!(raw.end_date_time, "");
        assert_eq!(raw.zip, "94941");
        assert_eq!(raw.latitude, Some(37.891));
        assert_eq!(raw.longitude, Some(-122.5715));
        assert_eq!(raw.park_number, "12");
    }
}
