use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};

use nc_pipeline::config::{CredentialSource, RunConfig, RunMode};
use nc_pipeline::constants::DEFAULT_OUTPUT_NAME;
use nc_pipeline::model::RawJournal;

pub const FOLDER_ID: &str = "1NcDriveFolder";
pub const SERVICE_ACCOUNT_JSON: &str = include_str!("../fixtures/test_service_account.json");

/// 21:00 in Los Angeles (PDT).
pub fn pacific_nine_pm() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 2, 4, 0, 0).unwrap()
}

/// 14:00 in Los Angeles (PDT).
pub fn pacific_afternoon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 21, 0, 0).unwrap()
}

/// Journal id `65a0000000000000000000NN`.
pub fn journal_id(n: u8) -> String {
    format!("65a0000000000000000000{n:02x}")
}

pub fn raw_journal(n: u8) -> RawJournal {
    RawJournal {
        journal_id: journal_id(n),
        user_name: format!("Walker {n}"),
        user_email: format!("walker{n}@example.org"),
        timestamp: "2024-05-01T17:00:00.000000+00:00".to_string(),
        end_date_time: "2024-05-01T17:45:00.000000+00:00".to_string(),
        location_name: "Muir Woods".to_string(),
        city: "Mill Valley".to_string(),
        state: "CA".to_string(),
        zip: "94941".to_string(),
        location_country: String::new(),
        address: "1 Muir Woods Rd, Mill Valley, CA".to_string(),
        place: "Muir Woods,  Mill Valley   CA".to_string(),
        latitude: Some(37.891_234_56),
        longitude: Some(-122.571_543_21),
        park_number: "12".to_string(),
    }
}

pub fn run_config(mode: RunMode) -> RunConfig {
    RunConfig {
        mongo_uri: "mongodb://localhost:27017".to_string(),
        mongo_db: "NC_dev_db".to_string(),
        drive_folder_id: FOLDER_ID.to_string(),
        credential: CredentialSource::Inline(SERVICE_ACCOUNT_JSON.to_string()),
        output_name: DEFAULT_OUTPUT_NAME.to_string(),
        run_mode: mode,
    }
}

/// Environment with every default secret set.
pub fn complete_env() -> HashMap<String, String> {
    [
        ("MONGO_URI", "mongodb://localhost:27017"),
        ("DRIVE_FOLDER_ID", FOLDER_ID),
        ("DRIVE_SA_JSON", SERVICE_ACCOUNT_JSON),
        ("RUN_MODE", "inc"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
