/// Default artifact name inside the destination folder
pub const DEFAULT_OUTPUT_NAME: &str = "NC-DA-Journal-Data.xlsx";

/// Default service account key location when no inline JSON is given
pub const DEFAULT_SA_JSON_PATH: &str = "drive-sa.json";

/// Default Mongo database
pub const DEFAULT_MONGO_DB: &str = "NC_dev_db";

pub const JOURNALS_COLLECTION: &str = "journals";
pub const USERS_COLLECTION: &str = "userdetails";
pub const LOCATIONS_COLLECTION: &str = "locations";

/// Nightly window: 9 PM in Los Angeles
pub const DEFAULT_TARGET_TZ: chrono_tz::Tz = chrono_tz::America::Los_Angeles;
pub const DEFAULT_TARGET_HOUR: u32 = 21;
pub const DEFAULT_TARGET_TZ_LABEL: &str = "Pacific";

/// Secrets the scheduled job must see before it touches Mongo or Drive
pub const DEFAULT_REQUIRED_SECRETS: &[&str] = &["MONGO_URI", "DRIVE_FOLDER_ID", "DRIVE_SA_JSON"];

/// Upper bound for a single scheduled invocation (seconds)
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 1800;

/// Column order of the exported workbook
pub const FINAL_COLUMNS: [&str; 14] = [
    "journal_id",
    "User Name",
    "User email",
    "Timestamp",
    "End Date Time",
    "n_Name",
    "City",
    "State",
    "Zip",
    "Country",
    "n_Place",
    "n_Lati",
    "n_Long",
    "n_park_nbr",
];

/// US state and territory codes used by the country rule
pub const US_STATE_CODES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DC", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "MA", "MD", "ME", "MI", "MN", "MO", "MS", "MT", "NC", "ND", "NE", "NH", "NJ",
    "NM", "NV", "NY", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VA", "VT", "WA",
    "WI", "WV", "WY", "PR", "GU", "VI",
];

/// Spellings of the United States normalized to `USA`
pub const US_COUNTRY_ALIASES: &[&str] = &[
    "US",
    "USA",
    "U.S.",
    "UNITED STATES",
    "UNITED STATES OF AMERICA",
];

pub const XLSX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
pub const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";

/// Lifetime of the signed service account assertion (seconds)
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Decimal places kept for coordinates
pub const COORDINATE_DECIMALS: i32 = 6;
