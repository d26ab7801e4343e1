use crate::constants::FINAL_COLUMNS;

/// One aggregated journal document as it comes out of the source query.
///
/// Nothing about the collection is enforced: missing fields arrive as empty
/// strings or `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawJournal {
    pub journal_id: String,
    pub user_name: String,
    pub user_email: String,
    pub timestamp: String,
    pub end_date_time: String,
    pub location_name: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub location_country: String,
    pub address: String,
    pub place: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub park_number: String,
}

/// A row of the exported workbook, in `FINAL_COLUMNS` order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JournalRow {
    pub journal_id: String,
    pub user_name: String,
    pub user_email: String,
    pub timestamp: String,
    pub end_date_time: String,
    pub n_name: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub n_place: String,
    pub n_lati: Option<f64>,
    pub n_long: Option<f64>,
    pub n_park_nbr: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(Option<f64>),
}

impl JournalRow {
    pub fn cells(&self) -> [Cell<'_>; FINAL_COLUMNS.len()] {
        [
            Cell::Text(&self.journal_id),
            Cell::Text(&self.user_name),
            Cell::Text(&self.user_email),
            Cell::Text(&self.timestamp),
            Cell::Text(&self.end_date_time),
            Cell::Text(&self.n_name),
            Cell::Text(&self.city),
            Cell::Text(&self.state),
            Cell::Text(&self.zip),
            Cell::Text(&self.country),
            Cell::Text(&self.n_place),
            Cell::Number(self.n_lati),
            Cell::Number(self.n_long),
            Cell::Text(&self.n_park_nbr),
        ]
    }

    /// Build a row from a column-name lookup; absent columns become empty.
    pub fn from_columns<F>(mut column: F) -> Self
    where
        F: FnMut(&str) -> String,
    {
        Self {
            journal_id: column("journal_id"),
            user_name: column("User Name"),
            user_email: column("User email"),
            timestamp: column("Timestamp"),
            end_date_time: column("End Date Time"),
            n_name: column("n_Name"),
            city: column("City"),
            state: column("State"),
            zip: column("Zip"),
            country: column("Country"),
            n_place: column("n_Place"),
            n_lati: parse_coordinate(&column("n_Lati")),
            n_long: parse_coordinate(&column("n_Long")),
            n_park_nbr: column("n_park_nbr"),
        }
    }
}

pub fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
