//! WARC-Date formatting

use chrono::{DateTime, Utc};

/// Length of a formatted WARC-Date value (`YYYY-MM-DDTHH:MM:SSZ`)
pub const WARC_DATE_LEN: usize = 20;

const WARC_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Current UTC time formatted for the WARC-Date header.
pub fn warc_timestamp() -> String {
    format_warc_date(&Utc::now())
}

/// Format `time` as a second-precision ISO 8601 UTC timestamp.
pub fn format_warc_date(time: &DateTime<Utc>) -> String {
    time.format(WARC_DATE_FORMAT).to_string()
}
