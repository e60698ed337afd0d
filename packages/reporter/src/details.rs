//! Details entered in the last wizard step.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone as _, Utc};
use trail_map_trail_models::IssueCategory;

use crate::ReporterError;

/// What the user enters on the details step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDetails {
    /// Issue category.
    pub category: IssueCategory,
    /// When the issue was encountered.
    pub encountered_at: DateTime<Utc>,
    /// Free-form description, may be empty.
    pub details: String,
}

const FORM_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parses an encounter time.
///
/// Accepts RFC 3339 (`2022-03-10T14:30:00-05:00`) or a form-style value
/// without offset (`2022-03-10T14:30`), which is read as local time and
/// converted to UTC. A local time that falls in a daylight-saving gap is
/// rejected; one that occurs twice resolves to the earlier instant.
///
/// # Errors
///
/// Returns [`ReporterError::InvalidTimestamp`] if no format matches.
pub fn parse_encountered_at(value: &str) -> Result<DateTime<Utc>, ReporterError> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    FORM_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| ReporterError::InvalidTimestamp {
            value: value.to_string(),
        })
}
