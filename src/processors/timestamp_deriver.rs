use crate::models::{ColumnRole, DerivedTimestamps, RawTabularRecordSet};
use crate::processors::column_resolver::ColumnRoleMap;
use crate::utils::numeric::zero_pad;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

/// Date-time layouts tried in order by [`parse_flexible`]
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y%m%d %H:%M:%S",
    "%Y%m%d %H:%M",
    "%Y%m%d%H%M",
];

/// Date-only layouts, read as midnight
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Parse a date/time string in any of the common layouts.
///
/// Offsets in RFC 3339 input are dropped and the wall-clock time kept.
pub fn parse_flexible(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| parse_date_hour(value))
        .or_else(|| parse_date(value).and_then(|date| date.and_hms_opt(0, 0, 0)))
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// A date followed by a bare one- or two-digit hour, e.g. `2024-06-30 14`
fn parse_date_hour(value: &str) -> Option<NaiveDateTime> {
    let (date, hour) = value.rsplit_once(' ')?;
    if hour.is_empty() || hour.len() > 2 || !hour.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    parse_date(date.trim())?.and_hms_opt(hour.parse().ok()?, 0, 0)
}

/// Produce one timestamp per row from whatever time columns a record set has.
///
/// Strategies, first applicable wins:
/// 1. a recognised composite column such as `Date/Time (LST)`
/// 2. `Year`, `Month`, `Day` plus a time-of-day column, zero-padded and joined
/// 3. nothing: [`DerivedTimestamps::NotDerivable`]
pub fn derive(record_set: &RawTabularRecordSet) -> DerivedTimestamps {
    let roles = ColumnRoleMap::resolve_all(record_set.columns());

    if let Some(column) = roles.get(ColumnRole::TimestampPrimary) {
        debug!("Deriving timestamps from composite column '{}'", column);
        if let Some(values) = record_set.column_values(column) {
            return DerivedTimestamps::Derived(values.map(parse_flexible).collect());
        }
    }

    if roles.has_calendar_parts() {
        if let (Some(year), Some(month), Some(day), Some(time)) = (
            roles.get(ColumnRole::Year).and_then(|c| record_set.column_index(c)),
            roles.get(ColumnRole::Month).and_then(|c| record_set.column_index(c)),
            roles.get(ColumnRole::Day).and_then(|c| record_set.column_index(c)),
            roles.get(ColumnRole::TimeOfDay).and_then(|c| record_set.column_index(c)),
        ) {
            debug!("Deriving timestamps from calendar columns");
            let series = record_set
                .rows()
                .iter()
                .map(|row| {
                    let synthesized = format!(
                        "{}-{}-{} {}",
                        zero_pad(&row[year], 4),
                        zero_pad(&row[month], 2),
                        zero_pad(&row[day], 2),
                        row[time].trim()
                    );
                    parse_flexible(&synthesized)
                })
                .collect();
            return DerivedTimestamps::Derived(series);
        }
    }

    DerivedTimestamps::NotDerivable
}
