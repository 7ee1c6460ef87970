use serde::{Deserialize, Serialize};

/// Logical meaning of a column, independent of how a provider spells it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    Latitude,
    Longitude,
    TimestampPrimary,
    Year,
    Month,
    Day,
    TimeOfDay,
}

impl ColumnRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            ColumnRole::Latitude => "latitude",
            ColumnRole::Longitude => "longitude",
            ColumnRole::TimestampPrimary => "timestamp_primary",
            ColumnRole::Year => "year",
            ColumnRole::Month => "month",
            ColumnRole::Day => "day",
            ColumnRole::TimeOfDay => "time_of_day",
        }
    }
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
