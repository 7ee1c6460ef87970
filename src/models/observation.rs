use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::hash::Hash;

/// Result of timestamp derivation for one record set.
///
/// `Derived` always holds exactly one entry per row; unparseable rows are
/// `None`, never dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedTimestamps {
    Derived(Vec<Option<NaiveDateTime>>),
    NotDerivable,
}

impl DerivedTimestamps {
    pub fn is_derived(&self) -> bool {
        matches!(self, DerivedTimestamps::Derived(_))
    }

    pub fn series(&self) -> Option<&[Option<NaiveDateTime>]> {
        match self {
            DerivedTimestamps::Derived(series) => Some(series),
            DerivedTimestamps::NotDerivable => None,
        }
    }

    /// Number of parsed entries; zero when nothing could be derived
    pub fn valid_count(&self) -> usize {
        self.series()
            .map_or(0, |series| series.iter().filter(|ts| ts.is_some()).count())
    }
}

/// Coordinate as used for duplicate detection: numeric values compare by
/// value (`45` equals `45.0`), anything else by its trimmed text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CoordinateKey {
    Numeric(u64),
    Text(String),
}

impl CoordinateKey {
    /// `None` for blank values, which exclude a row from duplicate analysis
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        match trimmed.parse::<f64>() {
            Ok(value) if value.is_nan() => None,
            // +0.0 and -0.0 must hash alike
            Ok(value) => Some(CoordinateKey::Numeric((value + 0.0).to_bits())),
            Err(_) => Some(CoordinateKey::Text(trimmed.to_string())),
        }
    }
}

/// (latitude, longitude, timestamp) identifying one real-world measurement
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObservationKey {
    pub latitude: CoordinateKey,
    pub longitude: CoordinateKey,
    pub timestamp: NaiveDateTime,
}

/// Every occurrence beyond the first of each repeated key:
/// `total - distinct`.
pub fn count_duplicates<K, I>(keys: I) -> usize
where
    K: Hash + Eq,
    I: IntoIterator<Item = K>,
{
    let mut seen = HashSet::new();
    let mut total = 0;
    for key in keys {
        total += 1;
        seen.insert(key);
    }
    total - seen.len()
}
