use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One hourly climate-station observation in the common schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StationObservation {
    pub timestamp_utc: DateTime<Utc>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    pub air_temp_c: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
}

/// One hourly satellite irradiance observation in the common schema (W/m²)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct IrradianceObservation {
    pub timestamp_utc: DateTime<Utc>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    pub ghi_wm2: Option<f64>,
    pub dni_wm2: Option<f64>,
    pub dif_wm2: Option<f64>,
}

/// A normalized table ready for loading
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedBatch {
    Station(Vec<StationObservation>),
    Irradiance(Vec<IrradianceObservation>),
}

impl NormalizedBatch {
    pub fn len(&self) -> usize {
        match self {
            NormalizedBatch::Station(records) => records.len(),
            NormalizedBatch::Irradiance(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column names in output order
    pub fn column_names(&self) -> &'static [&'static str] {
        match self {
            NormalizedBatch::Station(_) => &[
                "timestamp_utc",
                "latitude",
                "longitude",
                "air_temp_c",
                "wind_speed_kmh",
            ],
            NormalizedBatch::Irradiance(_) => &[
                "timestamp_utc",
                "latitude",
                "longitude",
                "ghi_wm2",
                "dni_wm2",
                "dif_wm2",
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_coordinate_validation() {
        let mut obs = StationObservation {
            timestamp_utc: Utc.with_ymd_and_hms(2024, 6, 30, 5, 0, 0).unwrap(),
            latitude: 43.67,
            longitude: -79.4,
            air_temp_c: Some(21.3),
            wind_speed_kmh: None,
        };
        assert!(obs.validate().is_ok());

        obs.latitude = 91.0;
        assert!(obs.validate().is_err());
    }

    #[test]
    fn test_batch_shape() {
        let batch = NormalizedBatch::Irradiance(vec![]);
        assert!(batch.is_empty());
        assert_eq!(batch.column_names()[0], "timestamp_utc");
        assert_eq!(batch.column_names().len(), 6);
    }
}
