use crate::config::QcConfig;
use crate::models::{
    ColumnRole, IrradianceDocument, IrradianceObservation, RawTabularRecordSet,
    StationObservation,
};
use crate::processors::column_resolver::{find_measurement, resolve};
use crate::processors::document_validator::{distinct_timestamp_keys, parse_parameter_key};
use crate::processors::timestamp_deriver;
use crate::utils::constants::{
    PARAM_DIF, PARAM_DNI, PARAM_GHI, STATION_TEMP_COLUMN, STATION_WIND_COLUMN,
};
use crate::utils::numeric::parse_number;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use tracing::info;
use validator::Validate;

/// Row accounting for one normalization pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationStats {
    pub input_rows: usize,
    pub output_rows: usize,
    pub missing_timestamp: usize,
    pub missing_coordinates: usize,
    pub out_of_range: usize,
}

impl NormalizationStats {
    pub fn dropped(&self) -> usize {
        self.input_rows - self.output_rows
    }

    pub fn merge(&mut self, other: &NormalizationStats) {
        self.input_rows += other.input_rows;
        self.output_rows += other.output_rows;
        self.missing_timestamp += other.missing_timestamp;
        self.missing_coordinates += other.missing_coordinates;
        self.out_of_range += other.out_of_range;
    }
}

/// Convert a wall-clock time at a fixed offset to UTC
pub fn to_utc(local: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Maps validated sources onto the common `timestamp_utc, latitude,
/// longitude, ...` schema.
pub struct Normalizer {
    station_offset: FixedOffset,
    irradiance_offset: FixedOffset,
}

impl Normalizer {
    pub fn new(config: &QcConfig) -> Self {
        Self {
            station_offset: config.station_offset(),
            irradiance_offset: config.irradiance_offset(),
        }
    }

    pub fn normalize_station(
        &self,
        record_set: &RawTabularRecordSet,
    ) -> (Vec<StationObservation>, NormalizationStats) {
        let mut stats = NormalizationStats {
            input_rows: record_set.row_count(),
            ..Default::default()
        };

        let columns = record_set.columns();
        let index = |name: Option<String>| name.and_then(|n| record_set.column_index(&n));
        let lat_idx = index(resolve(columns, ColumnRole::Latitude));
        let lon_idx = index(resolve(columns, ColumnRole::Longitude));
        let temp_idx = index(find_measurement(columns, STATION_TEMP_COLUMN));
        let wind_idx = index(find_measurement(columns, STATION_WIND_COLUMN));

        let timestamps = timestamp_deriver::derive(record_set);
        let series = timestamps.series().unwrap_or_default();

        let mut records = Vec::with_capacity(record_set.row_count());
        for (row_idx, row) in record_set.rows().iter().enumerate() {
            let Some(timestamp_utc) = series
                .get(row_idx)
                .copied()
                .flatten()
                .and_then(|local| to_utc(local, self.station_offset))
            else {
                stats.missing_timestamp += 1;
                continue;
            };

            let cell = |idx: Option<usize>| idx.and_then(|i| parse_number(&row[i]));
            let (Some(latitude), Some(longitude)) = (cell(lat_idx), cell(lon_idx)) else {
                stats.missing_coordinates += 1;
                continue;
            };

            let record = StationObservation {
                timestamp_utc,
                latitude,
                longitude,
                air_temp_c: cell(temp_idx),
                wind_speed_kmh: cell(wind_idx),
            };

            if record.validate().is_err() {
                stats.out_of_range += 1;
                continue;
            }
            records.push(record);
        }

        stats.output_rows = records.len();
        info!(
            "Normalized {} of {} station rows",
            stats.output_rows, stats.input_rows
        );
        (records, stats)
    }

    /// One row per distinct parseable timestamp key; `-999.0` readings are
    /// absent
    pub fn normalize_irradiance(
        &self,
        document: &IrradianceDocument,
    ) -> (Vec<IrradianceObservation>, NormalizationStats) {
        let keys = distinct_timestamp_keys(document);
        let mut stats = NormalizationStats {
            input_rows: keys.len(),
            ..Default::default()
        };

        let Some((latitude, longitude)) = document.coordinate_pair() else {
            stats.missing_coordinates = keys.len();
            return (Vec::new(), stats);
        };

        let ghi = document.parameter(PARAM_GHI);
        let dni = document.parameter(PARAM_DNI);
        let dif = document.parameter(PARAM_DIF);

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(timestamp_utc) =
                parse_parameter_key(key).and_then(|local| to_utc(local, self.irradiance_offset))
            else {
                stats.missing_timestamp += 1;
                continue;
            };

            let record = IrradianceObservation {
                timestamp_utc,
                latitude,
                longitude,
                ghi_wm2: ghi.and_then(|s| s.reading(key)),
                dni_wm2: dni.and_then(|s| s.reading(key)),
                dif_wm2: dif.and_then(|s| s.reading(key)),
            };

            if record.validate().is_err() {
                stats.out_of_range += 1;
                continue;
            }
            records.push(record);
        }

        stats.output_rows = records.len();
        info!(
            "Normalized {} of {} irradiance timestamps",
            stats.output_rows, stats.input_rows
        );
        (records, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_station_rows_converted_to_utc() {
        let set = RawTabularRecordSet::new(
            strings(&["Longitude (x)", "Latitude (y)", "Date/Time (LST)", "Temp (ºC)", "Wind Spd (km/h)"]),
            vec![
                strings(&["-79.40", "43.67", "2024-06-30 19:00", "21.5", "12"]),
                strings(&["-79.40", "43.67", "bad", "21.0", "10"]),
                strings(&["", "43.67", "2024-06-30 21:00", "20.0", ""]),
                strings(&["-79.40", "43.67", "2024-06-30 22:00", "", ""]),
            ],
        );
        let (records, stats) = Normalizer::new(&QcConfig::default()).normalize_station(&set);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp_utc, Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap());
        assert_eq!(records[0].air_temp_c, Some(21.5));
        assert_eq!(records[0].wind_speed_kmh, Some(12.0));
        assert_eq!(records[1].air_temp_c, None);
        assert_eq!(
            stats,
            NormalizationStats {
                input_rows: 4,
                output_rows: 2,
                missing_timestamp: 1,
                missing_coordinates: 1,
                out_of_range: 0,
            }
        );
        assert_eq!(stats.dropped(), 2);
    }

    #[test]
    fn test_station_out_of_range_coordinates_dropped() {
        let set = RawTabularRecordSet::new(
            strings(&["Date/Time (LST)", "lat", "lon"]),
            vec![strings(&["2024-06-30 00:00", "95.0", "10.0"])],
        );
        let (records, stats) = Normalizer::new(&QcConfig::default()).normalize_station(&set);
        assert!(records.is_empty());
        assert_eq!(stats.out_of_range, 1);
    }

    #[test]
    fn test_irradiance_sentinel_is_absent() {
        let doc: IrradianceDocument = serde_json::from_str(
            r#"{"geometry": {"coordinates": [-79.4, 43.7, 100.0]},
                "properties": {"parameter": {
                    "ALLSKY_SFC_SW_DWN": {"2024063012": 812.5, "2024063013": -999.0},
                    "ALLSKY_SFC_SW_DNI": {"2024063012": 640.0},
                    "ALLSKY_SFC_SW_DIFF": {"2024063012": 150.25, "2024063013": 140.0}}}}"#,
        )
        .unwrap();

        let (records, stats) = Normalizer::new(&QcConfig::default()).normalize_irradiance(&doc);

        assert_eq!(stats.input_rows, 2);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].latitude, 43.7);
        assert_eq!(records[0].longitude, -79.4);
        assert_eq!(records[0].ghi_wm2, Some(812.5));
        assert_eq!(records[0].timestamp_utc, Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap());
        assert_eq!(records[1].ghi_wm2, None);
        assert_eq!(records[1].dni_wm2, None);
        assert_eq!(records[1].dif_wm2, Some(140.0));
    }

    #[test]
    fn test_irradiance_without_coordinates() {
        let doc: IrradianceDocument = serde_json::from_str(
            r#"{"properties": {"parameter": {"ALLSKY_SFC_SW_DWN": {"2024063012": 812.5}}}}"#,
        )
        .unwrap();
        let (records, stats) = Normalizer::new(&QcConfig::default()).normalize_irradiance(&doc);
        assert!(records.is_empty());
        assert_eq!(stats.missing_coordinates, 1);
    }

    #[test]
    fn test_to_utc() {
        let local = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(
            to_utc(local, offset),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 5, 0, 0).unwrap())
        );
    }
}
