use crate::config::QcConfig;
use crate::models::{
    count_duplicates, validity_ratio, ColumnRole, CoordinateKey, DerivedTimestamps, Issue,
    ObservationKey, PassPolicy, RawTabularRecordSet, SourceVerdict, ValidationProblem,
    VerdictScope,
};
use crate::processors::column_resolver::ColumnResolver;
use crate::processors::timestamp_deriver;
use crate::readers::TabularReader;
use chrono::NaiveDateTime;
use std::path::Path;
use tracing::{debug, info, warn};

/// Structural findings for one non-empty record set, shared by the per-file
/// and corpus checks
#[derive(Debug, Clone)]
pub(crate) struct StructuralScan {
    pub issues: Vec<Issue>,
    pub timestamps: DerivedTimestamps,
    /// Present only when both coordinate roles resolved and timestamps derived
    pub keys: Option<Vec<ObservationKey>>,
}

/// Required columns, coordinate roles and timestamp derivation, in that order
pub(crate) fn scan_structure(
    record_set: &RawTabularRecordSet,
    required_columns: &[String],
    resolver: &ColumnResolver,
) -> StructuralScan {
    let mut issues = Vec::new();

    let missing: Vec<String> = required_columns
        .iter()
        .filter(|name| !record_set.has_column(name))
        .cloned()
        .collect();
    if !missing.is_empty() {
        issues.push(Issue::MissingColumns { columns: missing });
    }

    let mut coordinates = Vec::with_capacity(2);
    for role in [ColumnRole::Latitude, ColumnRole::Longitude] {
        let resolution = resolver.resolve_role(record_set.columns(), role);
        if resolution.column.is_none() {
            issues.push(Issue::UnresolvedRole { role });
        }
        if let Some(ambiguity) = resolution.ambiguity {
            issues.push(ambiguity);
        }
        coordinates.push(resolution.column);
    }

    let timestamps = timestamp_deriver::derive(record_set);
    if !timestamps.is_derived() {
        issues.push(Issue::TimestampNotDerivable);
    }

    let keys = match (&coordinates[0], &coordinates[1], timestamps.series()) {
        (Some(lat), Some(lon), Some(series)) => {
            Some(observation_keys(record_set, lat, lon, series))
        }
        _ => None,
    };

    StructuralScan {
        issues,
        timestamps,
        keys,
    }
}

/// One key per row that has both coordinates and a parsed timestamp
pub(crate) fn observation_keys(
    record_set: &RawTabularRecordSet,
    latitude_column: &str,
    longitude_column: &str,
    series: &[Option<NaiveDateTime>],
) -> Vec<ObservationKey> {
    let (Some(lat_idx), Some(lon_idx)) = (
        record_set.column_index(latitude_column),
        record_set.column_index(longitude_column),
    ) else {
        return Vec::new();
    };

    record_set
        .rows()
        .iter()
        .zip(series)
        .filter_map(|(row, timestamp)| {
            Some(ObservationKey {
                latitude: CoordinateKey::parse(&row[lat_idx])?,
                longitude: CoordinateKey::parse(&row[lon_idx])?,
                timestamp: (*timestamp)?,
            })
        })
        .collect()
}

/// Checks one tabular source file on its own.
///
/// Missing columns and unresolved coordinate roles are advisory here; only
/// an empty source, underivable timestamps or a low validity ratio fail it.
pub struct SourceValidator {
    threshold: f64,
    required_columns: Vec<String>,
    resolver: ColumnResolver,
    policy: PassPolicy,
}

impl SourceValidator {
    pub fn new(config: &QcConfig) -> Self {
        Self {
            threshold: config.validity_threshold,
            required_columns: config.required_station_columns.clone(),
            resolver: ColumnResolver::with_strict_mode(config.strict_column_roles),
            policy: PassPolicy::per_file(),
        }
    }

    /// Validate a record set already loaded from `label`
    pub fn validate(&self, label: &str, record_set: &RawTabularRecordSet) -> SourceVerdict {
        if record_set.is_empty() {
            warn!("{}: file missing or empty", label);
            return self.unavailable(label, Issue::EmptySource);
        }

        let row_count = record_set.row_count();
        let scan = scan_structure(record_set, &self.required_columns, &self.resolver);
        let mut problems: Vec<ValidationProblem> =
            scan.issues.into_iter().map(ValidationProblem::new).collect();

        let valid_timestamp_count = scan.timestamps.valid_count();
        let ratio = validity_ratio(valid_timestamp_count, row_count);
        if ratio < self.threshold {
            problems.push(ValidationProblem::new(Issue::LowValidityRatio {
                ratio,
                threshold: self.threshold,
            }));
        }

        let duplicate_count = scan.keys.map_or(0, count_duplicates);
        if duplicate_count > 0 {
            problems.push(ValidationProblem::new(Issue::DuplicateObservations {
                count: duplicate_count,
            }));
        }

        for problem in &problems {
            debug!("{}: {}", label, problem);
        }

        let passed = self.policy.passes(&problems);
        info!(
            "{}: {} rows, {} valid timestamps, {} duplicates, passed={}",
            label, row_count, valid_timestamp_count, duplicate_count, passed
        );

        SourceVerdict {
            label: label.to_string(),
            scope: VerdictScope::Source,
            row_count,
            valid_timestamp_count,
            duplicate_count,
            problems,
            passed,
        }
    }

    /// Read and validate one file; read failures become a problem entry
    pub fn validate_file(&self, reader: &TabularReader, path: &Path) -> SourceVerdict {
        let label = file_label(path);
        match reader.read(path) {
            Ok(record_set) => self.validate(&label, &record_set),
            Err(e) => {
                warn!("{}: could not be read: {}", label, e);
                self.unavailable(
                    &label,
                    Issue::Unreadable {
                        reason: e.to_string(),
                    },
                )
            }
        }
    }

    fn unavailable(&self, label: &str, issue: Issue) -> SourceVerdict {
        let problems = vec![ValidationProblem::new(issue)];
        SourceVerdict {
            label: label.to_string(),
            scope: VerdictScope::Source,
            row_count: 0,
            valid_timestamp_count: 0,
            duplicate_count: 0,
            passed: self.policy.passes(&problems),
            problems,
        }
    }
}

/// File name used to tag problems, falling back to the full path
pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
