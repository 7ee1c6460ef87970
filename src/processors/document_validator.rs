use crate::config::QcConfig;
use crate::models::{
    validity_ratio, Issue, IrradianceDocument, PassPolicy, SourceVerdict, ValidationProblem,
    VerdictScope,
};
use crate::processors::source_validator::file_label;
use crate::readers::IrradianceReader;
use crate::utils::constants::PARAMETER_KEY_LEN;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Parse a `YYYYMMDDHH` parameter key
pub fn parse_parameter_key(key: &str) -> Option<NaiveDateTime> {
    if key.len() != PARAMETER_KEY_LEN || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let date = NaiveDate::parse_from_str(&key[..8], "%Y%m%d").ok()?;
    let hour = key[8..].parse::<u32>().ok()?;
    date.and_hms_opt(hour, 0, 0)
}

/// Every timestamp key of every parameter series, in document order,
/// repeats included
pub fn all_timestamp_keys(document: &IrradianceDocument) -> Vec<&str> {
    document
        .parameters()
        .iter()
        .flat_map(|(_, series)| series.keys())
        .collect()
}

/// Distinct timestamp keys in first-seen order
pub fn distinct_timestamp_keys(document: &IrradianceDocument) -> Vec<&str> {
    let mut seen = HashSet::new();
    all_timestamp_keys(document)
        .into_iter()
        .filter(|key| seen.insert(*key))
        .collect()
}

/// Checks one irradiance document.
///
/// Rows are the distinct timestamp keys across all parameter series. Missing
/// coordinates and parameters are advisory; only the validity ratio gates.
pub struct DocumentValidator {
    threshold: f64,
    required_parameters: Vec<String>,
    policy: PassPolicy,
}

impl DocumentValidator {
    pub fn new(config: &QcConfig) -> Self {
        Self {
            threshold: config.validity_threshold,
            required_parameters: config.required_parameters.clone(),
            policy: PassPolicy::document(),
        }
    }

    pub fn validate(&self, label: &str, document: &IrradianceDocument) -> SourceVerdict {
        let mut problems = Vec::new();

        if document.coordinate_pair().is_none() {
            problems.push(ValidationProblem::new(Issue::MissingGeometry));
        }

        let missing: Vec<String> = self
            .required_parameters
            .iter()
            .filter(|name| document.parameter(name).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            problems.push(ValidationProblem::new(Issue::MissingParameters {
                parameters: missing,
            }));
        }

        let all_keys = all_timestamp_keys(document);
        let distinct = distinct_timestamp_keys(document);
        let row_count = distinct.len();
        let valid_timestamp_count = distinct
            .iter()
            .filter(|key| parse_parameter_key(key).is_some())
            .count();

        let ratio = validity_ratio(valid_timestamp_count, row_count);
        if ratio < self.threshold {
            problems.push(ValidationProblem::new(Issue::LowValidityRatio {
                ratio,
                threshold: self.threshold,
            }));
        }

        let duplicate_count = all_keys.len() - distinct.len();
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
            "{}: {} timestamp keys, {} valid, {} duplicates, passed={}",
            label, row_count, valid_timestamp_count, duplicate_count, passed
        );

        SourceVerdict {
            label: label.to_string(),
            scope: VerdictScope::Document,
            row_count,
            valid_timestamp_count,
            duplicate_count,
            problems,
            passed,
        }
    }

    /// Read and validate one document; read failures become problem entries
    /// and a zero ratio
    pub fn validate_file(&self, reader: &IrradianceReader, path: &Path) -> SourceVerdict {
        let label = file_label(path);
        let issue = match reader.read(path) {
            Ok(Some(document)) => return self.validate(&label, &document),
            Ok(None) => Issue::EmptySource,
            Err(e) => Issue::Unreadable {
                reason: e.to_string(),
            },
        };

        warn!("{}: {}", label, issue);
        let problems = vec![
            ValidationProblem::new(issue),
            ValidationProblem::new(Issue::LowValidityRatio {
                ratio: 0.0,
                threshold: self.threshold,
            }),
        ];

        SourceVerdict {
            label,
            scope: VerdictScope::Document,
            row_count: 0,
            valid_timestamp_count: 0,
            duplicate_count: 0,
            passed: self.policy.passes(&problems),
            problems,
        }
    }
}
