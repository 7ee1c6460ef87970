use crate::models::ColumnRole;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error taxonomy used to decide which problems gate a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProblemCategory {
    SourceUnavailable,
    SchemaMismatch,
    TimestampDerivationFailure,
    LowValidityRatio,
    DuplicateObservations,
}

/// One defect found while checking a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Issue {
    /// Zero bytes or zero rows
    EmptySource,
    /// The source exists but could not be read or parsed
    Unreadable { reason: String },
    /// A directory yielded no files to check
    NoSources { location: String },
    MissingColumns { columns: Vec<String> },
    UnresolvedRole { role: ColumnRole },
    AmbiguousRole { role: ColumnRole, candidates: Vec<String> },
    MissingGeometry,
    MissingParameters { parameters: Vec<String> },
    TimestampNotDerivable,
    LowValidityRatio { ratio: f64, threshold: f64 },
    DuplicateObservations { count: usize },
}

impl Issue {
    pub fn category(&self) -> ProblemCategory {
        match self {
            Issue::EmptySource | Issue::Unreadable { .. } | Issue::NoSources { .. } => {
                ProblemCategory::SourceUnavailable
            }
            Issue::MissingColumns { .. }
            | Issue::UnresolvedRole { .. }
            | Issue::AmbiguousRole { .. }
            | Issue::MissingGeometry
            | Issue::MissingParameters { .. } => ProblemCategory::SchemaMismatch,
            Issue::TimestampNotDerivable => ProblemCategory::TimestampDerivationFailure,
            Issue::LowValidityRatio { .. } => ProblemCategory::LowValidityRatio,
            Issue::DuplicateObservations { .. } => ProblemCategory::DuplicateObservations,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::EmptySource => write!(f, "file missing or empty"),
            Issue::Unreadable { reason } => write!(f, "file could not be read: {}", reason),
            Issue::NoSources { location } => write!(f, "no source files found in {}", location),
            Issue::MissingColumns { columns } => {
                write!(f, "missing required columns: {}", columns.join(", "))
            }
            Issue::UnresolvedRole { role } => write!(f, "no {} column found", role),
            Issue::AmbiguousRole { role, candidates } => write!(
                f,
                "ambiguous {} column, using '{}' out of: {}",
                role,
                candidates.first().map(String::as_str).unwrap_or(""),
                candidates.join(", ")
            ),
            Issue::MissingGeometry => write!(f, "document has no coordinate pair"),
            Issue::MissingParameters { parameters } => {
                write!(f, "missing required parameters: {}", parameters.join(", "))
            }
            Issue::TimestampNotDerivable => write!(f, "timestamp could not be derived"),
            Issue::LowValidityRatio { ratio, threshold } => write!(
                f,
                "valid timestamp ratio {} is below threshold {}",
                format_percent(*ratio),
                format_percent(*threshold)
            ),
            Issue::DuplicateObservations { count } => {
                write!(f, "{} duplicate observations", count)
            }
        }
    }
}

/// A defect plus the file it came from, when checked as part of a corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationProblem {
    pub origin: Option<String>,
    pub issue: Issue,
}

impl ValidationProblem {
    pub fn new(issue: Issue) -> Self {
        Self {
            origin: None,
            issue,
        }
    }

    pub fn from_file(origin: impl Into<String>, issue: Issue) -> Self {
        Self {
            origin: Some(origin.into()),
            issue,
        }
    }

    pub fn category(&self) -> ProblemCategory {
        self.issue.category()
    }
}

impl fmt::Display for ValidationProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Some(origin) => write!(f, "[{}] {}", origin, self.issue),
            None => write!(f, "{}", self.issue),
        }
    }
}

/// Ratio as a percentage with one decimal place, e.g. `80.0%`
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}
