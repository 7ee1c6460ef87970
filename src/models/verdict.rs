use crate::models::{Issue, ProblemCategory, ValidationProblem};
use serde::{Deserialize, Serialize};

/// What a verdict was computed over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictScope {
    /// One tabular file
    Source,
    /// Every file of a directory, counts pooled
    Corpus { files: usize },
    /// One irradiance document; rows are distinct timestamp keys
    Document,
}

/// Outcome of validating one source, one corpus or one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: String,
    pub scope: VerdictScope,
    pub row_count: usize,
    pub valid_timestamp_count: usize,
    pub duplicate_count: usize,
    pub problems: Vec<ValidationProblem>,
    pub passed: bool,
}

pub type SourceVerdict = Verdict;
pub type CorpusVerdict = Verdict;

impl Verdict {
    /// Valid timestamps over total rows; zero rows gives 0.0
    pub fn ratio(&self) -> f64 {
        validity_ratio(self.valid_timestamp_count, self.row_count)
    }

    pub fn has_problem(&self, category: ProblemCategory) -> bool {
        self.problems.iter().any(|p| p.category() == category)
    }
}

pub fn validity_ratio(valid: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        valid as f64 / total as f64
    }
}

/// Which problem categories force `passed = false`.
///
/// The three validators deliberately disagree: the per-file checker fails on
/// unreadable sources and underivable timestamps as well as the ratio, while
/// the corpus and document checkers judge the ratio alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassPolicy {
    gating: Vec<ProblemCategory>,
}

impl PassPolicy {
    pub fn per_file() -> Self {
        Self {
            gating: vec![
                ProblemCategory::SourceUnavailable,
                ProblemCategory::TimestampDerivationFailure,
                ProblemCategory::LowValidityRatio,
            ],
        }
    }

    pub fn corpus(gate_on_schema_mismatch: bool) -> Self {
        let mut gating = vec![ProblemCategory::LowValidityRatio];
        if gate_on_schema_mismatch {
            gating.push(ProblemCategory::SchemaMismatch);
        }
        Self { gating }
    }

    pub fn document() -> Self {
        Self {
            gating: vec![ProblemCategory::LowValidityRatio],
        }
    }

    pub fn gates(&self, category: ProblemCategory) -> bool {
        self.gating.contains(&category)
    }

    /// Column-role ambiguity is advisory under every policy
    pub fn gates_issue(&self, issue: &Issue) -> bool {
        !matches!(issue, Issue::AmbiguousRole { .. }) && self.gates(issue.category())
    }

    pub fn passes(&self, problems: &[ValidationProblem]) -> bool {
        !problems.iter().any(|p| self.gates_issue(&p.issue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColumnRole;

    fn problems(issues: Vec<Issue>) -> Vec<ValidationProblem> {
        issues.into_iter().map(ValidationProblem::new).collect()
    }

    #[test]
    fn test_ratio_of_zero_rows_is_zero() {
        assert_eq!(validity_ratio(0, 0), 0.0);
        assert_eq!(validity_ratio(9, 10), 0.9);
    }

    #[test]
    fn test_per_file_policy() {
        let policy = PassPolicy::per_file();
        assert!(policy.passes(&problems(vec![
            Issue::MissingColumns {
                columns: vec!["Temp (°C)".to_string()]
            },
            Issue::DuplicateObservations { count: 2 },
        ])));
        assert!(!policy.passes(&problems(vec![Issue::EmptySource])));
        assert!(!policy.passes(&problems(vec![Issue::TimestampNotDerivable])));
    }

    #[test]
    fn test_corpus_policy() {
        let lenient = PassPolicy::corpus(false);
        let strict = PassPolicy::corpus(true);
        let schema = problems(vec![Issue::MissingColumns {
            columns: vec!["Year".to_string()],
        }]);

        assert!(lenient.passes(&schema));
        assert!(!strict.passes(&schema));
        // unreadable files only reduce the pooled counts
        assert!(lenient.passes(&problems(vec![Issue::EmptySource])));
        assert!(!lenient.passes(&problems(vec![Issue::LowValidityRatio {
            ratio: 0.5,
            threshold: 0.9
        }])));
    }

    #[test]
    fn test_ambiguous_role_never_gates() {
        let ambiguous = problems(vec![Issue::AmbiguousRole {
            role: ColumnRole::Latitude,
            candidates: vec!["Latitude (y)".to_string(), "lat_grid".to_string()],
        }]);
        let unresolved = problems(vec![Issue::UnresolvedRole {
            role: ColumnRole::Longitude,
        }]);

        assert!(PassPolicy::corpus(true).passes(&ambiguous));
        assert!(PassPolicy::per_file().passes(&ambiguous));
        assert!(!PassPolicy::corpus(true).passes(&unresolved));
    }

    #[test]
    fn test_document_policy() {
        let policy = PassPolicy::document();
        assert!(policy.passes(&problems(vec![
            Issue::MissingGeometry,
            Issue::MissingParameters {
                parameters: vec!["ALLSKY_SFC_SW_DWN".to_string()]
            },
            Issue::DuplicateObservations { count: 1 },
        ])));
        assert!(!policy.gates(ProblemCategory::SourceUnavailable));
    }
}
