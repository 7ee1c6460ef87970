use crate::config::QcConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{
    count_duplicates, validity_ratio, CorpusVerdict, Issue, ObservationKey, PassPolicy,
    ValidationProblem, VerdictScope,
};
use crate::processors::column_resolver::ColumnResolver;
use crate::processors::source_validator::{file_label, scan_structure};
use crate::readers::TabularReader;
use crate::utils::progress::ProgressReporter;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Running totals over a corpus. Only ever added to.
#[derive(Debug, Default)]
struct PooledTotals {
    row_count: usize,
    valid_timestamp_count: usize,
    keys: Vec<ObservationKey>,
    problems: Vec<ValidationProblem>,
}

/// Validates every station file of a directory as one pooled dataset.
///
/// Rows, valid timestamps and observation keys from all readable files are
/// pooled before the ratio and duplicate count are computed, so duplicates
/// spanning two files are caught. A bad file contributes a tagged problem
/// and zero rows; it never stops the run.
pub struct CorpusAggregator {
    threshold: f64,
    required_columns: Vec<String>,
    extension: String,
    resolver: ColumnResolver,
    policy: PassPolicy,
    reader: TabularReader,
}

impl CorpusAggregator {
    pub fn new(config: &QcConfig) -> Self {
        Self {
            threshold: config.validity_threshold,
            required_columns: config.required_station_columns.clone(),
            extension: config.station_file_extension.clone(),
            resolver: ColumnResolver::with_strict_mode(config.strict_column_roles),
            policy: PassPolicy::corpus(config.corpus_gates_on_schema_mismatch),
            reader: TabularReader::new(),
        }
    }

    /// Station files in `dir`, sorted by file name
    pub fn discover_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(ProcessingError::InvalidFormat(format!(
                "Path is not a directory: {}",
                dir.display()
            )));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let matches_extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension));

            if path.is_file() && matches_extension {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        debug!("Found {} station files in {}", files.len(), dir.display());
        Ok(files)
    }

    /// Validate every station file in `dir`
    pub fn validate_corpus(
        &self,
        dir: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<CorpusVerdict> {
        let files = self.discover_files(dir)?;
        Ok(self.validate_files(&dir.display().to_string(), &files, progress))
    }

    /// Validate an explicit, already ordered list of files as one corpus
    pub fn validate_files(
        &self,
        label: &str,
        files: &[PathBuf],
        progress: Option<&ProgressReporter>,
    ) -> CorpusVerdict {
        let mut totals = PooledTotals::default();

        if files.is_empty() {
            warn!("No station files found in {}", label);
            totals.problems.push(ValidationProblem::new(Issue::NoSources {
                location: label.to_string(),
            }));
        }

        for path in files {
            self.accumulate_file(path, &mut totals);
            if let Some(progress) = progress {
                progress.increment(1);
            }
        }

        self.finish(label, files.len(), totals)
    }

    fn accumulate_file(&self, path: &Path, totals: &mut PooledTotals) {
        let name = file_label(path);

        let record_set = match self.reader.read(path) {
            Ok(record_set) => record_set,
            Err(e) => {
                warn!("{}: could not be read: {}", name, e);
                totals.problems.push(ValidationProblem::from_file(
                    &name,
                    Issue::Unreadable {
                        reason: e.to_string(),
                    },
                ));
                return;
            }
        };

        if record_set.is_empty() {
            warn!("{}: file missing or empty", name);
            totals
                .problems
                .push(ValidationProblem::from_file(&name, Issue::EmptySource));
            return;
        }

        let scan = scan_structure(&record_set, &self.required_columns, &self.resolver);
        let valid = scan.timestamps.valid_count();
        debug!(
            "{}: {} rows, {} valid timestamps, {} issues",
            name,
            record_set.row_count(),
            valid,
            scan.issues.len()
        );

        totals.row_count += record_set.row_count();
        totals.valid_timestamp_count += valid;
        if let Some(keys) = scan.keys {
            totals.keys.extend(keys);
        }
        totals.problems.extend(
            scan.issues
                .into_iter()
                .map(|issue| ValidationProblem::from_file(&name, issue)),
        );
    }

    fn finish(&self, label: &str, file_count: usize, totals: PooledTotals) -> CorpusVerdict {
        let PooledTotals {
            row_count,
            valid_timestamp_count,
            keys,
            mut problems,
        } = totals;

        let ratio = validity_ratio(valid_timestamp_count, row_count);
        if ratio < self.threshold {
            problems.push(ValidationProblem::new(Issue::LowValidityRatio {
                ratio,
                threshold: self.threshold,
            }));
        }

        let duplicate_count = count_duplicates(keys);
        if duplicate_count > 0 {
            problems.push(ValidationProblem::new(Issue::DuplicateObservations {
                count: duplicate_count,
            }));
        }

        let passed = self.policy.passes(&problems);
        info!(
            "Corpus {}: {} files, {} rows, {} valid timestamps, {} duplicates, passed={}",
            label, file_count, row_count, valid_timestamp_count, duplicate_count, passed
        );

        CorpusVerdict {
            label: label.to_string(),
            scope: VerdictScope::Corpus { files: file_count },
            row_count,
            valid_timestamp_count,
            duplicate_count,
            problems,
            passed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnRole, ProblemCategory};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const HEADER: &str = "Date/Time (LST),Latitude (y),Longitude (x),Temp (°C)";

    fn config() -> QcConfig {
        QcConfig::default().with_required_station_columns([
            "Date/Time (LST)",
            "Latitude (y)",
            "Longitude (x)",
            "Temp (°C)",
        ])
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_files_sorted_and_filtered() -> Result<()> {
        let dir = TempDir::new()?;
        write(&dir, "b.csv", HEADER);
        write(&dir, "a.CSV", HEADER);
        write(&dir, "notes.txt", "ignore me");
        fs::create_dir(dir.path().join("sub.csv"))?;

        let files = CorpusAggregator::new(&config()).discover_files(dir.path())?;
        let names: Vec<String> = files.iter().map(|p| file_label(p)).collect();
        assert_eq!(names, vec!["a.CSV", "b.csv"]);
        Ok(())
    }

    #[test]
    fn test_missing_directory_is_error() {
        let result = CorpusAggregator::new(&config()).validate_corpus(Path::new("/nonexistent/dir"), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_files_do_not_abort_the_run() -> Result<()> {
        let dir = TempDir::new()?;
        let missing = dir.path().join("00_missing.csv");
        let empty = write(&dir, "01_empty.csv", "");
        let good = write(
            &dir,
            "02_good.csv",
            &format!("{}\n2024-06-30 00:00,43.6,-79.4,20.0\n2024-06-30 01:00,43.6,-79.4,19.0\n", HEADER),
        );

        let verdict = CorpusAggregator::new(&config()).validate_files("corpus", &[missing, empty, good], None);

        assert_eq!(verdict.scope, VerdictScope::Corpus { files: 3 });
        assert_eq!(verdict.row_count, 2);
        assert_eq!(verdict.valid_timestamp_count, 2);
        assert_eq!(verdict.problems.len(), 2);
        assert_eq!(verdict.problems[0].origin.as_deref(), Some("00_missing.csv"));
        assert_eq!(verdict.problems[0].category(), ProblemCategory::SourceUnavailable);
        assert_eq!(
            verdict.problems[1],
            ValidationProblem::from_file("01_empty.csv", Issue::EmptySource)
        );
        // unavailable files shrink the pool but do not gate the corpus
        assert!(verdict.passed);
        Ok(())
    }

    #[test]
    fn test_pooled_ratio_decides() -> Result<()> {
        let dir = TempDir::new()?;
        // one poor file (1 of 2 valid) among good ones: 19 of 20 pooled
        let good: String = (0..9)
            .map(|h| format!("2024-06-30 {:02}:00,43.6,-79.4,20.0\n", h))
            .collect();
        write(&dir, "a.csv", &format!("{}\n{}", HEADER, good));
        write(
            &dir,
            "b.csv",
            &format!("{}\n{}", HEADER, good.replace("2024-06-30", "2024-07-01")),
        );
        write(
            &dir,
            "c.csv",
            &format!("{}\n2024-07-02 00:00,43.6,-79.4,1\nbad,43.6,-79.4,1\n", HEADER),
        );

        let verdict = CorpusAggregator::new(&config()).validate_corpus(dir.path(), None)?;
        assert_eq!(verdict.row_count, 20);
        assert_eq!(verdict.valid_timestamp_count, 19);
        assert!(verdict.passed);
        Ok(())
    }

    #[test]
    fn test_duplicates_across_files() -> Result<()> {
        let dir = TempDir::new()?;
        write(&dir, "a.csv", &format!("{}\n2024-06-30 00:00,1,2,5\n", HEADER));
        write(
            &dir,
            "b.csv",
            &format!("{}\n2024-06-30 00:00,1,2,5\n2024-06-30 01:00,1,2,5\n", HEADER),
        );

        let verdict = CorpusAggregator::new(&config()).validate_corpus(dir.path(), None)?;
        assert_eq!(verdict.duplicate_count, 1);
        assert!(verdict.passed);
        assert!(verdict.has_problem(ProblemCategory::DuplicateObservations));
        Ok(())
    }

    #[test]
    fn test_missing_columns_gate_only_when_configured() -> Result<()> {
        let dir = TempDir::new()?;
        write(
            &dir,
            "a.csv",
            "Date/Time (LST),Latitude (y),Longitude (x)\n2024-06-30 00:00,1,2\n",
        );

        let lenient = CorpusAggregator::new(&config()).validate_corpus(dir.path(), None)?;
        assert!(lenient.passed);
        assert_eq!(
            lenient.problems,
            vec![ValidationProblem::from_file(
                "a.csv",
                Issue::MissingColumns {
                    columns: vec!["Temp (°C)".to_string()]
                }
            )]
        );

        let mut strict_config = config();
        strict_config.corpus_gates_on_schema_mismatch = true;
        let strict = CorpusAggregator::new(&strict_config).validate_corpus(dir.path(), None)?;
        assert!(!strict.passed);
        Ok(())
    }

    #[test]
    fn test_ambiguous_roles_tagged_and_advisory_in_strict_corpus() -> Result<()> {
        let dir = TempDir::new()?;
        write(
            &dir,
            "a.csv",
            "Date/Time (LST),Latitude (y),lat_grid,Longitude (x)\n\
             2024-06-30 00:00,43.6,1,-79.4\n\
             2024-06-30 00:00,43.6,2,-79.4\n",
        );

        let mut strict_config = QcConfig::default().with_required_station_columns([
            "Date/Time (LST)",
            "Latitude (y)",
            "Longitude (x)",
        ]);
        strict_config.strict_column_roles = true;
        strict_config.corpus_gates_on_schema_mismatch = true;

        let verdict = CorpusAggregator::new(&strict_config).validate_corpus(dir.path(), None)?;

        assert!(verdict.passed);
        assert_eq!(verdict.duplicate_count, 1);
        assert_eq!(
            verdict.problems,
            vec![
                ValidationProblem::from_file(
                    "a.csv",
                    Issue::AmbiguousRole {
                        role: ColumnRole::Latitude,
                        candidates: vec!["Latitude (y)".to_string(), "lat_grid".to_string()],
                    }
                ),
                ValidationProblem::new(Issue::DuplicateObservations { count: 1 }),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_unresolved_role_gates_strict_corpus() -> Result<()> {
        let dir = TempDir::new()?;
        write(&dir, "a.csv", "Date/Time (LST),Latitude (y)\n2024-06-30 00:00,43.6\n");

        let mut strict_config = QcConfig::default().with_required_station_columns(Vec::<String>::new());
        strict_config.strict_column_roles = true;
        strict_config.corpus_gates_on_schema_mismatch = true;

        let verdict = CorpusAggregator::new(&strict_config).validate_corpus(dir.path(), None)?;

        assert!(!verdict.passed);
        assert_eq!(
            verdict.problems,
            vec![ValidationProblem::from_file(
                "a.csv",
                Issue::UnresolvedRole {
                    role: ColumnRole::Longitude
                }
            )]
        );
        Ok(())
    }

    #[test]
    fn test_empty_directory_fails() -> Result<()> {
        let dir = TempDir::new()?;
        let verdict = CorpusAggregator::new(&config()).validate_corpus(dir.path(), None)?;

        assert_eq!(verdict.row_count, 0);
        assert!(!verdict.passed);
        assert!(verdict.has_problem(ProblemCategory::SourceUnavailable));
        Ok(())
    }
}
