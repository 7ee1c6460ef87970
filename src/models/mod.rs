pub mod column_role;
pub mod irradiance_document;
pub mod normalized;
pub mod observation;
pub mod problem;
pub mod record_set;
pub mod verdict;

pub use column_role::ColumnRole;
pub use irradiance_document::{IrradianceDocument, OrderedEntries, ParameterSeries};
pub use normalized::{IrradianceObservation, NormalizedBatch, StationObservation};
pub use observation::{count_duplicates, CoordinateKey, DerivedTimestamps, ObservationKey};
pub use problem::{format_percent, Issue, ProblemCategory, ValidationProblem};
pub use record_set::RawTabularRecordSet;
pub use verdict::{
    validity_ratio, CorpusVerdict, PassPolicy, SourceVerdict, Verdict, VerdictScope,
};
