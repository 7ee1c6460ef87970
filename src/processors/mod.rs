pub mod column_resolver;
pub mod corpus_aggregator;
pub mod document_validator;
pub mod normalizer;
pub mod source_validator;
pub mod timestamp_deriver;

pub use column_resolver::{ColumnResolver, ColumnRoleMap, RoleResolution};
pub use corpus_aggregator::CorpusAggregator;
pub use document_validator::DocumentValidator;
pub use normalizer::{NormalizationStats, Normalizer};
pub use source_validator::SourceValidator;
