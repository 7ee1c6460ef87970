use crate::error::{ProcessingError, Result};
use crate::models::{ColumnRole, Issue};
use crate::utils::constants::{COMPOSITE_TIMESTAMP_COLUMNS, DAY_COLUMN, MONTH_COLUMN, YEAR_COLUMN};
use std::collections::HashMap;

/// Locates columns by meaning rather than exact spelling.
///
/// Coordinate and time-of-day roles match by case-insensitive substring and
/// the first column in declared order wins. Further matches are ignored
/// unless the resolver is strict, in which case they are reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnResolver {
    strict: bool,
}

/// Column chosen for a role, plus an advisory issue when the choice was
/// ambiguous under strict resolution
#[derive(Debug, Clone, PartialEq)]
pub struct RoleResolution {
    pub column: Option<String>,
    pub ambiguity: Option<Issue>,
}

impl ColumnResolver {
    pub fn new() -> Self {
        Self { strict: false }
    }

    pub fn with_strict_mode(strict: bool) -> Self {
        Self { strict }
    }

    /// Resolve one role, permissively or strictly depending on the mode
    pub fn resolve_role(&self, columns: &[String], role: ColumnRole) -> RoleResolution {
        let matches = candidates(columns, role);
        let column = matches.first().map(|c| c.to_string());

        let ambiguity = if self.strict && matches.len() > 1 {
            Some(Issue::AmbiguousRole {
                role,
                candidates: matches.iter().map(|c| c.to_string()).collect(),
            })
        } else {
            None
        };

        RoleResolution { column, ambiguity }
    }
}

/// First column in declared order that plays `role`
pub fn resolve(columns: &[String], role: ColumnRole) -> Option<String> {
    candidates(columns, role).first().map(|c| c.to_string())
}

/// Like [`resolve`] but refuses to choose between several matches
pub fn resolve_strict(columns: &[String], role: ColumnRole) -> Result<Option<String>> {
    let matches = candidates(columns, role);
    if matches.len() > 1 {
        return Err(ProcessingError::AmbiguousColumn {
            role: role.to_string(),
            candidates: matches.iter().map(|c| c.to_string()).collect(),
        });
    }
    Ok(matches.first().map(|c| c.to_string()))
}

/// Every column that could play `role`, in declared order
pub fn candidates(columns: &[String], role: ColumnRole) -> Vec<&str> {
    let matching = |column: &&String| -> bool {
        let lower = column.to_lowercase();
        match role {
            ColumnRole::Latitude => lower.contains("lat"),
            ColumnRole::Longitude => lower.contains("lon"),
            ColumnRole::TimeOfDay => lower.contains("time") && !is_calendar_column(column),
            ColumnRole::TimestampPrimary => COMPOSITE_TIMESTAMP_COLUMNS.contains(&column.as_str()),
            ColumnRole::Year => column.as_str() == YEAR_COLUMN,
            ColumnRole::Month => column.as_str() == MONTH_COLUMN,
            ColumnRole::Day => column.as_str() == DAY_COLUMN,
        }
    };

    columns.iter().filter(matching).map(String::as_str).collect()
}

fn is_calendar_column(column: &str) -> bool {
    [YEAR_COLUMN, MONTH_COLUMN, DAY_COLUMN]
        .iter()
        .any(|name| column.eq_ignore_ascii_case(name))
}

/// Measurement column by name: exact match first, then a match ignoring
/// case and degree-sign variants (`º`, `˚`, `℃`).
pub fn find_measurement(columns: &[String], name: &str) -> Option<String> {
    if let Some(exact) = columns.iter().find(|c| c.as_str() == name) {
        return Some(exact.clone());
    }

    let wanted = fold_symbols(name);
    columns.iter().find(|c| fold_symbols(c) == wanted).cloned()
}

fn fold_symbols(name: &str) -> String {
    name.trim()
        .replace('℃', "°c")
        .replace(['º', '˚'], "°")
        .to_lowercase()
}

/// Logical role → actual column name for one record set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnRoleMap {
    roles: HashMap<ColumnRole, String>,
}

impl ColumnRoleMap {
    pub fn resolve_all(columns: &[String]) -> Self {
        let roles = [
            ColumnRole::Latitude,
            ColumnRole::Longitude,
            ColumnRole::TimestampPrimary,
            ColumnRole::Year,
            ColumnRole::Month,
            ColumnRole::Day,
            ColumnRole::TimeOfDay,
        ]
        .into_iter()
        .filter_map(|role| resolve(columns, role).map(|column| (role, column)))
        .collect();

        Self { roles }
    }

    pub fn get(&self, role: ColumnRole) -> Option<&str> {
        self.roles.get(&role).map(String::as_str)
    }

    pub fn has_calendar_parts(&self) -> bool {
        [ColumnRole::Year, ColumnRole::Month, ColumnRole::Day, ColumnRole::TimeOfDay]
            .iter()
            .all(|role| self.roles.contains_key(role))
    }
}
