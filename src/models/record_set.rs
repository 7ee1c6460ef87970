/// Rows of one tabular source file, exactly as the provider named them.
///
/// Every row holds one raw value per column, aligned with `columns`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTabularRecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTabularRecordSet {
    /// Build a record set, padding short rows with empty values and
    /// truncating long ones so every row matches the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Raw values of one column, top to bottom
    pub fn column_values<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a str> + 'a> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row[index].as_str()))
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| r[index].as_str())
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_rows_aligned_to_header_width() {
        let set = RawTabularRecordSet::new(
            strings(&["a", "b", "c"]),
            vec![strings(&["1"]), strings(&["1", "2", "3", "4"])],
        );

        assert_eq!(set.row_count(), 2);
        assert_eq!(set.value(0, "c"), Some(""));
        assert_eq!(set.value(1, "c"), Some("3"));
        assert!(set.rows().iter().all(|r| r.len() == 3));
    }

    #[test]
    fn test_column_lookup_is_verbatim() {
        let set = RawTabularRecordSet::new(strings(&["Temp (°C)"]), vec![strings(&["12.5"])]);

        assert!(set.has_column("Temp (°C)"));
        assert!(!set.has_column("temp (°c)"));
        let values: Vec<&str> = set.column_values("Temp (°C)").unwrap().collect();
        assert_eq!(values, vec!["12.5"]);
        assert!(set.column_values("missing").is_none());
    }

    #[test]
    fn test_empty() {
        let set = RawTabularRecordSet::empty();
        assert!(set.is_empty());
        assert!(set.columns().is_empty());
    }
}
