use crate::reader::SourceRow;
use crate::{ImportError, ImportResult, RowError};
use std::collections::HashMap;

/// A record keyed by header name. Absent columns read as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    fields: HashMap<String, String>,
}

impl RawRow {
    pub fn get(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Pairs a record with the header. A width mismatch is batch-fatal: carrying
/// on would silently shift every later column.
pub fn check_structure(header: &[String], row: SourceRow) -> ImportResult<RawRow> {
    if row.values.len() != header.len() {
        return Err(ImportError::Structural {
            line: row.line,
            expected: header.len(),
            actual: row.values.len(),
        });
    }
    // Duplicate header names keep the right-most value.
    Ok(header.iter().cloned().zip(row.values).collect())
}

/// The named field must be present and not blank. Row-scoped.
pub fn require_field<'a>(row: &'a RawRow, field: &str, line: u64) -> Result<&'a str, RowError> {
    let value = row.get(field).trim();
    if value.is_empty() {
        return Err(RowError::MissingField {
            line,
            field: field.to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn row(line: u64, values: &[&str]) -> SourceRow {
        SourceRow {
            line,
            values: values.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn width_mismatch_reports_line_and_counts() {
        let err = check_structure(&header(&["a", "b", "c"]), row(7, &["1", "2"])).unwrap_err();
        match err {
            ImportError::Structural {
                line,
                expected,
                actual,
            } => assert_eq!((line, expected, actual), (7, 3, 2)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(check_structure(&header(&["a"]), row(2, &["1", "2"])).is_err());
    }

    #[test]
    fn matching_width_builds_mapping() {
        let mapped =
            check_structure(&header(&["product_SKU", "rating"]), row(2, &["S1", "4"])).unwrap();
        assert_eq!(mapped.get("product_SKU"), "S1");
        assert_eq!(mapped.get("rating"), "4");
        assert_eq!(mapped.get("title"), "");
        assert!(!mapped.contains("title"));
    }

    #[test]
    fn duplicate_header_last_wins() {
        let mapped = check_structure(&header(&["x", "x"]), row(2, &["first", "second"])).unwrap();
        assert_eq!(mapped.get("x"), "second");
        assert_eq!(mapped.len(), 1);
    }

    #[test]
    fn blank_or_absent_required_field() {
        let present: RawRow = [("product_SKU", " S1 ")].into_iter().collect();
        assert_eq!(require_field(&present, "product_SKU", 2).unwrap(), "S1");

        let blank: RawRow = [("product_SKU", "  ")].into_iter().collect();
        let absent = RawRow::default();
        for r in [&blank, &absent] {
            match require_field(r, "product_SKU", 4) {
                Err(RowError::MissingField { line, field }) => {
                    assert_eq!(line, 4);
                    assert_eq!(field, "product_SKU");
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }
}
