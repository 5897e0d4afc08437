//! Cabinet entity - storage cabinet definitions
//!
//! Collection: `cabinets`

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::lenient;

/// A locker declaration on a cabinet level.
///
/// `column: None` marks the whole level as a single locker compartment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockerDecl {
    pub level: i64,
    #[serde(default)]
    pub column: Option<i64>,
}

impl LockerDecl {
    pub fn whole_level(level: i64) -> Self {
        Self { level, column: None }
    }

    pub fn column(level: i64, column: i64) -> Self {
        Self {
            level,
            column: Some(column),
        }
    }

    pub fn is_whole_level(&self) -> bool {
        self.column.is_none()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cabinet {
    /// Collection key, not part of the stored value
    #[serde(skip)]
    pub id: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,

    /// Number of levels (rows); level 1 is the physical bottom
    #[serde(default, deserialize_with = "lenient::count")]
    pub levels: i64,

    /// Column count of any level without an override
    #[serde(default, deserialize_with = "lenient::count")]
    pub columns: i64,

    /// Per-level column count overrides
    #[serde(
        default,
        deserialize_with = "level_columns",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub level_columns: BTreeMap<i64, i64>,

    /// Cached flag, true iff `lockers` is non-empty after [`Cabinet::normalize`]
    #[serde(default, deserialize_with = "lenient::flag")]
    pub has_locker: bool,

    #[serde(default, deserialize_with = "lockers")]
    pub lockers: Vec<LockerDecl>,
}

impl Cabinet {
    pub fn new(name: impl Into<String>, levels: i64, columns: i64) -> Self {
        Self {
            name: name.into(),
            levels,
            columns,
            ..Default::default()
        }
    }

    pub fn with_level_columns(mut self, level: i64, columns: i64) -> Self {
        self.level_columns.insert(level, columns);
        self
    }

    pub fn with_locker(mut self, locker: LockerDecl) -> Self {
        self.lockers.push(locker);
        self.has_locker = true;
        self
    }

    /// Effective column count of a level
    pub fn effective_column_count(&self, level: i64) -> i64 {
        self.level_columns
            .get(&level)
            .copied()
            .unwrap_or(self.columns)
    }

    /// True iff a declaration covers the whole level
    pub fn is_whole_level_locker(&self, level: i64) -> bool {
        self.lockers
            .iter()
            .any(|l| l.level == level && l.is_whole_level())
    }

    /// Specifically declared locker columns of a level, ascending and deduplicated
    pub fn specific_locker_columns(&self, level: i64) -> Vec<i64> {
        let mut columns: Vec<i64> = self
            .lockers
            .iter()
            .filter(|l| l.level == level)
            .filter_map(|l| l.column)
            .collect();
        columns.sort_unstable();
        columns.dedup();
        columns
    }

    /// Canonical form written back to the store.
    ///
    /// Drops duplicate locker declarations and overrides equal to the default
    /// column count, and recomputes `has_locker`.
    pub fn normalize(&mut self) {
        let mut seen = Vec::with_capacity(self.lockers.len());
        self.lockers.retain(|l| {
            if seen.contains(l) {
                false
            } else {
                seen.push(l.clone());
                true
            }
        });
        let columns = self.columns;
        self.level_columns.retain(|_, c| *c != columns);
        self.has_locker = !self.lockers.is_empty();
    }
}

/// Accepts an object keyed by level number or a sparse array indexed by level.
fn level_columns<'de, D>(deserializer: D) -> Result<BTreeMap<i64, i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let mut map = BTreeMap::new();
    match value {
        Value::Object(entries) => {
            for (key, count) in entries {
                let level = key.trim().parse::<i64>().ok();
                if let (Some(level), Some(count)) = (level, lenient::int_from_value(&count)) {
                    map.insert(level, count);
                }
            }
        }
        Value::Array(entries) => {
            for (index, count) in entries.iter().enumerate() {
                if let Some(count) = lenient::int_from_value(count) {
                    map.insert(index as i64, count);
                }
            }
        }
        _ => {}
    }
    Ok(map)
}

/// Skips `null` holes and declarations without a readable level.
fn lockers<'de, D>(deserializer: D) -> Result<Vec<LockerDecl>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(entries) => entries.into_iter().map(|(_, v)| v).collect(),
        _ => Vec::new(),
    };
    Ok(entries
        .iter()
        .filter_map(|entry| {
            let level = lenient::int_from_value(entry.get("level")?)?;
            let column = entry.get("column").and_then(lenient::int_from_value);
            Some(LockerDecl { level, column })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_stored_cabinet() {
        let value = json!({
            "name": "Main Archival A1",
            "levels": 3,
            "columns": "2",
            "levelColumns": {"2": 4},
            "hasLocker": true,
            "lockers": [{"level": 3, "column": null}, null, {"level": 1, "column": 2}]
        });
        let cabinet: Cabinet = serde_json::from_value(value).unwrap();
        assert_eq!(cabinet.name, "Main Archival A1");
        assert_eq!(cabinet.levels, 3);
        assert_eq!(cabinet.columns, 2);
        assert_eq!(cabinet.level_columns.get(&2), Some(&4));
        assert_eq!(
            cabinet.lockers,
            vec![LockerDecl::whole_level(3), LockerDecl::column(1, 2)]
        );
    }

    #[test]
    fn test_level_columns_as_sparse_array() {
        let value = json!({
            "name": "B",
            "levels": 3,
            "columns": 2,
            "levelColumns": [null, null, 5]
        });
        let cabinet: Cabinet = serde_json::from_value(value).unwrap();
        assert_eq!(cabinet.level_columns.len(), 1);
        assert_eq!(cabinet.effective_column_count(2), 5);
        assert_eq!(cabinet.effective_column_count(1), 2);
    }

    #[test]
    fn test_missing_counts_decode_as_zero() {
        let cabinet: Cabinet = serde_json::from_value(json!({"name": "C"})).unwrap();
        assert_eq!(cabinet.levels, 0);
        assert_eq!(cabinet.columns, 0);
        assert!(cabinet.lockers.is_empty());
    }

    #[test]
    fn test_locker_queries() {
        let cabinet = Cabinet::new("D", 4, 3)
            .with_locker(LockerDecl::column(2, 3))
            .with_locker(LockerDecl::column(2, 1))
            .with_locker(LockerDecl::column(2, 3))
            .with_locker(LockerDecl::whole_level(4));
        assert_eq!(cabinet.specific_locker_columns(2), vec![1, 3]);
        assert!(cabinet.is_whole_level_locker(4));
        assert!(!cabinet.is_whole_level_locker(2));
        assert!(cabinet.specific_locker_columns(1).is_empty());
    }

    #[test]
    fn test_normalize() {
        let mut cabinet = Cabinet::new("E", 2, 3)
            .with_level_columns(1, 3)
            .with_level_columns(2, 5)
            .with_locker(LockerDecl::whole_level(1))
            .with_locker(LockerDecl::whole_level(1));
        cabinet.normalize();
        assert_eq!(cabinet.lockers.len(), 1);
        assert!(cabinet.has_locker);
        assert_eq!(cabinet.level_columns.len(), 1);

        cabinet.lockers.clear();
        cabinet.normalize();
        assert!(!cabinet.has_locker);
    }

    #[test]
    fn test_serialize_omits_id() {
        let mut cabinet = Cabinet::new("F", 1, 1);
        cabinet.id = "abc".to_string();
        let value = serde_json::to_value(&cabinet).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["hasLocker"], json!(false));
    }
}
