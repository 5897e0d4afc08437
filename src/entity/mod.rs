//! Entity module - stored record shapes
//!
//! Records are kept as loosely-typed JSON by the record store, so every
//! numeric or boolean field is decoded leniently (see [`lenient`]).

pub mod cabinet;
pub mod file_type;
pub mod item;

pub use cabinet::{Cabinet, LockerDecl};
pub use file_type::FileType;
pub use item::{DocumentRecord, FileRecord, ItemKind, ItemLocation, Placeable, StorageItem};

/// Lenient decoders for values written by loosely-typed clients
pub mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Read an integer from a number or a numeric string.
    ///
    /// Fractions are truncated; anything else yields `None`.
    pub fn int_from_value(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            }),
            Value::String(s) => {
                let trimmed = s.trim();
                trimmed.parse::<i64>().ok().or_else(|| {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.trunc() as i64)
                })
            }
            _ => None,
        }
    }

    /// `true` or the string `"true"`
    pub fn flag_from_value(value: &Value) -> bool {
        match value {
            Value::Bool(b) => *b,
            Value::String(s) => s == "true",
            _ => false,
        }
    }

    pub fn opt_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(int_from_value(&value))
    }

    /// Counts decode to 0 when unreadable so layout validation rejects them
    pub fn count<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(opt_int(deserializer)?.unwrap_or(0))
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(flag_from_value(&value))
    }

    pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        })
    }

    /// Empty or missing strings become `None`
    pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = string(deserializer)?;
        Ok(if s.is_empty() { None } else { Some(s) })
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use serde_json::json;

        #[test]
        fn test_int_from_value() {
            assert_eq!(int_from_value(&json!(3)), Some(3));
            assert_eq!(int_from_value(&json!("4")), Some(4));
            assert_eq!(int_from_value(&json!(" 5 ")), Some(5));
            assert_eq!(int_from_value(&json!(2.7)), Some(2));
            assert_eq!(int_from_value(&json!("abc")), None);
            assert_eq!(int_from_value(&json!(null)), None);
            assert_eq!(int_from_value(&json!(true)), None);
        }

        #[test]
        fn test_flag_from_value() {
            assert!(flag_from_value(&json!(true)));
            assert!(flag_from_value(&json!("true")));
            assert!(!flag_from_value(&json!("yes")));
            assert!(!flag_from_value(&json!(1)));
            assert!(!flag_from_value(&json!(null)));
        }
    }
}
