//! FileType entity - file categories with an optional default location
//!
//! Collection: `fileTypes`

use serde::{Deserialize, Serialize};

use super::lenient;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileType {
    #[serde(skip)]
    pub id: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,

    /// Template only, no structural link once an item is created
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_cabinet_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::opt_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_level: Option<i64>,

    #[serde(
        default,
        deserialize_with = "lenient::opt_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_column: Option<i64>,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub default_is_locker: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_file_type() {
        let value = json!({
            "name": "Audit",
            "defaultCabinetId": "",
            "defaultLevel": 2,
            "defaultColumn": 1,
            "defaultIsLocker": false
        });
        let file_type: FileType = serde_json::from_value(value).unwrap();
        assert_eq!(file_type.name, "Audit");
        assert_eq!(file_type.default_cabinet_id, None);
        assert_eq!(file_type.default_level, Some(2));
    }
}
