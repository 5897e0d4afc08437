//! Storage item entities - files and documents
//!
//! Collections: `files`, `documents`. Both share one placement model and are
//! merged into [`StorageItem`] for addressing.

use serde::{Deserialize, Serialize};

use super::lenient;

/// Stored placement fields shared by files and documents
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemLocation {
    /// Weak reference, may dangle
    #[serde(default, deserialize_with = "lenient::string")]
    pub cabinet_id: String,

    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub level: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub column: Option<i64>,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_locker: bool,
}

impl ItemLocation {
    pub fn new(cabinet_id: impl Into<String>, level: i64, column: i64, is_locker: bool) -> Self {
        Self {
            cabinet_id: cabinet_id.into(),
            level: Some(level),
            column: Some(column),
            is_locker,
        }
    }
}

/// Anything carrying stored placement fields
pub trait Placeable {
    fn location(&self) -> &ItemLocation;
    fn location_mut(&mut self) -> &mut ItemLocation;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    #[serde(skip)]
    pub id: String,

    /// Collection tag ("I" / "II")
    #[serde(default, deserialize_with = "lenient::string")]
    pub bd_collection: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub file_number: String,

    /// e.g. "2024-2025"
    #[serde(default, deserialize_with = "lenient::string")]
    pub financial_year: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub file_name: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub file_type_id: String,

    #[serde(flatten)]
    pub location: ItemLocation,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_confidential: bool,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub password: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    #[serde(skip)]
    pub id: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub bd_collection: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub document_number: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub document_type: String,

    #[serde(flatten)]
    pub location: ItemLocation,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_confidential: bool,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub password: Option<String>,
}

impl Placeable for FileRecord {
    fn location(&self) -> &ItemLocation {
        &self.location
    }

    fn location_mut(&mut self) -> &mut ItemLocation {
        &mut self.location
    }
}

impl Placeable for DocumentRecord {
    fn location(&self) -> &ItemLocation {
        &self.location
    }

    fn location_mut(&mut self) -> &mut ItemLocation {
        &mut self.location
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Document,
}

/// Unified addressing view of a file or document
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageItem {
    pub id: String,
    pub kind: ItemKind,
    pub number: String,
    pub name: String,
    /// Empty for documents
    pub year: String,
    /// File type id of a file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type_id: Option<String>,
    pub collection: String,
    #[serde(flatten)]
    pub location: ItemLocation,
    pub is_confidential: bool,
    #[serde(skip)]
    pub password: Option<String>,
}

impl StorageItem {
    /// "{number}/{year}", or the bare number without a year
    pub fn number_with_year(&self) -> String {
        if self.year.is_empty() {
            self.number.clone()
        } else {
            format!("{}/{}", self.number, self.year)
        }
    }
}

impl Placeable for StorageItem {
    fn location(&self) -> &ItemLocation {
        &self.location
    }

    fn location_mut(&mut self) -> &mut ItemLocation {
        &mut self.location
    }
}

impl From<&FileRecord> for StorageItem {
    fn from(file: &FileRecord) -> Self {
        Self {
            id: file.id.clone(),
            kind: ItemKind::File,
            number: file.file_number.clone(),
            name: if file.file_name.is_empty() {
                "Document".to_string()
            } else {
                file.file_name.clone()
            },
            year: file.financial_year.clone(),
            file_type_id: Some(file.file_type_id.clone()).filter(|t| !t.is_empty()),
            collection: file.bd_collection.clone(),
            location: file.location.clone(),
            is_confidential: file.is_confidential,
            password: file.password.clone(),
        }
    }
}

impl From<&DocumentRecord> for StorageItem {
    fn from(doc: &DocumentRecord) -> Self {
        Self {
            id: doc.id.clone(),
            kind: ItemKind::Document,
            number: if doc.document_number.is_empty() {
                "Unnamed Document".to_string()
            } else {
                doc.document_number.clone()
            },
            name: if doc.document_type.is_empty() {
                "Document".to_string()
            } else {
                doc.document_type.clone()
            },
            year: String::new(),
            file_type_id: None,
            collection: doc.bd_collection.clone(),
            location: doc.location.clone(),
            is_confidential: doc.is_confidential,
            password: doc.password.clone(),
        }
    }
}
