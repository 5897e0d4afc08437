//! Catalog queries over a snapshot
//!
//! Files and documents are merged into [`StorageItem`]s here; everything
//! downstream addresses them uniformly.

use serde::Serialize;

use crate::entity::{FileType, ItemKind, StorageItem};
use crate::store::Snapshot;

/// Files then documents, each in collection order
pub fn collect_items(snapshot: &Snapshot) -> Vec<StorageItem> {
    snapshot
        .files
        .values()
        .map(StorageItem::from)
        .chain(snapshot.documents.values().map(StorageItem::from))
        .collect()
}

/// Look up a file or document by id
pub fn find_item(snapshot: &Snapshot, id: &str) -> Option<StorageItem> {
    snapshot
        .files
        .get(id)
        .map(StorageItem::from)
        .or_else(|| snapshot.documents.get(id).map(StorageItem::from))
}

pub fn items_in_cabinet<'a>(
    items: &'a [StorageItem],
    cabinet_id: &'a str,
) -> impl Iterator<Item = &'a StorageItem> + 'a {
    items
        .iter()
        .filter(move |item| item.location.cabinet_id == cabinet_id)
}

/// Case-insensitive substring match on number or name
pub fn search<'a>(items: &'a [StorageItem], term: &str) -> Vec<&'a StorageItem> {
    let term = term.trim().to_lowercase();
    items
        .iter()
        .filter(|item| {
            term.is_empty()
                || item.number.to_lowercase().contains(&term)
                || item.name.to_lowercase().contains(&term)
        })
        .collect()
}

/// Files of one file type
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTypeGroup {
    pub file_type: FileType,
    pub id: String,
    pub items: Vec<StorageItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedFiles {
    pub groups: Vec<FileTypeGroup>,
    /// Files without a type or whose type no longer exists
    pub uncategorized: Vec<StorageItem>,
}

/// Group files under their file types
pub fn group_by_file_type(snapshot: &Snapshot) -> GroupedFiles {
    let files: Vec<StorageItem> = collect_items(snapshot)
        .into_iter()
        .filter(|item| item.kind == ItemKind::File)
        .collect();

    let groups = snapshot
        .file_types
        .iter()
        .map(|(id, file_type)| FileTypeGroup {
            file_type: file_type.clone(),
            id: id.clone(),
            items: files
                .iter()
                .filter(|f| f.file_type_id.as_deref() == Some(id.as_str()))
                .cloned()
                .collect(),
        })
        .collect();

    let uncategorized = files
        .into_iter()
        .filter(|f| match &f.file_type_id {
            Some(type_id) => snapshot.file_type(type_id).is_none(),
            None => true,
        })
        .collect();

    GroupedFiles {
        groups,
        uncategorized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{DocumentRecord, FileRecord, ItemLocation};

    fn snapshot() -> Snapshot {
        let mut snapshot = Snapshot::default();
        let files = [
            ("f1", "Payroll", "P-1", "t1", "c1"),
            ("f2", "Budget", "B-7", "gone", "c1"),
            ("f3", "Leases", "L-2", "", "c2"),
        ];
        for (id, name, number, type_id, cabinet) in files {
            snapshot.files.insert(
                id.to_string(),
                FileRecord {
                    id: id.to_string(),
                    file_name: name.to_string(),
                    file_number: number.to_string(),
                    file_type_id: type_id.to_string(),
                    location: ItemLocation::new(cabinet, 1, 1, false),
                    ..Default::default()
                },
            );
        }
        snapshot.documents.insert(
            "d1".to_string(),
            DocumentRecord {
                id: "d1".to_string(),
                document_number: "DOC-9".to_string(),
                document_type: "Deed".to_string(),
                location: ItemLocation::new("c1", 2, 1, false),
                ..Default::default()
            },
        );
        snapshot.file_types.insert(
            "t1".to_string(),
            FileType {
                id: "t1".to_string(),
                name: "Finance".to_string(),
                ..Default::default()
            },
        );
        snapshot
    }

    #[test]
    fn test_collect_and_find() {
        let snapshot = snapshot();
        let items = collect_items(&snapshot);
        assert_eq!(items.len(), 4);
        assert_eq!(items.last().unwrap().kind, ItemKind::Document);
        assert_eq!(find_item(&snapshot, "d1").unwrap().name, "Deed");
        assert!(find_item(&snapshot, "nope").is_none());
        assert_eq!(items_in_cabinet(&items, "c1").count(), 3);
    }

    #[test]
    fn test_search() {
        let items = collect_items(&snapshot());
        let hits: Vec<&str> = search(&items, "pAy").iter().map(|i| i.id.as_str()).collect();
        assert_eq!(hits, vec!["f1"]);
        assert_eq!(search(&items, "doc-").len(), 1);
        assert_eq!(search(&items, "  ").len(), 4);
        assert!(search(&items, "zzz").is_empty());
    }

    #[test]
    fn test_group_by_file_type() {
        let grouped = group_by_file_type(&snapshot());
        assert_eq!(grouped.groups.len(), 1);
        assert_eq!(grouped.groups[0].items.len(), 1);
        assert_eq!(grouped.groups[0].items[0].id, "f1");

        let mut uncategorized: Vec<&str> =
            grouped.uncategorized.iter().map(|i| i.id.as_str()).collect();
        uncategorized.sort();
        assert_eq!(uncategorized, vec!["f2", "f3"]);
    }
}
