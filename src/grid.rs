//! Cabinet grid assembly
//!
//! Places every item of a cabinet into the cells of its layout, for the grid
//! view, the per-cell print sheets and the dashboard.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::entity::{Cabinet, StorageItem};
use crate::layout::{Cell, Layout};
use crate::location::format_location;
use crate::placement::{resolve_placement, ResolvedPlacement};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridItem {
    #[serde(flatten)]
    pub item: StorageItem,
    pub placement: ResolvedPlacement,
    pub location: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    #[serde(flatten)]
    pub cell: Cell,
    pub items: Vec<GridItem>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridLevel {
    pub level: i64,
    pub whole_locker: bool,
    pub cells: Vec<GridCell>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CabinetGrid {
    pub cabinet_id: String,
    pub name: String,
    /// Top level first
    pub levels: Vec<GridLevel>,
    /// Items whose resolved cell is not rendered by the layout
    pub unplaced: Vec<GridItem>,
}

impl CabinetGrid {
    pub fn item_count(&self) -> usize {
        self.levels
            .iter()
            .flat_map(|l| &l.cells)
            .map(|c| c.items.len())
            .sum::<usize>()
            + self.unplaced.len()
    }
}

/// Build the grid of a cabinet from its layout and the catalog items
pub fn build_grid<'a>(
    cabinet: &Cabinet,
    layout: &Layout,
    items: impl IntoIterator<Item = &'a StorageItem>,
) -> CabinetGrid {
    let mut by_cell: HashMap<(i64, Option<i64>), Vec<GridItem>> = HashMap::new();
    let mut unplaced = Vec::new();

    for item in items
        .into_iter()
        .filter(|item| item.location.cabinet_id == cabinet.id)
    {
        let placement = resolve_placement(cabinet, item);
        let grid_item = GridItem {
            item: item.clone(),
            placement,
            location: format_location(&placement),
        };
        match layout.cell_at(placement.level, placement.column) {
            Some(cell) => by_cell
                .entry((cell.level, cell.column))
                .or_default()
                .push(grid_item),
            None => unplaced.push(grid_item),
        }
    }

    if !unplaced.is_empty() {
        tracing::debug!(
            "Cabinet {} has {} items outside its rendered cells",
            cabinet.id,
            unplaced.len()
        );
    }

    let levels = layout
        .levels
        .iter()
        .map(|level| GridLevel {
            level: level.level,
            whole_locker: level.is_whole_locker(),
            cells: level
                .cells()
                .into_iter()
                .map(|cell| GridCell {
                    cell,
                    items: by_cell.remove(&(cell.level, cell.column)).unwrap_or_default(),
                })
                .collect(),
        })
        .collect();

    CabinetGrid {
        cabinet_id: cabinet.id.clone(),
        name: cabinet.name.clone(),
        levels,
        unplaced,
    }
}

/// One printed page listing the contents of a single cell
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellSheet {
    pub cabinet_name: String,
    pub heading: String,
    pub cell: Cell,
    pub items: Vec<GridItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_note: Option<String>,
}

/// Per-cell print sheets in display order
pub fn column_sheets(grid: &CabinetGrid) -> Vec<CellSheet> {
    grid.levels
        .iter()
        .flat_map(|level| &level.cells)
        .map(|grid_cell| {
            let cell = grid_cell.cell;
            let (heading, empty) = match cell.column {
                None => (
                    format!("LOCKER STORAGE (LEVEL {})", cell.level),
                    "Empty Locker Level",
                ),
                Some(column) if cell.is_locker => (
                    format!("Location: Level {} - Column {} (Locker)", cell.level, column),
                    "Empty Locker",
                ),
                Some(column) => (
                    format!("Location: Level {} - Column {}", cell.level, column),
                    "Empty Column",
                ),
            };
            CellSheet {
                cabinet_name: grid.name.clone(),
                heading,
                cell,
                items: grid_cell.items.clone(),
                empty_note: grid_cell.items.is_empty().then(|| empty.to_string()),
            }
        })
        .collect()
}

/// Dashboard entry of a cabinet
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CabinetSummary {
    pub id: String,
    pub name: String,
    pub levels: i64,
    pub columns: i64,
    pub has_locker: bool,
    pub item_count: usize,
}

/// Summaries sorted by name
pub fn summarize(
    cabinets: &BTreeMap<String, Cabinet>,
    items: &[StorageItem],
) -> Vec<CabinetSummary> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for item in items {
        *counts.entry(item.location.cabinet_id.as_str()).or_default() += 1;
    }

    let mut summaries: Vec<CabinetSummary> = cabinets
        .iter()
        .map(|(id, cabinet)| CabinetSummary {
            id: id.clone(),
            name: cabinet.name.clone(),
            levels: cabinet.levels,
            columns: cabinet.columns,
            has_locker: !cabinet.lockers.is_empty(),
            item_count: counts.get(id.as_str()).copied().unwrap_or(0),
        })
        .collect();
    summaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{FileRecord, ItemLocation, LockerDecl};
    use crate::layout::compute_layout;

    fn item(id: &str, cabinet: &str, level: i64, column: i64) -> StorageItem {
        StorageItem::from(&FileRecord {
            id: id.to_string(),
            file_name: format!("File {}", id),
            location: ItemLocation::new(cabinet, level, column, false),
            ..Default::default()
        })
    }

    fn cabinet() -> Cabinet {
        let mut cabinet = Cabinet::new("Main", 3, 2)
            .with_level_columns(2, 4)
            .with_locker(LockerDecl::whole_level(3))
            .with_locker(LockerDecl::column(1, 2));
        cabinet.id = "c1".to_string();
        cabinet
    }

    fn cell_items(grid: &CabinetGrid, level: i64, column: Option<i64>) -> Vec<String> {
        grid.levels
            .iter()
            .flat_map(|l| &l.cells)
            .find(|c| c.cell.level == level && c.cell.column == column)
            .map(|c| c.items.iter().map(|i| i.item.id.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_items_land_in_cells() {
        let cabinet = cabinet();
        let layout = compute_layout(&cabinet).unwrap();
        let items = vec![
            item("a", "c1", 3, 9),
            item("b", "c1", 3, 1),
            item("c", "c1", 2, 4),
            item("d", "c1", 1, 2),
            item("e", "c1", 1, 1),
            item("f", "other", 2, 1),
        ];
        let grid = build_grid(&cabinet, &layout, &items);

        assert_eq!(grid.levels.iter().map(|l| l.level).collect::<Vec<_>>(), vec![3, 2, 1]);
        assert!(grid.levels[0].whole_locker);
        assert_eq!(cell_items(&grid, 3, None), vec!["a", "b"]);
        assert_eq!(cell_items(&grid, 2, Some(4)), vec!["c"]);
        assert_eq!(cell_items(&grid, 1, Some(2)), vec!["d"]);

        // Column 1 of level 1 is hidden by its locker column
        assert_eq!(grid.unplaced.len(), 1);
        assert_eq!(grid.unplaced[0].item.id, "e");
        assert_eq!(grid.item_count(), 5);
    }

    #[test]
    fn test_grid_item_location_text() {
        let cabinet = cabinet();
        let layout = compute_layout(&cabinet).unwrap();
        let items = vec![item("a", "c1", 3, 1), item("d", "c1", 1, 2)];
        let grid = build_grid(&cabinet, &layout, &items);
        let whole = &grid.levels[0].cells[0].items[0];
        assert_eq!(whole.location, "Locker Storage (Level 3)");
        let locker = &grid.levels[2].cells[0].items[0];
        assert_eq!(locker.location, "Locker (Level 1, Col 2)");
    }

    #[test]
    fn test_column_sheets() {
        let cabinet = cabinet();
        let layout = compute_layout(&cabinet).unwrap();
        let items = vec![item("c", "c1", 2, 4)];
        let sheets = column_sheets(&build_grid(&cabinet, &layout, &items));

        assert_eq!(sheets.len(), 1 + 4 + 1);
        assert_eq!(sheets[0].heading, "LOCKER STORAGE (LEVEL 3)");
        assert_eq!(sheets[0].empty_note.as_deref(), Some("Empty Locker Level"));
        assert_eq!(sheets[4].heading, "Location: Level 2 - Column 4");
        assert!(sheets[4].empty_note.is_none());
        assert_eq!(sheets[5].heading, "Location: Level 1 - Column 2 (Locker)");
        assert_eq!(sheets[5].empty_note.as_deref(), Some("Empty Locker"));
    }

    #[test]
    fn test_summarize() {
        let mut cabinets = BTreeMap::new();
        cabinets.insert("c1".to_string(), cabinet());
        cabinets.insert("c0".to_string(), Cabinet::new("Annex", 1, 1));
        let items = vec![item("a", "c1", 1, 1), item("b", "c1", 1, 1), item("x", "gone", 1, 1)];

        let summaries = summarize(&cabinets, &items);
        assert_eq!(summaries[0].name, "Annex");
        assert_eq!(summaries[0].item_count, 0);
        assert_eq!(summaries[1].id, "c1");
        assert_eq!(summaries[1].item_count, 2);
        assert!(summaries[1].has_locker);
    }
}
