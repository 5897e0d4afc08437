//! Cabinet layout engine
//!
//! Turns a cabinet definition into the ordered set of addressable cells.
//! Levels are listed top first (`levels, levels - 1, ..., 1`) to match the
//! physical cabinet; every consumer renders them in this order.

use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::entity::{Cabinet, LockerDecl};
use crate::error::InvalidCabinetError;

/// Upper bound on cached layouts before the cache is flushed
const LAYOUT_CACHE_CAPACITY: usize = 1024;

/// Largest number of plain cells a cabinet may declare
pub const MAX_CABINET_CELLS: i64 = 100_000;

/// A single column cell of a level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnCell {
    pub column: i64,
    pub is_locker: bool,
}

/// Cells of one level
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LevelCells {
    /// The entire level is one locker compartment
    WholeLocker,
    Columns { columns: Vec<ColumnCell> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LevelLayout {
    pub level: i64,
    pub cells: LevelCells,
}

/// Any addressable cell, as used by the grid and print views
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub level: i64,
    /// `None` for a whole-level locker
    pub column: Option<i64>,
    pub is_locker: bool,
}

impl LevelLayout {
    pub fn is_whole_locker(&self) -> bool {
        matches!(self.cells, LevelCells::WholeLocker)
    }

    /// Cells of the level, ascending by column
    pub fn cells(&self) -> Vec<Cell> {
        match &self.cells {
            LevelCells::WholeLocker => vec![Cell {
                level: self.level,
                column: None,
                is_locker: true,
            }],
            LevelCells::Columns { columns } => columns
                .iter()
                .map(|c| Cell {
                    level: self.level,
                    column: Some(c.column),
                    is_locker: c.is_locker,
                })
                .collect(),
        }
    }

    /// Rendered column numbers, empty for a whole-level locker
    pub fn columns(&self) -> Vec<i64> {
        match &self.cells {
            LevelCells::WholeLocker => Vec::new(),
            LevelCells::Columns { columns } => columns.iter().map(|c| c.column).collect(),
        }
    }
}

/// Computed layout of a cabinet, levels top first
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub levels: Vec<LevelLayout>,
}

impl Layout {
    pub fn level(&self, level: i64) -> Option<&LevelLayout> {
        self.levels.iter().find(|l| l.level == level)
    }

    /// All cells in display order
    pub fn cells(&self) -> Vec<Cell> {
        self.levels.iter().flat_map(LevelLayout::cells).collect()
    }

    /// The rendered cell addressed by a coordinate.
    ///
    /// On a whole-level locker every column addresses the single cell.
    pub fn cell_at(&self, level: i64, column: Option<i64>) -> Option<Cell> {
        let level_layout = self.level(level)?;
        match &level_layout.cells {
            LevelCells::WholeLocker => level_layout.cells().into_iter().next(),
            LevelCells::Columns { columns } => {
                let column = column?;
                columns.iter().find(|c| c.column == column).map(|c| Cell {
                    level,
                    column: Some(c.column),
                    is_locker: c.is_locker,
                })
            }
        }
    }

    pub fn contains(&self, level: i64, column: Option<i64>) -> bool {
        self.cell_at(level, column).is_some()
    }
}

/// Reject cabinets whose counts cannot produce a layout
pub fn validate_cabinet(cabinet: &Cabinet) -> Result<(), InvalidCabinetError> {
    if cabinet.levels < 1 {
        return Err(InvalidCabinetError::Levels(cabinet.levels));
    }
    if cabinet.columns < 1 {
        return Err(InvalidCabinetError::Columns(cabinet.columns));
    }
    if let Some((&level, &columns)) = cabinet.level_columns.iter().find(|&(_, &c)| c < 1) {
        return Err(InvalidCabinetError::LevelColumns { level, columns });
    }
    let cells = declared_cells(cabinet);
    if cells > MAX_CABINET_CELLS {
        return Err(InvalidCabinetError::TooLarge {
            cells,
            max: MAX_CABINET_CELLS,
        });
    }
    Ok(())
}

/// Cells of all levels at their effective column counts, ignoring lockers
fn declared_cells(cabinet: &Cabinet) -> i64 {
    let in_range = || {
        cabinet
            .level_columns
            .iter()
            .filter(|&(&level, _)| level >= 1 && level <= cabinet.levels)
    };
    let overridden = in_range().count() as i64;
    in_range()
        .fold(
            (cabinet.levels - overridden).saturating_mul(cabinet.columns),
            |total, (_, &columns)| total.saturating_add(columns),
        )
}

/// Compute the renderable cell structure of a cabinet
pub fn compute_layout(cabinet: &Cabinet) -> Result<Layout, InvalidCabinetError> {
    validate_cabinet(cabinet)?;

    let levels = (1..=cabinet.levels)
        .rev()
        .map(|level| level_layout(cabinet, level))
        .collect();

    Ok(Layout { levels })
}

fn level_layout(cabinet: &Cabinet, level: i64) -> LevelLayout {
    if cabinet.is_whole_level_locker(level) {
        return LevelLayout {
            level,
            cells: LevelCells::WholeLocker,
        };
    }

    let lockers = cabinet.specific_locker_columns(level);
    let columns = if lockers.is_empty() {
        (1..=cabinet.effective_column_count(level))
            .map(|column| ColumnCell {
                column,
                is_locker: false,
            })
            .collect()
    } else {
        // A partially lockered level renders only its locker columns
        lockers
            .into_iter()
            .map(|column| ColumnCell {
                column,
                is_locker: true,
            })
            .collect()
    };

    LevelLayout {
        level,
        cells: LevelCells::Columns { columns },
    }
}

/// Layout-relevant content of a cabinet, used as the cache key
#[derive(Serialize)]
struct LayoutKey<'a> {
    levels: i64,
    columns: i64,
    level_columns: &'a BTreeMap<i64, i64>,
    lockers: &'a [LockerDecl],
}

/// Content digest of everything that affects a cabinet's layout
pub fn layout_key(cabinet: &Cabinet) -> String {
    let key = LayoutKey {
        levels: cabinet.levels,
        columns: cabinet.columns,
        level_columns: &cabinet.level_columns,
        lockers: &cabinet.lockers,
    };
    let encoded = serde_json::to_vec(&key).unwrap_or_default();
    hex::encode(Sha256::digest(&encoded))
}

/// Memoised layouts keyed by cabinet content
#[derive(Default)]
pub struct LayoutCache {
    layouts: DashMap<String, Arc<Layout>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(&self, cabinet: &Cabinet) -> Result<Arc<Layout>, InvalidCabinetError> {
        let key = layout_key(cabinet);
        if let Some(layout) = self.layouts.get(&key) {
            return Ok(layout.clone());
        }

        let layout = Arc::new(compute_layout(cabinet)?);
        if self.layouts.len() >= LAYOUT_CACHE_CAPACITY {
            tracing::debug!("Layout cache full, flushing {} entries", self.layouts.len());
            self.layouts.clear();
        }
        self.layouts.insert(key, layout.clone());
        Ok(layout)
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}
