//! Placement resolver
//!
//! Binds a storage item to a cell of its cabinet's *current* layout. Locker
//! classification is always re-derived from the cabinet; the item's stored
//! `isLocker` flag is only a record of what the editor chose at the time.

use serde::{Deserialize, Serialize};

use crate::entity::{Cabinet, FileType, Placeable};
use crate::layout::{compute_layout, Cell, Layout};

/// Where an item is shown within its cabinet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPlacement {
    pub level: i64,
    /// `None` when the level is a whole-level locker
    pub column: Option<i64>,
    pub is_locker: bool,
}

impl ResolvedPlacement {
    pub fn cell(&self) -> Cell {
        Cell {
            level: self.level,
            column: self.column,
            is_locker: self.is_locker,
        }
    }
}

/// Initial placement offered when a cabinet is picked for an item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementDefaults {
    pub level: i64,
    pub column: i64,
    pub is_locker: bool,
}

/// Destination of a move, also used as a file type's location template
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTarget {
    pub cabinet_id: String,
    pub level: i64,
    pub column: i64,
    #[serde(default)]
    pub is_locker: bool,
}

/// Outcome of checking a move target against the destination cabinet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetCheck {
    Valid,
    UnknownCabinet,
    InvalidCabinet,
    /// The coordinate is not a rendered cell
    OutsideLayout,
    /// The cell exists but its locker classification differs from the target's
    LockerMismatch,
}

/// Resolve an item's stored placement against a cabinet.
///
/// Never fails: missing coordinates default to 1, the level is clamped into
/// the cabinet and a plain level's column into its column count. Columns on a
/// partially lockered level are kept as stored even when not rendered.
pub fn resolve_placement<T: Placeable + ?Sized>(cabinet: &Cabinet, item: &T) -> ResolvedPlacement {
    let location = item.location();
    let mut level = location.level.unwrap_or(1).max(1);
    if cabinet.levels >= 1 {
        level = level.min(cabinet.levels);
    }
    let column = location.column.unwrap_or(1);

    if cabinet.is_whole_level_locker(level) {
        return ResolvedPlacement {
            level,
            column: None,
            is_locker: true,
        };
    }

    let lockers = cabinet.specific_locker_columns(level);
    if !lockers.is_empty() {
        return ResolvedPlacement {
            level,
            column: Some(column),
            is_locker: lockers.contains(&column),
        };
    }

    let mut column = column.max(1);
    let count = cabinet.effective_column_count(level);
    if count >= 1 {
        column = column.min(count);
    }

    ResolvedPlacement {
        level,
        column: Some(column),
        is_locker: false,
    }
}

/// Placement used for a stored item whose cabinet reference dangles
pub fn unresolved_placement<T: Placeable + ?Sized>(item: &T) -> ResolvedPlacement {
    let location = item.location();
    ResolvedPlacement {
        level: location.level.unwrap_or(1),
        column: Some(location.column.unwrap_or(1)),
        is_locker: location.is_locker,
    }
}

/// Default placement for a newly selected cabinet
pub fn derive_default_placement(cabinet: &Cabinet) -> PlacementDefaults {
    match cabinet.lockers.first() {
        Some(locker) if cabinet.has_locker => PlacementDefaults {
            level: locker.level,
            column: locker.column.unwrap_or(1),
            is_locker: true,
        },
        _ => PlacementDefaults {
            level: 1,
            column: 1,
            is_locker: false,
        },
    }
}

/// Overwrite the four placement fields of an item.
///
/// The target is not validated against the destination cabinet.
pub fn move_item<T: Placeable>(mut item: T, target: &MoveTarget) -> T {
    let location = item.location_mut();
    location.cabinet_id = target.cabinet_id.clone();
    location.level = Some(target.level);
    location.column = Some(target.column);
    location.is_locker = target.is_locker;
    item
}

/// Location template of a file type, if it names a default cabinet
pub fn placement_from_file_type(file_type: &FileType) -> Option<MoveTarget> {
    let cabinet_id = file_type.default_cabinet_id.clone()?;
    Some(MoveTarget {
        cabinet_id,
        level: file_type.default_level.unwrap_or(1),
        column: file_type.default_column.unwrap_or(1),
        is_locker: file_type.default_is_locker,
    })
}

/// Check whether a target addresses a rendered cell of its cabinet
pub fn check_target(cabinet: Option<&Cabinet>, target: &MoveTarget) -> TargetCheck {
    let Some(cabinet) = cabinet else {
        return TargetCheck::UnknownCabinet;
    };
    let Ok(layout) = compute_layout(cabinet) else {
        return TargetCheck::InvalidCabinet;
    };
    match layout.cell_at(target.level, Some(target.column)) {
        None => TargetCheck::OutsideLayout,
        Some(cell) if cell.is_locker != target.is_locker => TargetCheck::LockerMismatch,
        Some(_) => TargetCheck::Valid,
    }
}

/// Cells a move dialog should offer, optionally only locker cells
pub fn placement_choices(layout: &Layout, lockers_only: bool) -> Vec<Cell> {
    layout
        .cells()
        .into_iter()
        .filter(|cell| !lockers_only || cell.is_locker)
        .collect()
}
