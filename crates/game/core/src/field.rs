//! Spatial queries over the two-sided battle grid.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{CharacterId, Side};

/// A cell on one side of the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub side: Side,
    pub row: u8,
    pub column: u8,
}

impl Slot {
    pub const fn new(side: Side, row: u8, column: u8) -> Self {
        Self { side, row, column }
    }
}

/// Selection queries consumed by targeting.
///
/// Results are ordered by slot (row-major) so targeting stays deterministic.
pub trait Field: Send + Sync + fmt::Debug {
    fn slot(&self, id: CharacterId) -> Option<Slot>;

    /// Characters on `side` in `row`.
    fn row(&self, side: Side, row: u8) -> Vec<CharacterId>;

    /// Characters on `side` in `column`.
    fn column(&self, side: Side, column: u8) -> Vec<CharacterId>;

    /// Every character on `side`.
    fn area(&self, side: Side) -> Vec<CharacterId>;

    /// Every character on the field.
    fn all(&self) -> Vec<CharacterId>;

    fn same_row(&self, id: CharacterId) -> Vec<CharacterId> {
        self.slot(id)
            .map(|slot| self.row(slot.side, slot.row))
            .unwrap_or_default()
    }

    fn same_column(&self, id: CharacterId) -> Vec<CharacterId> {
        self.slot(id)
            .map(|slot| self.column(slot.side, slot.column))
            .unwrap_or_default()
    }

    fn same_area(&self, id: CharacterId) -> Vec<CharacterId> {
        self.slot(id)
            .map(|slot| self.area(slot.side))
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("slot {row}x{column} is outside a {rows}x{columns} grid")]
    OutOfBounds {
        row: u8,
        column: u8,
        rows: u8,
        columns: u8,
    },

    #[error("slot already taken by {0}")]
    Occupied(CharacterId),
}

/// Fixed-size grid with one slot per character.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridField {
    rows: u8,
    columns: u8,
    slots: BTreeMap<CharacterId, Slot>,
}

impl GridField {
    pub fn new(rows: u8, columns: u8) -> Self {
        Self {
            rows,
            columns,
            slots: BTreeMap::new(),
        }
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    pub fn place(&mut self, id: CharacterId, slot: Slot) -> Result<(), PlacementError> {
        if slot.row >= self.rows || slot.column >= self.columns {
            return Err(PlacementError::OutOfBounds {
                row: slot.row,
                column: slot.column,
                rows: self.rows,
                columns: self.columns,
            });
        }
        if let Some((occupant, _)) = self
            .slots
            .iter()
            .find(|(other, taken)| **other != id && **taken == slot)
        {
            return Err(PlacementError::Occupied(*occupant));
        }
        self.slots.insert(id, slot);
        Ok(())
    }

    /// Places `id` in the first free slot of `side`, row-major.
    pub fn place_next(&mut self, id: CharacterId, side: Side) -> Result<Slot, PlacementError> {
        for row in 0..self.rows {
            for column in 0..self.columns {
                let slot = Slot::new(side, row, column);
                if !self.slots.values().any(|taken| *taken == slot) {
                    self.slots.insert(id, slot);
                    return Ok(slot);
                }
            }
        }
        Err(PlacementError::OutOfBounds {
            row: self.rows,
            column: self.columns,
            rows: self.rows,
            columns: self.columns,
        })
    }

    fn select(&self, keep: impl Fn(&Slot) -> bool) -> Vec<CharacterId> {
        let mut found: Vec<(Slot, CharacterId)> = self
            .slots
            .iter()
            .filter(|(_, slot)| keep(slot))
            .map(|(id, slot)| (*slot, *id))
            .collect();
        found.sort();
        found.into_iter().map(|(_, id)| id).collect()
    }
}

impl Field for GridField {
    fn slot(&self, id: CharacterId) -> Option<Slot> {
        self.slots.get(&id).copied()
    }

    fn row(&self, side: Side, row: u8) -> Vec<CharacterId> {
        self.select(|slot| slot.side == side && slot.row == row)
    }

    fn column(&self, side: Side, column: u8) -> Vec<CharacterId> {
        self.select(|slot| slot.side == side && slot.column == column)
    }

    fn area(&self, side: Side) -> Vec<CharacterId> {
        self.select(|slot| slot.side == side)
    }

    fn all(&self) -> Vec<CharacterId> {
        self.select(|_| true)
    }
}
