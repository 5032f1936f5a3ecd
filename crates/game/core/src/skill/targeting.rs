use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{Arity, CastError};
use crate::field::Field;
use crate::ids::{CharacterId, SkillId};

/// How a selection expands into the affected characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TargetingMode {
    /// Exactly one character.
    Single,
    /// Exactly two distinct characters.
    Pair,
    /// Everyone in the first target's row.
    Row,
    /// Everyone in the first target's column.
    Column,
    // Adjacency modes keep the caller's selection as given.
    AdjacentRow,
    AdjacentColumn,
    AdjacentBoth,
    /// Everyone on the first target's side.
    Area,
    /// Everyone on the field; the selection is ignored.
    All,
}

impl TargetingMode {
    pub const fn arity(self) -> Arity {
        match self {
            TargetingMode::Single => Arity::Exactly(1),
            TargetingMode::Pair => Arity::Exactly(2),
            TargetingMode::All => Arity::AtLeast(0),
            _ => Arity::AtLeast(1),
        }
    }

    /// Expands `selection` into the concrete target set.
    pub fn resolve(
        self,
        skill: SkillId,
        field: &dyn Field,
        selection: &[CharacterId],
    ) -> Result<Targets, CastError> {
        let arity = self.arity();
        if !arity.accepts(selection.len()) {
            return Err(CastError::TargetArity {
                skill,
                expected: arity,
                provided: selection.len(),
            });
        }

        let anchored = |query: fn(&dyn Field, CharacterId) -> Vec<CharacterId>| {
            let first = selection[0];
            let found = query(field, first);
            if found.is_empty() {
                Err(CastError::UnknownTarget(first))
            } else {
                Ok(Targets::Many(found))
            }
        };

        match self {
            TargetingMode::Single => Ok(Targets::Single(selection[0])),
            TargetingMode::Pair => {
                if selection[0] == selection[1] {
                    return Err(CastError::DuplicateTarget { skill });
                }
                Ok(Targets::Many(selection.to_vec()))
            }
            TargetingMode::Row => anchored(|field, id| field.same_row(id)),
            TargetingMode::Column => anchored(|field, id| field.same_column(id)),
            TargetingMode::Area => anchored(|field, id| field.same_area(id)),
            TargetingMode::AdjacentRow
            | TargetingMode::AdjacentColumn
            | TargetingMode::AdjacentBoth => Ok(Targets::Many(selection.to_vec())),
            TargetingMode::All => Ok(Targets::Many(field.all())),
        }
    }
}

/// Resolved targets of a cast: a single character xor a list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Targets {
    Single(CharacterId),
    Many(Vec<CharacterId>),
}

impl Targets {
    pub fn as_slice(&self) -> &[CharacterId] {
        match self {
            Targets::Single(id) => std::slice::from_ref(id),
            Targets::Many(ids) => ids,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn contains(&self, id: CharacterId) -> bool {
        self.as_slice().contains(&id)
    }

    pub fn first(&self) -> Option<CharacterId> {
        self.as_slice().first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{GridField, Slot};
    use crate::ids::Side;

    const SKILL: SkillId = SkillId(1);

    fn field() -> GridField {
        let mut field = GridField::new(2, 2);
        field.place(CharacterId(1), Slot::new(Side::One, 0, 0)).unwrap();
        field.place(CharacterId(2), Slot::new(Side::One, 0, 1)).unwrap();
        field.place(CharacterId(3), Slot::new(Side::Two, 0, 0)).unwrap();
        field.place(CharacterId(4), Slot::new(Side::Two, 1, 0)).unwrap();
        field
    }

    #[test]
    fn single_requires_exactly_one() {
        let field = field();
        assert_eq!(
            TargetingMode::Single.resolve(SKILL, &field, &[CharacterId(3)]),
            Ok(Targets::Single(CharacterId(3)))
        );
        assert_eq!(
            TargetingMode::Single.resolve(SKILL, &field, &[CharacterId(3), CharacterId(4)]),
            Err(CastError::TargetArity {
                skill: SKILL,
                expected: Arity::Exactly(1),
                provided: 2,
            })
        );
    }

    #[test]
    fn pair_requires_two_distinct() {
        let field = field();
        assert!(matches!(
            TargetingMode::Pair.resolve(SKILL, &field, &[CharacterId(3)]),
            Err(CastError::TargetArity { .. })
        ));
        assert_eq!(
            TargetingMode::Pair.resolve(SKILL, &field, &[CharacterId(3), CharacterId(3)]),
            Err(CastError::DuplicateTarget { skill: SKILL })
        );
    }

    #[test]
    fn row_and_column_anchor_on_first_target() {
        let field = field();
        assert_eq!(
            TargetingMode::Row.resolve(SKILL, &field, &[CharacterId(2)]),
            Ok(Targets::Many(vec![CharacterId(1), CharacterId(2)]))
        );
        assert_eq!(
            TargetingMode::Column.resolve(SKILL, &field, &[CharacterId(3), CharacterId(1)]),
            Ok(Targets::Many(vec![CharacterId(3), CharacterId(4)]))
        );
        assert_eq!(
            TargetingMode::Row.resolve(SKILL, &field, &[CharacterId(99)]),
            Err(CastError::UnknownTarget(CharacterId(99)))
        );
    }

    #[test]
    fn area_all_and_adjacent() {
        let field = field();
        assert_eq!(
            TargetingMode::Area.resolve(SKILL, &field, &[CharacterId(4)]).unwrap().len(),
            2
        );
        assert_eq!(TargetingMode::All.resolve(SKILL, &field, &[]).unwrap().len(), 4);
        assert_eq!(
            TargetingMode::AdjacentBoth.resolve(SKILL, &field, &[CharacterId(2), CharacterId(1)]),
            Ok(Targets::Many(vec![CharacterId(2), CharacterId(1)]))
        );
    }
}
