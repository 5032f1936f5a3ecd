//! Data-driven content: classes, items, skills, characters, teams and
//! accounts.
//!
//! Content is read once at startup into a [`Catalog`] and shared by every
//! room. The catalog never appears in battle state; rooms only see the
//! [`duel_core::CharacterState`]s it aggregates for them.

pub mod catalog;
pub mod model;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use catalog::{AggregatedMember, Catalog, ContentError};
pub use model::{
    Account, CharacterDefinition, ClassDefinition, ItemDefinition, ItemId, ItemSlot,
    TeamDefinition, TeamId, TeamMember,
};

#[cfg(feature = "loaders")]
pub use loaders::{ContentFactory, LoadResult};
