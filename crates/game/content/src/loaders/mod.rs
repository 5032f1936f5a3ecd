//! Loaders that read RON data files into content records.

pub mod factory;

pub use factory::ContentFactory;

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Parses a RON file holding a single list of records.
pub(crate) fn load_list<T: DeserializeOwned>(path: &Path) -> LoadResult<Vec<T>> {
    let content = read_file(path)?;
    ron::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}
