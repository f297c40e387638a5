//! Resolve module - country name reconciliation

mod aliases;
mod resolver;

pub use aliases::AliasTable;
pub use resolver::{normalize_name, EntityResolver, MatchKind, Resolution};
