//! Per-namespace refinement of the field partitions written by `filter`.
//!
//! - `items`: `ItemData` -> tagged items, via the rule table in `rules`
//! - `item_table`: `ItemTable` -> prefab name table
//! - `mobs`: `DSTMobInfo` -> normalized records and mob tags

pub mod item_table;
pub mod items;
pub mod mobs;
pub mod rules;
