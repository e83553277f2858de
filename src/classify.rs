//! Split fetched records by id prefix and by field.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::info;

use crate::error::Result;
use crate::store::{write_json, Records};

/// Record groups nobody downstream wants: localization, trivia, translations.
/// Checked in order, first match wins.
const IGNORED: &[(&str, &str)] = &[
    ("Data:DST_Strings", "DST_Strings"),
    ("Data:DS_Strings", "DS_Strings"),
    ("Data:HomepageTrivia", "HomepageTrivia"),
    ("Data:ItemTranslation", "ItemTranslation"),
];

#[derive(Debug, PartialEq, Eq)]
pub enum Route {
    Ignored(&'static str),
    Kept,
}

pub fn route(key: &str) -> Route {
    IGNORED
        .iter()
        .find(|(prefix, _)| key.starts_with(prefix))
        .map(|(_, label)| Route::Ignored(*label))
        .unwrap_or(Route::Kept)
}

/// Field of a record key: between the namespace `:` and the first `.`.
/// `Data:ItemTable.axe` -> `ItemTable`.
pub fn field_of(key: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^(?:[^:.]*:)?([^.]*)").unwrap());

    let field = re
        .captures(key)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or_default();
    if field.is_empty() {
        return "_".to_string();
    }
    field.replace(['/', '\\'], "_")
}

#[derive(Debug, Default)]
pub struct Partitioning {
    pub kept: Records,
    pub ignored: BTreeMap<&'static str, usize>,
    pub fields: BTreeMap<String, Records>,
}

pub fn partition(records: Records) -> Partitioning {
    let mut p = Partitioning::default();

    for (key, value) in records {
        match route(&key) {
            Route::Ignored(label) => *p.ignored.entry(label).or_default() += 1,
            Route::Kept => {
                p.kept.insert(key, value);
            }
        }
    }

    for (key, value) in &p.kept {
        p.fields
            .entry(field_of(key))
            .or_default()
            .insert(key.clone(), value.clone());
    }

    p
}

/// Write the kept partition to `filtered` and each field partition to `<Field>.json`
/// inside `workdir`.
pub fn write_partitions(p: &Partitioning, workdir: &Path, filtered: &str) -> Result<()> {
    write_json(&workdir.join(filtered), &p.kept)?;
    for (field, records) in &p.fields {
        info!("Field = {}, NumItems = {}", field, records.len());
        write_json(&workdir.join(format!("{}.json", field)), records)?;
    }
    Ok(())
}
