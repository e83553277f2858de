use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::rules::find_rule;
use crate::error::{Result, WikiError};
use crate::store::Records;
use crate::utils::str_field;

/// Tagged view of an `ItemData` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub code_name: String,
    pub tags: Vec<String>,
}

/// What the tagging pass saw besides the tags themselves.
#[derive(Debug, Default)]
pub struct TagReport {
    /// Fields with no rule; worth a look, never fatal.
    pub unknown_keys: BTreeSet<String>,
    pub all_tags: BTreeSet<String>,
    pub dropped: usize,
}

/// Tags for one record, from the fields of its embedded `json_data` document.
/// Fields without a rule are pushed to `unknown`.
pub fn item_tags(
    key: &str,
    record: &Value,
    unknown: &mut BTreeSet<String>,
) -> Result<BTreeSet<String>> {
    let raw = record
        .get("json_data")
        .ok_or_else(|| WikiError::missing(key, "json_data"))?;
    let text = raw
        .as_str()
        .ok_or_else(|| WikiError::malformed(key, "json_data", raw, "a JSON string"))?;
    let data: BTreeMap<String, Value> = serde_json::from_str(text)?;

    let mut tags = BTreeSet::new();
    for (field, value) in &data {
        match find_rule(field) {
            Some(rule) => {
                if let Some(tag) = rule.apply(key, field, value)? {
                    tags.insert(tag);
                }
            }
            None => {
                unknown.insert(field.clone());
            }
        }
    }
    Ok(tags)
}

/// Tag every item; untagged items are left out of the result.
pub fn tag_items(records: &Records) -> Result<(BTreeMap<String, TaggedItem>, TagReport)> {
    let mut result = BTreeMap::new();
    let mut report = TagReport::default();

    for (key, record) in records {
        let tags = item_tags(key, record, &mut report.unknown_keys)?;
        if tags.is_empty() {
            debug!("{} has no tags, dropped", key);
            report.dropped += 1;
            continue;
        }

        let id = str_field(record, "_id")
            .ok_or_else(|| WikiError::missing(key, "_id"))?
            .to_string();
        let code_name = str_field(record, "code_name")
            .ok_or_else(|| WikiError::missing(key, "code_name"))?
            .to_string();

        report.all_tags.extend(tags.iter().cloned());
        result.insert(
            key.clone(),
            TaggedItem {
                id,
                code_name,
                tags: tags.into_iter().collect(),
            },
        );
    }

    Ok((result, report))
}
