use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, WikiError};
use crate::store::Records;
use crate::utils::str_field;

const REQUIRED_KEYS: [&str; 8] = [
    "_id",
    "id",
    "display_name",
    "name_cn",
    "name_en",
    "item_img1",
    "main_category",
    "version",
];

const NAME_KEYS: [&str; 3] = ["display_name", "name_cn", "name_en"];

/// Prefab plus every distinct name it is known by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemNames {
    #[serde(rename = "_id")]
    pub id: String,
    pub prefab: String,
    pub names: Vec<String>,
}

pub fn item_names(key: &str, record: &Value) -> Result<ItemNames> {
    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|k| record.get(*k).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(WikiError::missing(key, &missing.join(", ")));
    }

    let text = |field: &str| -> Result<String> {
        str_field(record, field)
            .map(str::to_string)
            .ok_or_else(|| WikiError::malformed(key, field, &record[field], "a string"))
    };

    let names = NAME_KEYS
        .iter()
        .map(|k| text(k))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .unique()
        .collect();

    Ok(ItemNames {
        id: text("_id")?,
        prefab: text("id")?,
        names,
    })
}

/// Name table keyed by record `_id`.
pub fn name_table(records: &Records) -> Result<BTreeMap<String, ItemNames>> {
    records
        .iter()
        .map(|(key, record)| item_names(key, record).map(|n| (n.id.clone(), n)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(display: &str, cn: &str, en: &str) -> Value {
        json!({
            "_id": "Data:ItemTable.axe",
            "id": "axe",
            "display_name": display,
            "name_cn": cn,
            "name_en": en,
            "item_img1": "Axe.png",
            "main_category": "tool",
            "version": "DST",
        })
    }

    #[test]
    fn names_deduplicated_in_order() {
        let n = item_names("k", &row("斧头", "斧头", "Axe")).unwrap();
        assert_eq!(n.prefab, "axe");
        assert_eq!(n.names, vec!["斧头", "Axe"]);

        let n = item_names("k", &row("Axe", "斧头", "Axe")).unwrap();
        assert_eq!(n.names, vec!["Axe", "斧头"]);
    }

    #[test]
    fn missing_keys_are_named() {
        let mut r = row("a", "b", "c");
        r.as_object_mut().unwrap().remove("version");
        r.as_object_mut().unwrap().remove("item_img1");

        match item_names("Data:ItemTable.axe", &r) {
            Err(WikiError::MissingField { field, .. }) => {
                assert!(field.contains("version"));
                assert!(field.contains("item_img1"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn table_keyed_by_id() {
        let mut records = Records::new();
        records.insert("Data:ItemTable.axe".into(), row("斧头", "斧头", "Axe"));
        let table = name_table(&records).unwrap();
        assert_eq!(table["Data:ItemTable.axe"].names.len(), 2);
    }
}
