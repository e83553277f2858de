use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{Result, WikiError};
use crate::store::Records;
use crate::utils::{is_true, str_field};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attitude {
    Hostile,
    Passive,
    Neutral,
}

impl Attitude {
    /// Wiki spelling: 主动 / 被动 / 中立.
    pub fn from_wiki(s: &str) -> Option<Self> {
        match s {
            "主动" => Some(Attitude::Hostile),
            "被动" => Some(Attitude::Passive),
            "中立" => Some(Attitude::Neutral),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hostile" => Some(Attitude::Hostile),
            "passive" => Some(Attitude::Passive),
            "neutral" => Some(Attitude::Neutral),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Attitude::Hostile => "hostile",
            Attitude::Passive => "passive",
            Attitude::Neutral => "neutral",
        }
    }
}

/// Flag fields that become mob tags, in output order, with an optional rename.
pub const MOB_FLAGS: &[(&str, Option<&str>)] = &[
    ("surface", None),
    ("cave", None),
    ("ocean", None),
    ("l_island", None),
    ("tag_epic", None),
    ("tag_monster", None),
    ("tag_animal", None),
    ("tag_flying", None),
    ("tag_lunar_aligned", None),
    ("tag_shadow_aligned", None),
    ("follower", None),
    ("planarentity", None),
    ("sanity", Some("sanityaura")),
    ("item", Some("inventoryitem")),
];

/// Rewrite a raw `DSTMobInfo` record in place: truthy sentinels become
/// `true`, `attitude` becomes its English name.
pub fn normalize_mob(key: &str, record: &mut Value) -> Result<()> {
    match record.get("main_category") {
        Some(Value::String(c)) if c == "mob" => {}
        Some(other) => return Err(WikiError::malformed(key, "main_category", other, "\"mob\"")),
        None => return Err(WikiError::missing(key, "main_category")),
    }

    let fields = record
        .as_object_mut()
        .ok_or_else(|| WikiError::missing(key, "main_category"))?;
    for (field, value) in fields.iter_mut() {
        if field == "attitude" {
            let attitude = value
                .as_str()
                .and_then(Attitude::from_wiki)
                .ok_or_else(|| WikiError::malformed(key, field, value, "主动, 被动 or 中立"))?;
            *value = Value::String(attitude.as_str().to_string());
        } else if is_true(value) {
            *value = Value::Bool(true);
        }
    }
    Ok(())
}

pub fn normalize_mobs(records: &mut Records) -> Result<()> {
    for (key, record) in records.iter_mut() {
        normalize_mob(key, record)?;
    }
    Ok(())
}

/// How a mob is shown to a reader.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mob {
    pub name_cn: String,
    pub name_en: String,
    pub wiki_title: String,
}

impl Mob {
    pub fn from_record(key: &str, record: &Value) -> Result<Self> {
        let text = |field: &str| {
            str_field(record, field)
                .map(str::to_string)
                .ok_or_else(|| WikiError::missing(key, field))
        };
        Ok(Mob {
            name_cn: text("name_cn")?,
            name_en: text("name_en")?,
            wiki_title: text("title")?,
        })
    }
}

/// Tags of a normalized mob: set flags in [`MOB_FLAGS`] order, then the attitude.
pub fn mob_tags(key: &str, record: &Value) -> Result<Vec<String>> {
    let mut tags = Vec::new();
    for (field, rename) in MOB_FLAGS {
        let value = record
            .get(*field)
            .ok_or_else(|| WikiError::missing(key, field))?;
        if value == &Value::Bool(true) {
            tags.push(rename.unwrap_or(field).to_string());
        }
    }

    let attitude = record
        .get("attitude")
        .ok_or_else(|| WikiError::missing(key, "attitude"))?;
    let attitude = attitude
        .as_str()
        .and_then(Attitude::parse)
        .ok_or_else(|| WikiError::malformed(key, "attitude", attitude, "hostile, passive or neutral"))?;
    tags.push(format!("attitude_{}", attitude.as_str()));

    Ok(tags)
}

/// Mob -> tags over every normalized record.
pub fn mob_filter(records: &Records) -> Result<BTreeMap<Mob, Vec<String>>> {
    records
        .iter()
        .map(|(key, record)| Ok((Mob::from_record(key, record)?, mob_tags(key, record)?)))
        .collect()
}
