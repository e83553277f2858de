use std::collections::{BTreeMap, BTreeSet};

use crate::error::Result;
use crate::refine::items::TaggedItem;
use crate::refine::mobs::{mob_filter, Mob};
use crate::store::Records;

/// In-memory mob and item filters built from the tagged documents.
#[derive(Debug, Default)]
pub struct Summary {
    pub mobs: BTreeMap<Mob, Vec<String>>,
    /// Prefab -> tags.
    pub items: BTreeMap<String, Vec<String>>,
}

impl Summary {
    pub fn build(mobs: &Records, items: &BTreeMap<String, TaggedItem>) -> Result<Self> {
        let mobs = mob_filter(mobs)?;
        let items = items
            .values()
            .map(|item| (item.code_name.clone(), item.tags.clone()))
            .collect();
        Ok(Summary { mobs, items })
    }

    pub fn mob_tags(&self) -> BTreeSet<&str> {
        self.mobs
            .values()
            .flat_map(|tags| tags.iter().map(String::as_str))
            .collect()
    }

    pub fn print(&self) {
        println!("Mobs: {}", self.mobs.len());
        println!("  tags: {}", self.mob_tags().into_iter().collect::<Vec<_>>().join(", "));
        println!("Items: {}", self.items.len());
        for (prefab, tags) in &self.items {
            println!("  {}: {}", prefab, tags.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refine::mobs::{normalize_mobs, MOB_FLAGS};
    use serde_json::json;

    #[test]
    fn builds_both_filters() {
        let mut mob = json!({
            "main_category": "mob",
            "name_cn": "蜘蛛",
            "name_en": "Spider",
            "title": "蜘蛛",
            "attitude": "主动",
        });
        for (flag, _) in MOB_FLAGS {
            mob[*flag] = json!(false);
        }
        mob["cave"] = json!("true");
        mob["tag_monster"] = json!("true");

        let mut mobs = Records::new();
        mobs.insert("Data:DSTMobInfo.spider".into(), mob);
        normalize_mobs(&mut mobs).unwrap();

        let mut items = BTreeMap::new();
        items.insert(
            "Data:ItemData.spear".to_string(),
            TaggedItem {
                id: "Data:ItemData.spear".into(),
                code_name: "spear".into(),
                tags: vec!["finiteuses".into(), "weapon".into()],
            },
        );

        let summary = Summary::build(&mobs, &items).unwrap();
        assert_eq!(summary.items["spear"], vec!["finiteuses", "weapon"]);
        let tags = summary.mob_tags();
        assert!(tags.contains("cave"));
        assert!(tags.contains("tag_monster"));
        assert!(tags.contains("attitude_hostile"));
        assert!(!tags.contains("surface"));
    }
}
