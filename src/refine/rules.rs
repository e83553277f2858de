//! Field -> tag rules for `ItemData` records.
//!
//! Each entry names the fields it covers and how a value turns into a tag.
//! Adding a field means adding a row to [`ITEM_RULES`].

use serde_json::Value;

use crate::error::{Result, WikiError};
use crate::utils::is_true;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Nothing,
    Fixed(&'static str),
    /// The field name itself.
    Field,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    Fixed(&'static str),
    /// The field name with underscores removed.
    CompactField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Number that must be > 0.
    Positive(Label),
    /// Value that must be a truthy sentinel.
    Truthy(&'static str),
    /// Tag on presence, any value.
    Present(&'static str),
    /// > 0 and == 0 map to distinct tags, < 0 is rejected.
    NonNegative {
        positive: &'static str,
        zero: &'static str,
    },
    /// Non-zero number -> `<field>_positive` / `<field>_negative`.
    Signed,
    /// String mapped through a closed table.
    Lookup(&'static [(&'static str, &'static str)]),
    /// `<prefix>_<lowercased string>`.
    Lowercase(Prefix),
}

pub const ITEM_RULES: &[(&[&str], Rule)] = &[
    (&["max_stack"], Rule::Positive(Label::Fixed("stackable"))),
    (&["floater"], Rule::Truthy("floater")),
    (&["perishtime"], Rule::Present("perishable")),
    (
        &["waterproof"],
        Rule::NonNegative {
            positive: "waterproof",
            zero: "waterproof_container",
        },
    ),
    (
        &["insulation_type"],
        Rule::Lookup(&[("winter", "insulation_winter"), ("summer", "insulation_summer")]),
    ),
    (
        &["insulation_value", "fuel_value", "maxfuel"],
        Rule::Positive(Label::Nothing),
    ),
    // armor and helmets
    (&["absorbpercent"], Rule::Positive(Label::Fixed("damageabsorb"))),
    (
        &["finiteuses", "planardamage", "planardefense", "maxcondition"],
        Rule::Positive(Label::Field),
    ),
    (
        &["healthvalue", "sanityvalue", "hungervalue", "dapperness"],
        Rule::Signed,
    ),
    // ice_staff, blowdart_fire and friends have damage = 0
    (&["damage"], Rule::Present("weapon")),
    (
        &["foodtype", "secondaryfoodtype"],
        Rule::Lowercase(Prefix::Fixed("foodtype")),
    ),
    (
        &["fuel_type", "fueled_type"],
        Rule::Lowercase(Prefix::CompactField),
    ),
];

pub fn find_rule(field: &str) -> Option<Rule> {
    ITEM_RULES
        .iter()
        .find(|(fields, _)| fields.contains(&field))
        .map(|(_, rule)| *rule)
}

impl Rule {
    /// Tag produced by `value` in `field`, if any. `record` only labels errors.
    pub fn apply(&self, record: &str, field: &str, value: &Value) -> Result<Option<String>> {
        let tag = match *self {
            Rule::Positive(label) => {
                if number(record, field, value)? <= 0.0 {
                    return Err(WikiError::malformed(record, field, value, "a positive number"));
                }
                match label {
                    Label::Nothing => None,
                    Label::Fixed(tag) => Some(tag.to_string()),
                    Label::Field => Some(field.to_string()),
                }
            }
            Rule::Truthy(tag) => {
                if !is_true(value) {
                    return Err(WikiError::malformed(record, field, value, "true"));
                }
                Some(tag.to_string())
            }
            Rule::Present(tag) => Some(tag.to_string()),
            Rule::NonNegative { positive, zero } => {
                let n = number(record, field, value)?;
                if n > 0.0 {
                    Some(positive.to_string())
                } else if n == 0.0 {
                    Some(zero.to_string())
                } else {
                    return Err(WikiError::malformed(record, field, value, "a number >= 0"));
                }
            }
            Rule::Signed => {
                let n = number(record, field, value)?;
                if n > 0.0 {
                    Some(format!("{}_positive", field))
                } else if n < 0.0 {
                    Some(format!("{}_negative", field))
                } else {
                    None
                }
            }
            Rule::Lookup(table) => {
                let s = string(record, field, value)?;
                let tag = table
                    .iter()
                    .find(|(from, _)| *from == s)
                    .map(|(_, to)| to.to_string())
                    .ok_or_else(|| WikiError::malformed(record, field, value, "a known value"))?;
                Some(tag)
            }
            Rule::Lowercase(prefix) => {
                let s = string(record, field, value)?;
                let prefix = match prefix {
                    Prefix::Fixed(p) => p.to_string(),
                    Prefix::CompactField => field.replace('_', ""),
                };
                Some(format!("{}_{}", prefix, s.to_lowercase()))
            }
        };
        Ok(tag)
    }
}

fn number(record: &str, field: &str, value: &Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| WikiError::malformed(record, field, value, "a number"))
}

fn string<'a>(record: &str, field: &str, value: &'a Value) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| WikiError::malformed(record, field, value, "a string"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tag(field: &str, value: Value) -> Result<Option<String>> {
        let rule = find_rule(field).expect("rule");
        rule.apply("Data:ItemData.test", field, &value)
    }

    #[test]
    fn every_field_has_one_rule() {
        let mut seen = std::collections::HashSet::new();
        for (fields, _) in ITEM_RULES {
            for f in *fields {
                assert!(seen.insert(*f), "field {} listed twice", f);
            }
        }
        assert!(find_rule("no_such_field").is_none());
    }

    #[test]
    fn waterproof_by_sign() {
        assert_eq!(tag("waterproof", json!(0.2)).unwrap().as_deref(), Some("waterproof"));
        assert_eq!(
            tag("waterproof", json!(0)).unwrap().as_deref(),
            Some("waterproof_container")
        );
        assert!(tag("waterproof", json!(-0.1)).is_err());
    }

    #[test]
    fn positive_fields() {
        assert_eq!(tag("max_stack", json!(40)).unwrap().as_deref(), Some("stackable"));
        assert!(tag("max_stack", json!(0)).is_err());
        assert!(tag("max_stack", json!("40")).is_err());

        assert_eq!(tag("fuel_value", json!(90)).unwrap(), None);
        assert!(tag("maxfuel", json!(-1)).is_err());

        assert_eq!(tag("absorbpercent", json!(0.8)).unwrap().as_deref(), Some("damageabsorb"));
        assert_eq!(tag("finiteuses", json!(100)).unwrap().as_deref(), Some("finiteuses"));
        assert_eq!(tag("planardefense", json!(10)).unwrap().as_deref(), Some("planardefense"));
    }

    #[test]
    fn signed_stats() {
        assert_eq!(
            tag("healthvalue", json!(20)).unwrap().as_deref(),
            Some("healthvalue_positive")
        );
        assert_eq!(
            tag("sanityvalue", json!(-15)).unwrap().as_deref(),
            Some("sanityvalue_negative")
        );
        assert_eq!(tag("dapperness", json!(0)).unwrap(), None);
    }

    #[test]
    fn enumerated_and_lowercased() {
        assert_eq!(
            tag("insulation_type", json!("winter")).unwrap().as_deref(),
            Some("insulation_winter")
        );
        assert!(matches!(
            tag("insulation_type", json!("spring")),
            Err(WikiError::MalformedValue { .. })
        ));

        assert_eq!(tag("foodtype", json!("MEAT")).unwrap().as_deref(), Some("foodtype_meat"));
        assert_eq!(
            tag("secondaryfoodtype", json!("VEGGIE")).unwrap().as_deref(),
            Some("foodtype_veggie")
        );
        assert_eq!(tag("fuel_type", json!("BURNABLE")).unwrap().as_deref(), Some("fueltype_burnable"));
        assert_eq!(tag("fueled_type", json!("USAGE")).unwrap().as_deref(), Some("fueledtype_usage"));
    }

    #[test]
    fn presence_and_truthy() {
        assert_eq!(tag("damage", json!(0)).unwrap().as_deref(), Some("weapon"));
        assert_eq!(tag("perishtime", json!(4800)).unwrap().as_deref(), Some("perishable"));
        assert_eq!(tag("floater", json!("true")).unwrap().as_deref(), Some("floater"));
        assert!(tag("floater", json!(false)).is_err());
    }
}
