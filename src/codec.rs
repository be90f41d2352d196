//! Rule codec: one JSON rule object <-> one [`GambitRule`].
//!
//! The pack schema has no `enabled` flag. A disabled rule carries the inert pair
//! `condition: "None", actionId: 0` in its live keys and keeps the real values under
//! `originalCondition` / `originalActionId`. Presence of a shadow key is the only
//! signal that a rule is disabled.

use crate::catalog::ActionCatalog;
use crate::model::{Condition, GambitRule, MonsterAttrs, PackType};
use crate::statics;
use crate::value::PackValue;
use indexmap::IndexMap;

const KNOWN_KEYS: [&str; 10] = [
    statics::GP_RULE_CONDITION,
    statics::GP_RULE_ACTION_ID,
    statics::GP_RULE_ORIGINAL_CONDITION,
    statics::GP_RULE_ORIGINAL_ACTION_ID,
    statics::GP_RULE_HP_THRESHOLD,
    statics::GP_RULE_TIMING,
    statics::GP_RULE_COOL_DOWN,
    statics::GP_RULE_DESCRIPTION,
    statics::GP_RULE_ACTION_PARAM,
    statics::GP_RULE_RADIUS,
];

/// The condition/action pair as it should appear in the live keys and shadow keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WirePair<'a> {
    pub condition: &'a str,
    pub action_id: i64,
    pub shadow: Option<(&'a str, i64)>,
}

/// Soft-disable transform of the true pair. Enabled rules never carry shadow values.
pub fn wire_pair(enabled: bool, condition: &str, action_id: i64) -> WirePair<'_> {
    if enabled {
        WirePair {
            condition,
            action_id,
            shadow: None,
        }
    } else {
        WirePair {
            condition: statics::GP_DISABLED_CONDITION,
            action_id: statics::GP_DISABLED_ACTION_ID,
            shadow: Some((condition, action_id)),
        }
    }
}

/// A decoded rule plus the problems found on the way (missing/invalid fields that
/// were replaced by defaults).
#[derive(Debug, Clone)]
pub struct DecodedRule {
    pub rule: GambitRule,
    pub issues: Vec<String>,
}

/// Reads one rule object. Never fails; each substitution is reported in `issues`.
pub fn decode(
    obj: &IndexMap<String, PackValue>,
    pack_type: PackType,
    catalog: &ActionCatalog,
) -> DecodedRule {
    let mut issues = Vec::new();

    let shadow_condition = obj.get(statics::GP_RULE_ORIGINAL_CONDITION);
    let shadow_action = obj.get(statics::GP_RULE_ORIGINAL_ACTION_ID);
    let enabled = shadow_condition.is_none() && shadow_action.is_none();

    let (condition_key, condition_value) = match shadow_condition {
        Some(v) => (statics::GP_RULE_ORIGINAL_CONDITION, Some(v)),
        None => (statics::GP_RULE_CONDITION, obj.get(statics::GP_RULE_CONDITION)),
    };
    let mut condition_source = None;
    let condition = match condition_value {
        None => {
            issues.push(format!("missing {condition_key}, using None"));
            Condition::None
        }
        Some(v) => match (v.as_str(), v.as_str().and_then(Condition::from_wire)) {
            (Some(text), Some(c)) => {
                if text != c.wire_name() {
                    condition_source = Some((c, text.to_string()));
                }
                c
            }
            (Some(text), None) => {
                issues.push(format!(
                    "unknown {condition_key} {text:?}, treated as None and written back unchanged"
                ));
                condition_source = Some((Condition::None, text.to_string()));
                Condition::None
            }
            (None, _) => {
                issues.push(format!(
                    "{condition_key} {} is not a string, using None",
                    v.to_json_compact()
                ));
                Condition::None
            }
        },
    };

    let (action_key, action_value) = match shadow_action {
        Some(v) => (statics::GP_RULE_ORIGINAL_ACTION_ID, Some(v)),
        None => {
            if !enabled {
                issues.push(format!(
                    "disabled rule has no {}, using {}",
                    statics::GP_RULE_ORIGINAL_ACTION_ID,
                    statics::GP_RULE_ACTION_ID
                ));
            }
            (statics::GP_RULE_ACTION_ID, obj.get(statics::GP_RULE_ACTION_ID))
        }
    };
    let action_id = required_int(action_value, action_key, &mut issues);
    let action_param = required_int(
        obj.get(statics::GP_RULE_ACTION_PARAM),
        statics::GP_RULE_ACTION_PARAM,
        &mut issues,
    );

    let timing = match obj.get(statics::GP_RULE_TIMING) {
        Some(v) => Some(clamped_int(
            v,
            statics::GP_RULE_TIMING,
            statics::GP_TIMING_MIN,
            statics::GP_TIMING_MAX,
            &mut issues,
        ) as u16),
        None if pack_type == PackType::TimeLine => {
            issues.push(format!("missing {}, using 0", statics::GP_RULE_TIMING));
            Some(0)
        }
        None => None,
    };

    let cool_down = obj.get(statics::GP_RULE_COOL_DOWN).map(|v| {
        clamped_int(
            v,
            statics::GP_RULE_COOL_DOWN,
            0,
            i64::from(u32::MAX),
            &mut issues,
        ) as u32
    });

    let hp_threshold = obj.get(statics::GP_RULE_HP_THRESHOLD).map(|v| {
        clamped_int(
            v,
            statics::GP_RULE_HP_THRESHOLD,
            i64::from(statics::GP_HP_THRESHOLD_MIN),
            i64::from(statics::GP_HP_THRESHOLD_MAX),
            &mut issues,
        ) as u8
    });

    let radius = match obj.get(statics::GP_RULE_RADIUS) {
        None => None,
        Some(v) => match v.as_f64() {
            Some(r) if r.is_finite() && r >= 0.0 => Some(r),
            Some(r) if r.is_finite() => {
                issues.push(format!("negative {} {r}, using 0", statics::GP_RULE_RADIUS));
                Some(0.0)
            }
            _ => {
                issues.push(format!(
                    "invalid {} {}, dropped",
                    statics::GP_RULE_RADIUS,
                    v.to_json_compact()
                ));
                None
            }
        },
    };

    let description = match obj.get(statics::GP_RULE_DESCRIPTION).and_then(|v| v.as_str()) {
        Some(s) => s.to_string(),
        None => {
            let name = catalog.display_name(action_id);
            issues.push(format!(
                "missing {}, using {name:?}",
                statics::GP_RULE_DESCRIPTION
            ));
            name.to_string()
        }
    };

    let extra = obj
        .iter()
        .filter(|(k, _)| !KNOWN_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    DecodedRule {
        rule: GambitRule {
            condition,
            hp_threshold,
            action_id,
            action_param,
            timing,
            cool_down,
            radius,
            enabled,
            description,
            extra,
            condition_source,
            monster: MonsterAttrs::default(),
        },
        issues,
    }
}

/// Writes one rule object. `pack_type` decides which timing field is always present.
pub fn encode(rule: &GambitRule, pack_type: PackType) -> PackValue {
    let pair = wire_pair(rule.enabled, rule.condition_wire(), rule.action_id);
    let mut obj = IndexMap::new();

    obj.insert(
        statics::GP_RULE_CONDITION.to_string(),
        PackValue::from(pair.condition),
    );
    obj.insert(
        statics::GP_RULE_ACTION_ID.to_string(),
        PackValue::int(pair.action_id),
    );
    if let Some((condition, action_id)) = pair.shadow {
        obj.insert(
            statics::GP_RULE_ORIGINAL_CONDITION.to_string(),
            PackValue::from(condition),
        );
        obj.insert(
            statics::GP_RULE_ORIGINAL_ACTION_ID.to_string(),
            PackValue::int(action_id),
        );
    }
    if let Some(t) = rule.hp_threshold {
        obj.insert(
            statics::GP_RULE_HP_THRESHOLD.to_string(),
            PackValue::int(i64::from(t)),
        );
    }
    if pack_type == PackType::TimeLine || rule.timing.is_some() {
        obj.insert(
            statics::GP_RULE_TIMING.to_string(),
            PackValue::int(i64::from(rule.timing_value())),
        );
    }
    if pack_type == PackType::RuleSet || rule.cool_down.is_some() {
        obj.insert(
            statics::GP_RULE_COOL_DOWN.to_string(),
            PackValue::int(i64::from(rule.cool_down_value())),
        );
    }
    obj.insert(
        statics::GP_RULE_DESCRIPTION.to_string(),
        PackValue::from(rule.description.as_str()),
    );
    obj.insert(
        statics::GP_RULE_ACTION_PARAM.to_string(),
        PackValue::int(rule.action_param),
    );
    if let Some(r) = rule.radius {
        obj.insert(statics::GP_RULE_RADIUS.to_string(), PackValue::real(r));
    }
    for (k, v) in &rule.extra {
        obj.entry(k.clone()).or_insert_with(|| v.clone());
    }

    PackValue::Object(obj)
}

fn required_int(value: Option<&PackValue>, key: &str, issues: &mut Vec<String>) -> i64 {
    match value {
        None => {
            issues.push(format!("missing {key}, using 0"));
            0
        }
        Some(v) => v.as_i64().unwrap_or_else(|| {
            issues.push(format!("{key} {} is not an integer, using 0", v.to_json_compact()));
            0
        }),
    }
}

fn clamped_int(value: &PackValue, key: &str, min: i64, max: i64, issues: &mut Vec<String>) -> i64 {
    let Some(v) = value.as_i64() else {
        issues.push(format!(
            "{key} {} is not an integer, using {min}",
            value.to_json_compact()
        ));
        return min;
    };
    let clamped = v.clamp(min, max);
    if clamped != v {
        issues.push(format!("{key} {v} out of range, clamped to {clamped}"));
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, wire_pair};
    use crate::catalog::ActionCatalog;
    use crate::model::{Condition, PackType};
    use crate::value::PackValue;
    use pretty_assertions::assert_eq;

    fn rule_obj(text: &str) -> indexmap::IndexMap<String, PackValue> {
        PackValue::parse(text).unwrap().as_object().unwrap().clone()
    }

    #[test]
    fn wire_pair_enabled_has_no_shadow() {
        let p = wire_pair(true, "Self", 12);
        assert_eq!(p.condition, "Self");
        assert_eq!(p.action_id, 12);
        assert_eq!(p.shadow, None);
    }

    #[test]
    fn wire_pair_disabled_uses_sentinels() {
        let p = wire_pair(false, "Self", 12);
        assert_eq!(p.condition, "None");
        assert_eq!(p.action_id, 0);
        assert_eq!(p.shadow, Some(("Self", 12)));
    }

    #[test]
    fn decode_disabled_reads_shadow_values() {
        let obj = rule_obj(
            r#"{ "condition": "None", "actionId": 0, "originalCondition": "Self",
                 "originalActionId": 12, "timing": 5, "description": "Attack", "actionParam": 0 }"#,
        );
        let d = decode(&obj, PackType::TimeLine, &ActionCatalog::new());
        assert!(d.issues.is_empty(), "{:?}", d.issues);
        assert!(!d.rule.enabled);
        assert_eq!(d.rule.condition, Condition::SelfTarget);
        assert_eq!(d.rule.action_id, 12);
    }

    #[test]
    fn encode_after_decode_does_not_nest_shadow_keys() {
        let text = r#"{ "condition": "None", "actionId": 0, "originalCondition": "Player",
                        "originalActionId": 77, "timing": 9, "description": "Bite", "actionParam": 3 }"#;
        let obj = rule_obj(text);
        let once = encode(&decode(&obj, PackType::TimeLine, &ActionCatalog::new()).rule, PackType::TimeLine);
        assert_eq!(once, PackValue::Object(obj));

        let twice = encode(
            &decode(once.as_object().unwrap(), PackType::TimeLine, &ActionCatalog::new()).rule,
            PackType::TimeLine,
        );
        assert_eq!(twice, once);
    }

    #[test]
    fn re_enabling_drops_shadow_keys() {
        let obj = rule_obj(
            r#"{ "condition": "None", "actionId": 0, "originalCondition": "Ally",
                 "originalActionId": 5, "timing": 1, "description": "Cure", "actionParam": 0 }"#,
        );
        let mut rule = decode(&obj, PackType::TimeLine, &ActionCatalog::new()).rule;
        rule.enabled = true;
        let out = encode(&rule, PackType::TimeLine);
        assert_eq!(out.get("condition").and_then(|v| v.as_str()), Some("Ally"));
        assert_eq!(out.get("actionId").and_then(|v| v.as_i64()), Some(5));
        assert!(out.get("originalCondition").is_none());
        assert!(out.get("originalActionId").is_none());
    }

    #[test]
    fn decode_substitutes_defaults_and_reports() {
        let catalog = ActionCatalog::from_pairs([(9, "Stomp")]);
        let obj = rule_obj(r#"{ "condition": "Sideways", "actionId": 9 }"#);
        let d = decode(&obj, PackType::TimeLine, &catalog);
        assert_eq!(d.rule.condition, Condition::None);
        assert_eq!(d.rule.timing, Some(0));
        assert_eq!(d.rule.action_param, 0);
        assert_eq!(d.rule.description, "Stomp");
        // condition, actionParam, timing, description
        assert_eq!(d.issues.len(), 4, "{:?}", d.issues);
    }

    #[test]
    fn decode_clamps_out_of_range_values() {
        let obj = rule_obj(
            r#"{ "condition": "HPSelfPctLessThanTarget", "hpThreshold": 150, "actionId": 1,
                 "actionParam": 0, "timing": 1200, "coolDown": -4, "radius": -2,
                 "description": "x" }"#,
        );
        let d = decode(&obj, PackType::TimeLine, &ActionCatalog::new());
        assert_eq!(d.rule.hp_threshold, Some(100));
        assert_eq!(d.rule.timing, Some(999));
        assert_eq!(d.rule.cool_down, Some(0));
        assert_eq!(d.rule.radius, Some(0.0));
        assert_eq!(d.issues.len(), 4, "{:?}", d.issues);
    }

    #[test]
    fn rule_set_rules_always_write_cool_down() {
        let obj = rule_obj(
            r#"{ "condition": "Self", "actionId": 1, "actionParam": 0, "description": "x" }"#,
        );
        let d = decode(&obj, PackType::RuleSet, &ActionCatalog::new());
        assert!(d.issues.is_empty(), "{:?}", d.issues);
        assert_eq!(d.rule.timing, None);
        let out = encode(&d.rule, PackType::RuleSet);
        assert_eq!(out.get("coolDown").and_then(|v| v.as_i64()), Some(0));
        assert!(out.get("timing").is_none());
    }

    #[test]
    fn unknown_keys_pass_through() {
        let obj = rule_obj(
            r#"{ "condition": "BNpc", "actionId": 3, "actionParam": 1, "timing": 2,
                 "description": "Roar", "radius": 4.5, "comment": "keep me" }"#,
        );
        let rule = decode(&obj, PackType::TimeLine, &ActionCatalog::new()).rule;
        assert_eq!(rule.extra.len(), 1);
        assert_eq!(encode(&rule, PackType::TimeLine), PackValue::Object(obj));
    }

    #[test]
    fn unknown_shadow_condition_is_written_back() {
        let obj = rule_obj(
            r#"{ "condition": "None", "actionId": 0, "originalCondition": "EnemyNearest",
                 "originalActionId": 8, "timing": 2, "description": "Shoot", "actionParam": 0 }"#,
        );
        let d = decode(&obj, PackType::TimeLine, &ActionCatalog::new());
        assert_eq!(d.rule.condition, Condition::None);
        assert_eq!(d.issues.len(), 1, "{:?}", d.issues);
        assert_eq!(encode(&d.rule, PackType::TimeLine), PackValue::Object(obj));

        let mut enabled = d.rule.clone();
        enabled.enabled = true;
        let out = encode(&enabled, PackType::TimeLine);
        assert_eq!(out.get("condition").and_then(|v| v.as_str()), Some("EnemyNearest"));
        assert_eq!(out.get("actionId").and_then(|v| v.as_i64()), Some(8));
    }

    #[test]
    fn condition_spelling_survives_until_changed() {
        let obj = rule_obj(
            r#"{ "condition": "self", "actionId": 1, "timing": 0, "description": "x", "actionParam": 0 }"#,
        );
        let mut rule = decode(&obj, PackType::TimeLine, &ActionCatalog::new()).rule;
        assert_eq!(rule.condition, Condition::SelfTarget);
        assert_eq!(encode(&rule, PackType::TimeLine), PackValue::Object(obj));

        rule.condition = Condition::Ally;
        let out = encode(&rule, PackType::TimeLine);
        assert_eq!(out.get("condition").and_then(|v| v.as_str()), Some("Ally"));
    }
}
