use crate::catalog::ActionCatalog;
use crate::codec;
use crate::error::{GambitError, Warning};
use crate::model::{LoopCount, MonsterAttrs, MonsterEntry, PackDocument, PackType};
use crate::statics;
use crate::value::PackValue;
use indexmap::IndexMap;

/// Result of a best-effort import.
#[derive(Debug, Clone)]
pub struct Imported {
    pub document: PackDocument,
    pub warnings: Vec<Warning>,
}

/// Builds the document model from JSON text.
///
/// Only unparseable text or a missing/non-object category aborts the import; every
/// per-monster or per-rule problem is replaced by a default and reported as a warning.
pub fn import(text: &str, catalog: &ActionCatalog) -> Result<Imported, GambitError> {
    let root = PackValue::parse(text)?;
    let (category, monsters) = category_of(&root)?;

    let mut document = PackDocument::new(category);
    let mut warnings = Vec::new();

    for (name, value) in monsters {
        let Some(monster) = value.as_object() else {
            warnings.push(
                Warning::monster(
                    name,
                    format!("expected an object, found {}; skipped", value.type_name()),
                )
                .logged(),
            );
            continue;
        };
        import_monster(&mut document, name, monster, catalog, &mut warnings);
    }

    log::debug!(
        "imported {:?}: {} monsters, {} rules, {} warnings",
        document.category,
        document.monster_count(),
        document.rule_count(),
        warnings.len()
    );

    Ok(Imported { document, warnings })
}

/// The single top-level key and its monster map.
pub(crate) fn category_of(
    root: &PackValue,
) -> Result<(&str, &IndexMap<String, PackValue>), GambitError> {
    let obj = root
        .as_object()
        .ok_or(GambitError::NotAnObject(root.type_name()))?;
    let (category, monsters) = obj.first().ok_or(GambitError::MissingDiscriminator)?;
    let monsters = monsters
        .as_object()
        .ok_or_else(|| GambitError::MonstersNotObject {
            category: category.clone(),
            found: monsters.type_name(),
        })?;
    Ok((category.as_str(), monsters))
}

fn import_monster(
    document: &mut PackDocument,
    name: &str,
    monster: &IndexMap<String, PackValue>,
    catalog: &ActionCatalog,
    warnings: &mut Vec<Warning>,
) {
    let mut entry = MonsterEntry::new(name);
    entry.attrs = read_attrs(name, monster, warnings);

    let pack = monster
        .get(statics::GP_KEY_GAMBIT_PACK)
        .and_then(|v| v.as_object());
    if let Some(v) = pack.and_then(|p| p.get(statics::GP_KEY_LOOP_COUNT)) {
        entry.loop_count = match v.as_i64().and_then(LoopCount::from_wire) {
            Some(lc) => lc,
            None => {
                warnings.push(
                    Warning::monster(
                        name,
                        format!(
                            "invalid {} {}, using 1",
                            statics::GP_KEY_LOOP_COUNT,
                            v.to_json_compact()
                        ),
                    )
                    .logged(),
                );
                LoopCount::default()
            }
        };
    }

    let Some(time_lines) = pack
        .and_then(|p| p.get(statics::GP_KEY_TIME_LINES))
        .and_then(|v| v.as_array())
    else {
        warnings.push(
            Warning::monster(
                name,
                format!(
                    "missing {}.{}; loaded with no rules",
                    statics::GP_KEY_GAMBIT_PACK,
                    statics::GP_KEY_TIME_LINES
                ),
            )
            .logged(),
        );
        entry.has_rule_container = false;
        document.push_monster(entry, Vec::new());
        return;
    };

    entry.pack_type = detect_pack_type(time_lines);

    let mut rules = Vec::with_capacity(time_lines.len());
    for (idx, item) in time_lines.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            warnings.push(
                Warning::rule(
                    name,
                    idx,
                    format!("expected an object, found {}; skipped", item.type_name()),
                )
                .logged(),
            );
            continue;
        };
        let decoded = codec::decode(obj, entry.pack_type, catalog);
        warnings.extend(
            decoded
                .issues
                .into_iter()
                .map(|issue| Warning::rule(name, idx, issue).logged()),
        );
        rules.push(decoded.rule);
    }

    document.push_monster(entry, rules);
}

/// Cool-down driven packs are recognised by their first rule.
fn detect_pack_type(time_lines: &[PackValue]) -> PackType {
    let Some(first) = time_lines.first() else {
        return PackType::TimeLine;
    };
    let has_cool_down = first.get(statics::GP_RULE_COOL_DOWN).is_some();
    let has_timing = first.get(statics::GP_RULE_TIMING).is_some();
    if has_cool_down && !has_timing {
        PackType::RuleSet
    } else {
        PackType::TimeLine
    }
}

fn read_attrs(
    name: &str,
    monster: &IndexMap<String, PackValue>,
    warnings: &mut Vec<Warning>,
) -> MonsterAttrs {
    let mut attrs = MonsterAttrs::default();

    if let Some(v) = monster.get(statics::GP_KEY_ATTACK_RANGE) {
        match v.as_f64() {
            Some(r) if r.is_finite() && r >= 0.0 => attrs.attack_range = r,
            _ => {
                attrs.attack_range_unparsed = true;
                warnings.push(
                    Warning::monster(
                        name,
                        format!(
                            "invalid {} {}, using 0; the document value is kept",
                            statics::GP_KEY_ATTACK_RANGE,
                            v.to_json_compact()
                        ),
                    )
                    .logged(),
                );
            }
        }
    }

    if let Some(v) = monster.get(statics::GP_KEY_IS_RANGED) {
        match v.as_bool() {
            Some(b) => attrs.is_ranged = b,
            None => {
                attrs.is_ranged_unparsed = true;
                warnings.push(
                    Warning::monster(
                        name,
                        format!(
                            "invalid {} {}, using false; the document value is kept",
                            statics::GP_KEY_IS_RANGED,
                            v.to_json_compact()
                        ),
                    )
                    .logged(),
                );
            }
        }
    }

    attrs.base_id = id_text(monster.get(statics::GP_KEY_BASE_ID));
    attrs.name_id = id_text(monster.get(statics::GP_KEY_NAME_ID));
    attrs
}

/// Integer ids become their decimal text. Anything else keeps its source text so the
/// synchronizer can tell it is not an integer and leave the document value alone.
fn id_text(value: Option<&PackValue>) -> String {
    match value {
        None => "0".to_string(),
        Some(v) => match (v.as_i64(), v.as_str()) {
            (Some(n), _) => n.to_string(),
            (None, Some(s)) => s.trim().to_string(),
            _ => v.to_json_compact(),
        },
    }
}
