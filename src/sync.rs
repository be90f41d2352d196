//! Re-projects an edited [`PackDocument`] onto the previous document text.
//!
//! The previous text is parsed into a raw value tree so fields the model does not
//! know about survive. Only the monsters present in the model are touched, and only
//! their monster-level fields and rule arrays.

use crate::codec;
use crate::error::{GambitError, Warning};
use crate::model::{LoopCount, MonsterEntry, PackDocument};
use crate::statics;
use crate::value::{LineEnding, PackValue};
use indexmap::IndexMap;

/// Output formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub indent: usize,
    pub line_ending: LineEnding,
    pub trailing_newline: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            indent: statics::DEFAULT_INDENT,
            line_ending: LineEnding::Lf,
            trailing_newline: false,
        }
    }
}

impl SyncOptions {
    /// Keeps the newline style of the text being replaced.
    pub fn detect(previous: &str) -> Self {
        Self {
            line_ending: LineEnding::detect(previous.as_bytes()),
            trailing_newline: previous.ends_with('\n'),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Synced {
    pub text: String,
    pub warnings: Vec<Warning>,
}

pub fn synchronize(document: &PackDocument, previous: &str) -> Result<Synced, GambitError> {
    synchronize_with(document, previous, &SyncOptions::detect(previous))
}

/// Produces new document text; `previous` is never modified. Fails only when
/// `previous` does not parse or lacks the document's category key.
pub fn synchronize_with(
    document: &PackDocument,
    previous: &str,
    options: &SyncOptions,
) -> Result<Synced, GambitError> {
    let mut root = PackValue::parse(previous)?;
    let root_type = root.type_name();
    let root_obj = root
        .as_object_mut()
        .ok_or(GambitError::NotAnObject(root_type))?;
    if root_obj.is_empty() {
        return Err(GambitError::MissingDiscriminator);
    }
    let monsters = root_obj
        .get_mut(&document.category)
        .ok_or_else(|| GambitError::CategoryNotFound {
            category: document.category.clone(),
        })?;
    let monsters_type = monsters.type_name();
    let monsters = monsters
        .as_object_mut()
        .ok_or_else(|| GambitError::MonstersNotObject {
            category: document.category.clone(),
            found: monsters_type,
        })?;

    let mut warnings = Vec::new();
    for (_, entry) in document.monsters() {
        let Some(node) = monsters.get_mut(&entry.name) else {
            warnings.push(Warning::monster(&entry.name, "not in document; skipped").logged());
            continue;
        };
        let node_type = node.type_name();
        let Some(node) = node.as_object_mut() else {
            warnings.push(
                Warning::monster(
                    &entry.name,
                    format!("expected an object, found {node_type}; skipped"),
                )
                .logged(),
            );
            continue;
        };
        write_monster(node, entry, &mut warnings);
    }

    let mut text = root.to_json_pretty(options.indent, options.line_ending.as_str());
    if options.trailing_newline {
        text.push_str(options.line_ending.as_str());
    }
    log::debug!(
        "synchronized {:?}: {} monsters, {} bytes",
        document.category,
        document.monster_count(),
        text.len()
    );
    Ok(Synced { text, warnings })
}

fn write_monster(
    node: &mut IndexMap<String, PackValue>,
    entry: &MonsterEntry,
    warnings: &mut Vec<Warning>,
) {
    // All rules carry the same copy; the first one stands for the monster.
    let attrs = entry
        .rules()
        .first()
        .map(|r| r.monster_attrs())
        .unwrap_or(entry.attrs());

    match (attrs.parsed_base_id(), attrs.parsed_name_id()) {
        (Some(base_id), Some(name_id)) => {
            put(node, statics::GP_KEY_BASE_ID, PackValue::int(base_id), base_id == 0);
            put(node, statics::GP_KEY_NAME_ID, PackValue::int(name_id), name_id == 0);
        }
        _ => warnings.push(
            Warning::monster(
                &entry.name,
                format!(
                    "{} {:?} / {} {:?} are not both integers; kept previous values",
                    statics::GP_KEY_BASE_ID,
                    attrs.base_id,
                    statics::GP_KEY_NAME_ID,
                    attrs.name_id
                ),
            )
            .logged(),
        ),
    }
    if !attrs.attack_range_unparsed {
        put(
            node,
            statics::GP_KEY_ATTACK_RANGE,
            PackValue::real(attrs.attack_range),
            attrs.attack_range == 0.0,
        );
    }
    if !attrs.is_ranged_unparsed {
        put(
            node,
            statics::GP_KEY_IS_RANGED,
            PackValue::Bool(attrs.is_ranged),
            !attrs.is_ranged,
        );
    }

    let writes_rules = entry.has_rule_container || !entry.rules().is_empty();
    if !writes_rules && entry.loop_count == LoopCount::default() {
        return;
    }

    let pack = node
        .entry(statics::GP_KEY_GAMBIT_PACK.to_string())
        .or_insert_with(|| PackValue::Object(IndexMap::new()));
    if pack.as_object().is_none() {
        warnings.push(
            Warning::monster(
                &entry.name,
                format!(
                    "{} was a {}; replaced with an object",
                    statics::GP_KEY_GAMBIT_PACK,
                    pack.type_name()
                ),
            )
            .logged(),
        );
        *pack = PackValue::Object(IndexMap::new());
    }
    let PackValue::Object(pack) = pack else {
        return;
    };

    put(
        pack,
        statics::GP_KEY_LOOP_COUNT,
        PackValue::int(entry.loop_count.to_wire()),
        entry.loop_count == LoopCount::default(),
    );
    if writes_rules {
        let time_lines = entry
            .rules()
            .iter()
            .map(|(_, rule)| codec::encode(rule, entry.pack_type))
            .collect();
        pack.insert(
            statics::GP_KEY_TIME_LINES.to_string(),
            PackValue::Array(time_lines),
        );
    }
}

/// Overwrites `key` when the value changed. A missing key is only added when the
/// value is not the import default, so untouched documents keep their shape.
fn put(map: &mut IndexMap<String, PackValue>, key: &str, value: PackValue, is_default: bool) {
    match map.get_mut(key) {
        Some(existing) => {
            if *existing != value {
                *existing = value;
            }
        }
        None => {
            if !is_default {
                map.insert(key.to_string(), value);
            }
        }
    }
}
