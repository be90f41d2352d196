//! In-memory gambit pack: monsters in document order, each owning an arena of rules.
//!
//! Rules are addressed by [`RuleHandle`], which stays valid while other rules are
//! added, removed or reordered. Monster-level attributes are duplicated onto every
//! rule; only the methods here write them, so all copies stay equal.

use crate::catalog::ActionCatalog;
use crate::error::EditError;
use crate::statics;
use crate::value::PackValue;
use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;

/// Target selector of a rule. The set is closed; unknown wire strings import as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Condition {
    #[default]
    None,
    SelfTarget,
    Player,
    PlayerAndAlly,
    Ally,
    BNpc,
    TopHateTarget,
    HpBelowThreshold,
}

impl Condition {
    pub const ALL: [Condition; 8] = [
        Condition::None,
        Condition::SelfTarget,
        Condition::Player,
        Condition::PlayerAndAlly,
        Condition::Ally,
        Condition::BNpc,
        Condition::TopHateTarget,
        Condition::HpBelowThreshold,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            Condition::None => "None",
            Condition::SelfTarget => "Self",
            Condition::Player => "Player",
            Condition::PlayerAndAlly => "PlayerAndAlly",
            Condition::Ally => "Ally",
            Condition::BNpc => "BNpc",
            Condition::TopHateTarget => "TopHateTarget",
            Condition::HpBelowThreshold => "HPSelfPctLessThanTarget",
        }
    }

    /// Exact match first, then case-insensitive. `HPBelowThreshold` is accepted as an alias.
    pub fn from_wire(name: &str) -> Option<Condition> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("HPBelowThreshold") {
            return Some(Condition::HpBelowThreshold);
        }
        Self::ALL
            .into_iter()
            .find(|c| c.wire_name() == name)
            .or_else(|| {
                Self::ALL
                    .into_iter()
                    .find(|c| c.wire_name().eq_ignore_ascii_case(name))
            })
    }

    pub fn label(self) -> &'static str {
        match self {
            Condition::None => statics::EN_COND_NONE,
            Condition::SelfTarget => statics::EN_COND_SELF,
            Condition::Player => statics::EN_COND_PLAYER,
            Condition::PlayerAndAlly => statics::EN_COND_PLAYER_AND_ALLY,
            Condition::Ally => statics::EN_COND_ALLY,
            Condition::BNpc => statics::EN_COND_BNPC,
            Condition::TopHateTarget => statics::EN_COND_TOP_HATE,
            Condition::HpBelowThreshold => statics::EN_COND_HP_BELOW,
        }
    }

    pub fn from_label(label: &str) -> Option<Condition> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Condition::from_wire(s).ok_or_else(|| format!("unknown condition {s:?}"))
    }
}

/// Which timing field drives a monster's rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackType {
    /// Fixed `timing` slot (0-999).
    #[default]
    TimeLine,
    /// `coolDown` in milliseconds.
    RuleSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    Times(u32),
    Infinite,
}

impl Default for LoopCount {
    fn default() -> Self {
        LoopCount::Times(1)
    }
}

impl LoopCount {
    pub fn to_wire(self) -> i64 {
        match self {
            LoopCount::Times(n) => i64::from(n),
            LoopCount::Infinite => statics::GP_LOOP_INFINITE,
        }
    }

    /// `-1` is the endless sentinel; any other value below 1 is invalid.
    pub fn from_wire(v: i64) -> Option<LoopCount> {
        if v == statics::GP_LOOP_INFINITE {
            return Some(LoopCount::Infinite);
        }
        u32::try_from(v)
            .ok()
            .filter(|n| *n >= 1)
            .map(LoopCount::Times)
    }
}

impl fmt::Display for LoopCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopCount::Times(n) => write!(f, "{n}"),
            LoopCount::Infinite => f.write_str(statics::EN_LOOP_INFINITE),
        }
    }
}

/// Values owned by the monster rather than by any single rule.
///
/// The id pair is kept as entered text; it is only written back to the document
/// when it parses as an integer.
#[derive(Debug, Clone, PartialEq)]
pub struct MonsterAttrs {
    pub attack_range: f64,
    pub is_ranged: bool,
    pub base_id: String,
    pub name_id: String,
    /// The document holds an unparseable value for the field; it is left alone until edited.
    pub(crate) attack_range_unparsed: bool,
    pub(crate) is_ranged_unparsed: bool,
}

impl Default for MonsterAttrs {
    fn default() -> Self {
        Self {
            attack_range: 0.0,
            is_ranged: false,
            base_id: "0".to_string(),
            name_id: "0".to_string(),
            attack_range_unparsed: false,
            is_ranged_unparsed: false,
        }
    }
}

impl MonsterAttrs {
    /// Non-numeric text reads as 0.
    pub fn base_id(&self) -> i64 {
        self.parsed_base_id().unwrap_or(0)
    }

    pub fn name_id(&self) -> i64 {
        self.parsed_name_id().unwrap_or(0)
    }

    pub fn parsed_base_id(&self) -> Option<i64> {
        self.base_id.trim().parse().ok()
    }

    pub fn parsed_name_id(&self) -> Option<i64> {
        self.name_id.trim().parse().ok()
    }
}

/// One monster-level edit.
#[derive(Debug, Clone, PartialEq)]
pub enum MonsterAttribute {
    AttackRange(f64),
    IsRanged(bool),
    BaseId(String),
    NameId(String),
}

impl MonsterAttribute {
    fn describe(&self) -> String {
        match self {
            MonsterAttribute::AttackRange(v) => format!("{} = {v}", statics::GP_KEY_ATTACK_RANGE),
            MonsterAttribute::IsRanged(v) => format!("{} = {v}", statics::GP_KEY_IS_RANGED),
            MonsterAttribute::BaseId(v) => format!("{} = {v}", statics::GP_KEY_BASE_ID),
            MonsterAttribute::NameId(v) => format!("{} = {v}", statics::GP_KEY_NAME_ID),
        }
    }

    fn apply(&self, attrs: &mut MonsterAttrs) {
        match self {
            MonsterAttribute::AttackRange(v) => {
                attrs.attack_range = *v;
                attrs.attack_range_unparsed = false;
            }
            MonsterAttribute::IsRanged(v) => {
                attrs.is_ranged = *v;
                attrs.is_ranged_unparsed = false;
            }
            MonsterAttribute::BaseId(v) => attrs.base_id = v.trim().to_string(),
            MonsterAttribute::NameId(v) => attrs.name_id = v.trim().to_string(),
        }
    }
}

/// One conditional action entry.
#[derive(Debug, Clone, PartialEq)]
pub struct GambitRule {
    pub condition: Condition,
    pub hp_threshold: Option<u8>,
    pub action_id: i64,
    pub action_param: i64,
    pub timing: Option<u16>,
    pub cool_down: Option<u32>,
    pub radius: Option<f64>,
    pub enabled: bool,
    pub description: String,
    /// Keys the engine does not know about, written back untouched.
    pub extra: IndexMap<String, PackValue>,
    /// Condition text as read, for aliases and unrecognised names. Written back while
    /// `condition` still equals the value it was decoded to.
    pub(crate) condition_source: Option<(Condition, String)>,
    pub(crate) monster: MonsterAttrs,
}

impl GambitRule {
    /// Defaults used by [`PackDocument::add_rule`].
    pub(crate) fn blank(pack_type: PackType, monster: MonsterAttrs, description: String) -> Self {
        Self {
            condition: Condition::None,
            hp_threshold: None,
            action_id: 0,
            action_param: 0,
            timing: (pack_type == PackType::TimeLine).then_some(0),
            cool_down: (pack_type == PackType::RuleSet).then_some(0),
            radius: None,
            enabled: true,
            description,
            extra: IndexMap::new(),
            condition_source: None,
            monster,
        }
    }

    /// Condition name as written to the document.
    pub fn condition_wire(&self) -> &str {
        match &self.condition_source {
            Some((decoded, text)) if *decoded == self.condition => text,
            _ => self.condition.wire_name(),
        }
    }

    pub fn attack_range(&self) -> f64 {
        self.monster.attack_range
    }

    pub fn is_ranged(&self) -> bool {
        self.monster.is_ranged
    }

    pub fn monster_attrs(&self) -> &MonsterAttrs {
        &self.monster
    }

    pub fn timing_value(&self) -> u16 {
        self.timing.unwrap_or(0)
    }

    pub fn cool_down_value(&self) -> u32 {
        self.cool_down.unwrap_or(0)
    }

    pub fn status_label(&self) -> &'static str {
        if self.enabled {
            statics::EN_STATUS_ON
        } else {
            statics::EN_STATUS_OFF
        }
    }

    /// Catalog name of the action, "Unknown" when unresolved.
    pub fn action_name<'a>(&self, catalog: &'a ActionCatalog) -> &'a str {
        catalog.display_name(self.action_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonsterId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleKey(u32);

/// Stable reference to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleHandle {
    pub monster: MonsterId,
    pub key: RuleKey,
}

/// Ordered rules of one monster, keyed by stable ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleArena {
    slots: IndexMap<RuleKey, GambitRule>,
}

impl RuleArena {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, key: RuleKey) -> Option<&GambitRule> {
        self.slots.get(&key)
    }

    pub fn position(&self, key: RuleKey) -> Option<usize> {
        self.slots.get_index_of(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RuleKey, &GambitRule)> {
        self.slots.iter().map(|(k, r)| (*k, r))
    }

    pub fn first(&self) -> Option<&GambitRule> {
        self.slots.first().map(|(_, r)| r)
    }

    fn get_mut(&mut self, key: RuleKey) -> Option<&mut GambitRule> {
        self.slots.get_mut(&key)
    }

    fn values_mut(&mut self) -> impl Iterator<Item = &mut GambitRule> {
        self.slots.values_mut()
    }

    fn push(&mut self, key: RuleKey, rule: GambitRule) {
        self.slots.insert(key, rule);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonsterEntry {
    pub name: String,
    pub pack_type: PackType,
    pub loop_count: LoopCount,
    pub(crate) attrs: MonsterAttrs,
    pub(crate) rules: RuleArena,
    /// False when the source document had no usable `gambitPack.timeLines`.
    pub(crate) has_rule_container: bool,
}

impl MonsterEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pack_type: PackType::default(),
            loop_count: LoopCount::default(),
            attrs: MonsterAttrs::default(),
            rules: RuleArena::default(),
            has_rule_container: true,
        }
    }

    pub fn attrs(&self) -> &MonsterAttrs {
        &self.attrs
    }

    pub fn rules(&self) -> &RuleArena {
        &self.rules
    }
}

/// The whole pack: one category of monsters.
#[derive(Debug, Clone, PartialEq)]
pub struct PackDocument {
    /// The single top-level key of the document.
    pub category: String,
    monsters: Vec<MonsterEntry>,
    next_key: u32,
}

impl PackDocument {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            monsters: Vec::new(),
            next_key: 0,
        }
    }

    /// Adds a monster built by the importer. Rule copies of the monster attributes
    /// are overwritten with the monster's own values.
    pub(crate) fn push_monster(&mut self, mut entry: MonsterEntry, rules: Vec<GambitRule>) -> MonsterId {
        for mut rule in rules {
            rule.monster = entry.attrs.clone();
            let key = self.alloc_key();
            entry.rules.push(key, rule);
        }
        self.monsters.push(entry);
        MonsterId(self.monsters.len() - 1)
    }

    fn alloc_key(&mut self) -> RuleKey {
        let key = RuleKey(self.next_key);
        self.next_key += 1;
        key
    }

    pub fn monsters(&self) -> impl Iterator<Item = (MonsterId, &MonsterEntry)> {
        self.monsters.iter().enumerate().map(|(i, m)| (MonsterId(i), m))
    }

    pub fn monster_count(&self) -> usize {
        self.monsters.len()
    }

    pub fn monster(&self, id: MonsterId) -> Option<&MonsterEntry> {
        self.monsters.get(id.0)
    }

    pub fn monster_id(&self, name: &str) -> Option<MonsterId> {
        self.monsters.iter().position(|m| m.name == name).map(MonsterId)
    }

    pub fn rule(&self, handle: RuleHandle) -> Option<&GambitRule> {
        self.monster(handle.monster)?.rules.get(handle.key)
    }

    /// Handles of a monster's rules in display order.
    pub fn rule_handles(&self, monster: MonsterId) -> Vec<RuleHandle> {
        self.monster(monster)
            .map(|m| {
                m.rules
                    .iter()
                    .map(|(key, _)| RuleHandle { monster, key })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn rule_count(&self) -> usize {
        self.monsters.iter().map(|m| m.rules.len()).sum()
    }

    fn monster_mut(&mut self, id: MonsterId) -> Result<&mut MonsterEntry, EditError> {
        self.monsters.get_mut(id.0).ok_or(EditError::UnknownMonster)
    }

    fn rule_mut(&mut self, handle: RuleHandle) -> Result<&mut GambitRule, EditError> {
        self.monster_mut(handle.monster)?
            .rules
            .get_mut(handle.key)
            .ok_or(EditError::UnknownRule)
    }

    /// Flips `enabled`; the soft-disable encoding is applied on the next synchronize.
    pub fn toggle_enabled(&mut self, handle: RuleHandle) -> Result<bool, EditError> {
        let rule = self.rule_mut(handle)?;
        rule.enabled = !rule.enabled;
        Ok(rule.enabled)
    }

    /// `threshold` is required (1-100) for [`Condition::HpBelowThreshold`] and cleared otherwise.
    pub fn set_condition(
        &mut self,
        handle: RuleHandle,
        condition: Condition,
        threshold: Option<u8>,
    ) -> Result<(), EditError> {
        let hp_threshold = if condition == Condition::HpBelowThreshold {
            let t = threshold.ok_or(EditError::ThresholdRequired)?;
            if !(statics::GP_HP_THRESHOLD_MIN..=statics::GP_HP_THRESHOLD_MAX).contains(&t) {
                return Err(EditError::OutOfRange {
                    field: statics::GP_RULE_HP_THRESHOLD,
                    value: f64::from(t),
                    min: f64::from(statics::GP_HP_THRESHOLD_MIN),
                    max: f64::from(statics::GP_HP_THRESHOLD_MAX),
                });
            }
            Some(t)
        } else {
            None
        };
        let rule = self.rule_mut(handle)?;
        rule.condition = condition;
        rule.condition_source = None;
        rule.hp_threshold = hp_threshold;
        Ok(())
    }

    /// Parses and clamps to 0-999. Non-numeric input is rejected and the old value kept.
    pub fn set_timing(&mut self, handle: RuleHandle, input: &str) -> Result<u16, EditError> {
        let value = parse_integer(statics::GP_RULE_TIMING, input)?
            .clamp(statics::GP_TIMING_MIN, statics::GP_TIMING_MAX);
        let value = u16::try_from(value).unwrap_or(0);
        self.rule_mut(handle)?.timing = Some(value);
        Ok(value)
    }

    /// Parses and clamps to a non-negative millisecond count.
    pub fn set_cool_down(&mut self, handle: RuleHandle, input: &str) -> Result<u32, EditError> {
        let value = parse_integer(statics::GP_RULE_COOL_DOWN, input)?;
        let value = u32::try_from(value.clamp(0, i64::from(u32::MAX))).unwrap_or(0);
        self.rule_mut(handle)?.cool_down = Some(value);
        Ok(value)
    }

    /// Unresolved ids are allowed; the description becomes "Unknown".
    pub fn set_action(
        &mut self,
        handle: RuleHandle,
        action_id: i64,
        catalog: &ActionCatalog,
    ) -> Result<(), EditError> {
        let rule = self.rule_mut(handle)?;
        rule.action_id = action_id;
        rule.description = catalog.display_name(action_id).to_string();
        Ok(())
    }

    pub fn set_action_param(&mut self, handle: RuleHandle, param: i64) -> Result<(), EditError> {
        self.rule_mut(handle)?.action_param = param;
        Ok(())
    }

    pub fn set_radius(&mut self, handle: RuleHandle, radius: Option<f64>) -> Result<(), EditError> {
        if let Some(r) = radius {
            check_non_negative(statics::GP_RULE_RADIUS, r)?;
        }
        self.rule_mut(handle)?.radius = radius;
        Ok(())
    }

    /// Appends `condition=None, actionId=0, enabled, timing/coolDown=0`.
    pub fn add_rule(
        &mut self,
        monster: MonsterId,
        catalog: &ActionCatalog,
    ) -> Result<RuleHandle, EditError> {
        let key = RuleKey(self.next_key);
        let entry = self.monster_mut(monster)?;
        let rule = GambitRule::blank(
            entry.pack_type,
            entry.attrs.clone(),
            catalog.display_name(0).to_string(),
        );
        entry.rules.push(key, rule);
        entry.has_rule_container = true;
        self.next_key += 1;
        Ok(RuleHandle { monster, key })
    }

    pub fn remove_rule(&mut self, handle: RuleHandle) -> Result<GambitRule, EditError> {
        self.monster_mut(handle.monster)?
            .rules
            .slots
            .shift_remove(&handle.key)
            .ok_or(EditError::UnknownRule)
    }

    /// Removes every disabled rule of the monster; returns how many were dropped.
    pub fn remove_disabled_rules(&mut self, monster: MonsterId) -> Result<usize, EditError> {
        let rules = &mut self.monster_mut(monster)?.rules.slots;
        let before = rules.len();
        rules.retain(|_, r| r.enabled);
        Ok(before - rules.len())
    }

    /// Moves a rule to `index` within its monster, shifting the others.
    pub fn move_rule(&mut self, handle: RuleHandle, index: usize) -> Result<(), EditError> {
        let rules = &mut self.monster_mut(handle.monster)?.rules.slots;
        let from = rules.get_index_of(&handle.key).ok_or(EditError::UnknownRule)?;
        if index >= rules.len() {
            return Err(EditError::IndexOutOfBounds {
                index,
                len: rules.len(),
            });
        }
        rules.move_index(from, index);
        Ok(())
    }

    /// Writes the monster's value and every rule's cached copy.
    pub fn set_monster_attribute(
        &mut self,
        monster: MonsterId,
        attribute: MonsterAttribute,
    ) -> Result<(), EditError> {
        if let MonsterAttribute::AttackRange(v) = attribute {
            check_non_negative(statics::GP_KEY_ATTACK_RANGE, v)?;
        }
        let entry = self.monster_mut(monster)?;
        attribute.apply(&mut entry.attrs);
        for rule in entry.rules.values_mut() {
            attribute.apply(&mut rule.monster);
        }
        log::debug!("{}: set {}", entry.name, attribute.describe());
        Ok(())
    }

    pub fn set_loop_count(&mut self, monster: MonsterId, loop_count: LoopCount) -> Result<(), EditError> {
        if loop_count == LoopCount::Times(0) {
            return Err(EditError::OutOfRange {
                field: statics::GP_KEY_LOOP_COUNT,
                value: 0.0,
                min: 1.0,
                max: f64::from(u32::MAX),
            });
        }
        self.monster_mut(monster)?.loop_count = loop_count;
        Ok(())
    }

    /// Switches the timing variant; rules gain a zero value for the new field if they lack one.
    pub fn set_pack_type(&mut self, monster: MonsterId, pack_type: PackType) -> Result<(), EditError> {
        let entry = self.monster_mut(monster)?;
        entry.pack_type = pack_type;
        for rule in entry.rules.values_mut() {
            match pack_type {
                PackType::TimeLine => rule.timing = Some(rule.timing_value()),
                PackType::RuleSet => rule.cool_down = Some(rule.cool_down_value()),
            }
        }
        Ok(())
    }
}

fn parse_integer(field: &'static str, input: &str) -> Result<i64, EditError> {
    input.trim().parse::<i64>().map_err(|_| EditError::NotNumeric {
        field,
        input: input.to_string(),
    })
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), EditError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EditError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: f64::MAX,
        })
    }
}
