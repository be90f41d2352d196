use crate::catalog::ActionCatalog;
use crate::error::{EditError, SessionError, Warning};
use crate::import::import;
use crate::model::{
    Condition, LoopCount, MonsterAttribute, MonsterId, PackDocument, PackType, RuleHandle,
};
use crate::sync::synchronize;

/// The text editor the session reads from and writes to.
pub trait EditorSurface {
    fn current_text(&self) -> String;
    fn set_current_text(&mut self, text: String);
}

/// Plain in-memory host.
impl EditorSurface for String {
    fn current_text(&self) -> String {
        self.clone()
    }

    fn set_current_text(&mut self, text: String) {
        *self = text;
    }
}

/// One discrete user edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    ToggleEnabled(RuleHandle),
    SetCondition {
        rule: RuleHandle,
        condition: Condition,
        threshold: Option<u8>,
    },
    SetTiming { rule: RuleHandle, input: String },
    SetCoolDown { rule: RuleHandle, input: String },
    SetAction { rule: RuleHandle, action_id: i64 },
    SetActionParam { rule: RuleHandle, param: i64 },
    SetRadius { rule: RuleHandle, radius: Option<f64> },
    AddRule(MonsterId),
    RemoveRule(RuleHandle),
    MoveRule { rule: RuleHandle, index: usize },
    RemoveDisabledRules(MonsterId),
    SetMonsterAttribute {
        monster: MonsterId,
        attribute: MonsterAttribute,
    },
    SetLoopCount {
        monster: MonsterId,
        loop_count: LoopCount,
    },
    SetPackType {
        monster: MonsterId,
        pack_type: PackType,
    },
}

/// What an edit produced, for the view to refresh itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditOutcome {
    Done,
    Enabled(bool),
    Timing(u16),
    CoolDown(u32),
    Added(RuleHandle),
    Removed(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub outcome: EditOutcome,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    description: String,
    document: PackDocument,
}

/// Owns the loaded document and the last text handed to the host.
///
/// Every edit mutates the model, then synchronizes against the host's current text
/// and writes the result back. A failed synchronize rolls the edit back and leaves
/// the host text alone.
#[derive(Debug, Default)]
pub struct EditingSession {
    catalog: ActionCatalog,
    document: Option<PackDocument>,
    snapshot: String,
    warnings: Vec<Warning>,
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
}

impl EditingSession {
    pub fn new(catalog: ActionCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn document(&self) -> Option<&PackDocument> {
        self.document.as_ref()
    }

    /// Text produced by the last load or synchronize.
    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }

    /// Warnings from the last load.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// True when the host text was changed outside the session since the last sync.
    pub fn is_stale(&self, host: &impl EditorSurface) -> bool {
        self.document.is_some() && host.current_text() != self.snapshot
    }

    /// Imports the host's text. On failure the previous document stays loaded.
    pub fn load(&mut self, host: &impl EditorSurface) -> Result<&[Warning], SessionError> {
        let text = host.current_text();
        let imported = import(&text, &self.catalog)?;
        log::info!(
            "loaded {:?} ({} monsters, {} warnings)",
            imported.document.category,
            imported.document.monster_count(),
            imported.warnings.len()
        );
        self.document = Some(imported.document);
        self.warnings = imported.warnings;
        self.snapshot = text;
        self.undo_stack.clear();
        self.redo_stack.clear();
        Ok(&self.warnings)
    }

    /// Drops the document, e.g. when the host switches to a non-pack file.
    pub fn clear(&mut self) {
        self.document = None;
        self.warnings.clear();
        self.snapshot.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Writes the current model into the host text.
    pub fn synchronize(&mut self, host: &mut impl EditorSurface) -> Result<Vec<Warning>, SessionError> {
        let document = self.document.as_ref().ok_or(EditError::NoDocument)?;
        let synced = synchronize(document, &host.current_text())?;
        self.snapshot = synced.text.clone();
        host.set_current_text(synced.text);
        Ok(synced.warnings)
    }

    /// Applies one edit and synchronizes.
    pub fn apply(
        &mut self,
        host: &mut impl EditorSurface,
        edit: Edit,
    ) -> Result<Applied, SessionError> {
        let document = self.document.as_mut().ok_or(EditError::NoDocument)?;
        let before = document.clone();
        let outcome = perform(document, &edit, &self.catalog)?;
        let description = describe(&before, &edit, outcome);

        let synced = match synchronize(document, &host.current_text()) {
            Ok(synced) => synced,
            Err(err) => {
                *document = before;
                return Err(err.into());
            }
        };
        self.snapshot = synced.text.clone();
        host.set_current_text(synced.text);

        log::debug!("edit: {description}");
        self.undo_stack.push(HistoryEntry {
            description,
            document: before,
        });
        self.redo_stack.clear();
        Ok(Applied {
            outcome,
            warnings: synced.warnings,
        })
    }

    /// Restores the model from before the last edit and synchronizes it.
    pub fn undo(&mut self, host: &mut impl EditorSurface) -> Result<String, SessionError> {
        let entry = self.undo_stack.last().ok_or(EditError::NothingToUndo)?;
        let current = self.document.as_ref().ok_or(EditError::NoDocument)?;
        let synced = synchronize(&entry.document, &host.current_text())?;

        let Some(entry) = self.undo_stack.pop() else {
            return Err(EditError::NothingToUndo.into());
        };
        self.redo_stack.push(HistoryEntry {
            description: entry.description.clone(),
            document: current.clone(),
        });
        self.document = Some(entry.document);
        self.snapshot = synced.text.clone();
        host.set_current_text(synced.text);
        log::info!("undo: {}", entry.description);
        Ok(entry.description)
    }

    pub fn redo(&mut self, host: &mut impl EditorSurface) -> Result<String, SessionError> {
        let entry = self.redo_stack.last().ok_or(EditError::NothingToRedo)?;
        let current = self.document.as_ref().ok_or(EditError::NoDocument)?;
        let synced = synchronize(&entry.document, &host.current_text())?;

        let Some(entry) = self.redo_stack.pop() else {
            return Err(EditError::NothingToRedo.into());
        };
        self.undo_stack.push(HistoryEntry {
            description: entry.description.clone(),
            document: current.clone(),
        });
        self.document = Some(entry.document);
        self.snapshot = synced.text.clone();
        host.set_current_text(synced.text);
        log::info!("redo: {}", entry.description);
        Ok(entry.description)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Descriptions of the applied edits, oldest first.
    pub fn changes(&self) -> impl Iterator<Item = &str> {
        self.undo_stack.iter().map(|e| e.description.as_str())
    }
}

fn perform(
    document: &mut PackDocument,
    edit: &Edit,
    catalog: &ActionCatalog,
) -> Result<EditOutcome, EditError> {
    let outcome = match edit {
        Edit::ToggleEnabled(rule) => EditOutcome::Enabled(document.toggle_enabled(*rule)?),
        Edit::SetCondition {
            rule,
            condition,
            threshold,
        } => {
            document.set_condition(*rule, *condition, *threshold)?;
            EditOutcome::Done
        }
        Edit::SetTiming { rule, input } => EditOutcome::Timing(document.set_timing(*rule, input)?),
        Edit::SetCoolDown { rule, input } => {
            EditOutcome::CoolDown(document.set_cool_down(*rule, input)?)
        }
        Edit::SetAction { rule, action_id } => {
            document.set_action(*rule, *action_id, catalog)?;
            EditOutcome::Done
        }
        Edit::SetActionParam { rule, param } => {
            document.set_action_param(*rule, *param)?;
            EditOutcome::Done
        }
        Edit::SetRadius { rule, radius } => {
            document.set_radius(*rule, *radius)?;
            EditOutcome::Done
        }
        Edit::AddRule(monster) => EditOutcome::Added(document.add_rule(*monster, catalog)?),
        Edit::RemoveRule(rule) => {
            document.remove_rule(*rule)?;
            EditOutcome::Removed(1)
        }
        Edit::MoveRule { rule, index } => {
            document.move_rule(*rule, *index)?;
            EditOutcome::Done
        }
        Edit::RemoveDisabledRules(monster) => {
            EditOutcome::Removed(document.remove_disabled_rules(*monster)?)
        }
        Edit::SetMonsterAttribute { monster, attribute } => {
            document.set_monster_attribute(*monster, attribute.clone())?;
            EditOutcome::Done
        }
        Edit::SetLoopCount {
            monster,
            loop_count,
        } => {
            document.set_loop_count(*monster, *loop_count)?;
            EditOutcome::Done
        }
        Edit::SetPackType { monster, pack_type } => {
            document.set_pack_type(*monster, *pack_type)?;
            EditOutcome::Done
        }
    };
    Ok(outcome)
}

/// Human-readable change line, named against the document as it was before the edit.
fn describe(before: &PackDocument, edit: &Edit, outcome: EditOutcome) -> String {
    let monster_name = |id: MonsterId| {
        before
            .monster(id)
            .map(|m| m.name.clone())
            .unwrap_or_default()
    };
    let rule_name = |h: RuleHandle| {
        let pos = before
            .monster(h.monster)
            .and_then(|m| m.rules().position(h.key))
            .map(|p| p + 1)
            .unwrap_or(0);
        format!("{} rule #{pos}", monster_name(h.monster))
    };

    match (edit, outcome) {
        (Edit::ToggleEnabled(rule), EditOutcome::Enabled(on)) => format!(
            "{}: {}",
            rule_name(*rule),
            if on { "enabled" } else { "disabled" }
        ),
        (Edit::SetCondition { rule, condition, .. }, _) => {
            format!("{}: condition = {}", rule_name(*rule), condition.label())
        }
        (Edit::SetTiming { rule, .. }, EditOutcome::Timing(t)) => {
            format!("{}: timing = {t}", rule_name(*rule))
        }
        (Edit::SetCoolDown { rule, .. }, EditOutcome::CoolDown(c)) => {
            format!("{}: coolDown = {c}", rule_name(*rule))
        }
        (Edit::SetAction { rule, action_id }, _) => {
            format!("{}: action = {action_id}", rule_name(*rule))
        }
        (Edit::SetActionParam { rule, param }, _) => {
            format!("{}: actionParam = {param}", rule_name(*rule))
        }
        (Edit::SetRadius { rule, radius }, _) => match radius {
            Some(r) => format!("{}: radius = {r}", rule_name(*rule)),
            None => format!("{}: radius cleared", rule_name(*rule)),
        },
        (Edit::AddRule(monster), _) => format!("{}: added rule", monster_name(*monster)),
        (Edit::RemoveRule(rule), _) => format!("{}: removed", rule_name(*rule)),
        (Edit::MoveRule { rule, index }, _) => {
            format!("{}: moved to #{}", rule_name(*rule), index + 1)
        }
        (Edit::RemoveDisabledRules(monster), EditOutcome::Removed(n)) => {
            format!("{}: removed {n} disabled rules", monster_name(*monster))
        }
        (Edit::SetMonsterAttribute { monster, attribute }, _) => {
            format!("{}: {attribute:?}", monster_name(*monster))
        }
        (Edit::SetLoopCount { monster, loop_count }, _) => {
            format!("{}: loopCount = {loop_count}", monster_name(*monster))
        }
        (Edit::SetPackType { monster, pack_type }, _) => {
            format!("{}: pack type = {pack_type:?}", monster_name(*monster))
        }
        (edit, _) => format!("{edit:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{Edit, EditOutcome, EditingSession, EditorSurface};
    use crate::catalog::ActionCatalog;
    use crate::error::{EditError, SessionError};

    const DOC: &str = r#"{
  "golem": {
    "Stone": {
      "gambitPack": {
        "timeLines": [
          { "condition": "Self", "actionId": 12, "timing": 0, "description": "Attack", "actionParam": 0 }
        ]
      }
    }
  }
}"#;

    #[test]
    fn edits_without_document_are_rejected() {
        let mut session = EditingSession::default();
        let mut host = String::from(DOC);
        assert!(matches!(
            session.synchronize(&mut host),
            Err(SessionError::Edit(EditError::NoDocument))
        ));
    }

    #[test]
    fn apply_writes_host_and_records_change() {
        let mut session = EditingSession::new(ActionCatalog::from_pairs([(12, "Attack")]));
        let mut host = String::from(DOC);
        session.load(&host).unwrap();
        let doc = session.document().unwrap();
        let rule = doc.rule_handles(doc.monster_id("Stone").unwrap())[0];

        let applied = session.apply(&mut host, Edit::ToggleEnabled(rule)).unwrap();
        assert_eq!(applied.outcome, EditOutcome::Enabled(false));
        assert!(host.contains("originalActionId"));
        assert_eq!(session.snapshot(), host.current_text());
        assert!(!session.is_stale(&host));
        assert_eq!(session.changes().collect::<Vec<_>>(), ["Stone rule #1: disabled"]);
    }

    #[test]
    fn rejected_edit_changes_nothing() {
        let mut session = EditingSession::default();
        let mut host = String::from(DOC);
        session.load(&host).unwrap();
        let doc = session.document().unwrap();
        let rule = doc.rule_handles(doc.monster_id("Stone").unwrap())[0];

        let err = session
            .apply(
                &mut host,
                Edit::SetTiming {
                    rule,
                    input: "abc".into(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, SessionError::Edit(EditError::NotNumeric { .. })));
        assert_eq!(host, DOC);
        assert!(!session.can_undo());
    }

    #[test]
    fn failed_sync_rolls_back_model() {
        let mut session = EditingSession::default();
        let mut host = String::from(DOC);
        session.load(&host).unwrap();
        let doc = session.document().unwrap();
        let rule = doc.rule_handles(doc.monster_id("Stone").unwrap())[0];

        host = "{ not json".to_string();
        assert!(session.is_stale(&host));
        let err = session.apply(&mut host, Edit::ToggleEnabled(rule)).unwrap_err();
        assert!(matches!(err, SessionError::Document(_)));
        assert_eq!(host, "{ not json");
        assert!(session.document().unwrap().rule(rule).unwrap().enabled);
    }

    #[test]
    fn failed_load_keeps_previous_document() {
        let mut session = EditingSession::default();
        let host = String::from(DOC);
        session.load(&host).unwrap();
        assert!(session.load(&String::from("[]")).is_err());
        assert_eq!(session.document().unwrap().category, "golem");
        session.clear();
        assert!(session.document().is_none());
    }
}
