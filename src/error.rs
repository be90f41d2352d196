use std::fmt;

/// Errors that abort an import or synchronize call. The caller's previous
/// document text is never modified when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum GambitError {
    #[error("document is not valid JSON: {0}")]
    Parse(#[from] json5::Error),
    #[error("document root is a {0}, expected an object")]
    NotAnObject(&'static str),
    #[error("document has no top-level category key")]
    MissingDiscriminator,
    #[error("top-level category {category:?} not found in document")]
    CategoryNotFound { category: String },
    #[error("category {category:?} is a {found}, expected an object of monsters")]
    MonstersNotObject {
        category: String,
        found: &'static str,
    },
}

/// Rejected model edits. The rule or monster keeps its previous value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("{field}: {input:?} is not a number")]
    NotNumeric { field: &'static str, input: String },
    #[error("{field}: {value} is out of range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("HP threshold condition requires a threshold between 1 and 100")]
    ThresholdRequired,
    #[error("unknown monster")]
    UnknownMonster,
    #[error("rule no longer exists")]
    UnknownRule,
    #[error("rule index {index} out of bounds for {len} rules")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("no document is loaded")]
    NoDocument,
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
}

/// Errors surfaced by the editing session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Document(#[from] GambitError),
}

/// A recoverable per-entity problem found while importing or synchronizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub monster: String,
    /// Position of the rule within its monster's list, when the problem is rule-level.
    pub rule: Option<usize>,
    pub message: String,
}

impl Warning {
    pub fn monster(monster: &str, message: impl Into<String>) -> Self {
        Self {
            monster: monster.to_string(),
            rule: None,
            message: message.into(),
        }
    }

    pub fn rule(monster: &str, rule: usize, message: impl Into<String>) -> Self {
        Self {
            monster: monster.to_string(),
            rule: Some(rule),
            message: message.into(),
        }
    }

    pub(crate) fn logged(self) -> Self {
        log::warn!("{self}");
        self
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule {
            Some(idx) => write!(f, "{} rule #{}: {}", self.monster, idx + 1, self.message),
            None => write!(f, "{}: {}", self.monster, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Warning;

    #[test]
    fn warning_display_names_monster_and_rule() {
        let w = Warning::rule("Golem", 2, "missing timing");
        assert_eq!(w.to_string(), "Golem rule #3: missing timing");
        let w = Warning::monster("Golem", "no rules");
        assert_eq!(w.to_string(), "Golem: no rules");
    }
}
