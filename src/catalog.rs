use crate::statics;
use std::collections::BTreeMap;

/// Read-only mapping from action id to display name.
///
/// Loading the table from disk is the host's business; the catalog is built from
/// already-parsed `(id, name)` pairs and never fails a lookup.
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    names: BTreeMap<i64, String>,
}

impl ActionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank names are skipped; surrounding whitespace is trimmed. Later duplicates win.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: AsRef<str>,
    {
        pairs.into_iter().collect()
    }

    pub fn resolve(&self, action_id: i64) -> Option<&str> {
        self.names.get(&action_id).map(String::as_str)
    }

    /// Name to show for an action; unresolved ids degrade to "Unknown".
    pub fn display_name(&self, action_id: i64) -> &str {
        self.resolve(action_id).unwrap_or(statics::EN_UNKNOWN_ACTION)
    }

    /// Case-insensitive exact name lookup. Lowest id wins when names repeat.
    pub fn find_by_name(&self, name: &str) -> Option<i64> {
        let needle = name.trim().to_lowercase();
        self.names
            .iter()
            .find(|(_, n)| n.to_lowercase() == needle)
            .map(|(id, _)| *id)
    }

    /// Action picker filter: matches when the id's digits or the lowercased name
    /// contain the lowercased query. Results are ordered by id.
    pub fn search(&self, query: &str) -> Vec<(i64, &str)> {
        let needle = query.trim().to_lowercase();
        self.names
            .iter()
            .filter(|(id, name)| {
                needle.is_empty()
                    || id.to_string().contains(&needle)
                    || name.to_lowercase().contains(&needle)
            })
            .map(|(id, name)| (*id, name.as_str()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> {
        self.names.iter().map(|(id, name)| (*id, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<(i64, S)> for ActionCatalog {
    fn from_iter<T: IntoIterator<Item = (i64, S)>>(iter: T) -> Self {
        let mut names = BTreeMap::new();
        for (id, name) in iter {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            names.insert(id, name.to_string());
        }
        Self { names }
    }
}
