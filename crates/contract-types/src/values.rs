use std::collections::BTreeMap;

use serde_json::Value;

/// Values gathered for catalog keys during the interview.
///
/// Blank entries are kept as sent but never count as provided.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "BTreeMap<String, Value>", into = "BTreeMap<String, String>")]
pub struct CollectedValues {
    entries: BTreeMap<String, String>,
}

impl CollectedValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Raw stored value, blank or not.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Trimmed value for `key`, or `None` when absent or blank.
    pub fn resolve(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Fold newly extracted values in without ever clearing a provided one.
    ///
    /// Blank incoming values are ignored; non-blank ones replace what was
    /// stored. Returns how many keys changed.
    pub fn merge(&mut self, incoming: CollectedValues) -> usize {
        let mut changed = 0;
        for (key, value) in incoming.entries {
            if value.trim().is_empty() {
                continue;
            }
            if self.entries.get(&key) != Some(&value) {
                self.entries.insert(key, value);
                changed += 1;
            }
        }
        changed
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Scalars are stringified, `null` means "not provided".
fn stringify(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

impl From<BTreeMap<String, Value>> for CollectedValues {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        raw.into_iter()
            .filter_map(|(k, v)| stringify(v).map(|v| (k, v)))
            .collect()
    }
}

impl From<CollectedValues> for BTreeMap<String, String> {
    fn from(values: CollectedValues) -> Self {
        values.entries
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CollectedValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
