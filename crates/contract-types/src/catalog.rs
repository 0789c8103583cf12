//! Ordered, key-unique collection of variable descriptors
//!
//! The catalog is what the detection step hands over to substitution. Keys
//! are unique: the first descriptor seen for a key wins and later duplicates
//! are dropped, so catalog order is stable across edits.

use serde_json::Value;

use crate::types::{VariableDescriptor, DEFAULT_VARIABLE_TYPE};
use crate::values::CollectedValues;

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(
    from = "Vec<VariableDescriptor>",
    into = "Vec<VariableDescriptor>"
)]
pub struct VariableCatalog {
    descriptors: Vec<VariableDescriptor>,
}

impl VariableCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from the loose JSON entries returned by variable detection.
    ///
    /// Entries that are not objects or carry no string `key` are ignored.
    /// Missing fields take their defaults: the label falls back to the key and
    /// a missing placeholder becomes the `{{KEY}}` marker.
    pub fn from_detected<'a>(entries: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut catalog = Self::new();

        for entry in entries {
            let Some(fields) = entry.as_object() else {
                continue;
            };
            let Some(key) = fields.get("key").and_then(Value::as_str) else {
                continue;
            };
            if key.trim().is_empty() {
                continue;
            }

            let text = |name: &str| fields.get(name).and_then(Value::as_str).map(str::to_string);

            catalog.push(VariableDescriptor {
                key: key.to_string(),
                label: text("label").unwrap_or_default(),
                placeholder_text: text("placeholder_text")
                    .unwrap_or_else(|| format!("{{{{{}}}}}", key.to_uppercase())),
                kind: text("type").unwrap_or_else(|| DEFAULT_VARIABLE_TYPE.to_string()),
                description: text("description").unwrap_or_default(),
                example: text("example").unwrap_or_default(),
            });
        }

        catalog
    }

    /// Append a descriptor unless its key is already present.
    ///
    /// Returns `false` when the descriptor was discarded as a duplicate.
    pub fn push(&mut self, mut descriptor: VariableDescriptor) -> bool {
        if self.contains(&descriptor.key) {
            return false;
        }
        if descriptor.label.trim().is_empty() {
            descriptor.label = descriptor.key.clone();
        }
        self.descriptors.push(descriptor);
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&VariableDescriptor> {
        self.descriptors.iter().find(|d| d.key == key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VariableDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptors that still have no usable value, in catalog order.
    pub fn pending<'a>(&'a self, values: &CollectedValues) -> Vec<&'a VariableDescriptor> {
        self.descriptors
            .iter()
            .filter(|d| values.resolve(&d.key).is_none())
            .collect()
    }

    pub fn is_complete(&self, values: &CollectedValues) -> bool {
        self.descriptors
            .iter()
            .all(|d| values.resolve(&d.key).is_some())
    }
}

impl From<Vec<VariableDescriptor>> for VariableCatalog {
    fn from(descriptors: Vec<VariableDescriptor>) -> Self {
        descriptors.into_iter().collect()
    }
}

impl From<VariableCatalog> for Vec<VariableDescriptor> {
    fn from(catalog: VariableCatalog) -> Self {
        catalog.descriptors
    }
}

impl FromIterator<VariableDescriptor> for VariableCatalog {
    fn from_iter<I: IntoIterator<Item = VariableDescriptor>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for descriptor in iter {
            catalog.push(descriptor);
        }
        catalog
    }
}

impl<'a> IntoIterator for &'a VariableCatalog {
    type Item = &'a VariableDescriptor;
    type IntoIter = std::slice::Iter<'a, VariableDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_duplicate_keys_keep_first_occurrence() {
        let catalog: VariableCatalog = vec![
            VariableDescriptor::new("nombreLocador", ".........."),
            VariableDescriptor::new("dniLocador", "DNI N° ....."),
            VariableDescriptor::new("nombreLocador", "Sr. ______"),
        ]
        .into();

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.get("nombreLocador").unwrap().placeholder_text,
            ".........."
        );
        let keys: Vec<&str> = catalog.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["nombreLocador", "dniLocador"]);
    }

    #[test]
    fn test_push_reports_duplicates() {
        let mut catalog = VariableCatalog::new();
        assert!(catalog.push(VariableDescriptor::new("monto", ".....")));
        assert!(!catalog.push(VariableDescriptor::new("monto", "$ ____")));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_blank_label_falls_back_to_key() {
        let catalog: VariableCatalog =
            vec![VariableDescriptor::new("domicilio", "....").with_label("  ")].into();
        assert_eq!(catalog.get("domicilio").unwrap().label, "domicilio");
    }

    #[test]
    fn test_deserialize_deduplicates() {
        let catalog: VariableCatalog = serde_json::from_value(json!([
            {"key": "a", "label": "A", "placeholder_text": "...", "type": "texto"},
            {"key": "a", "label": "Other", "placeholder_text": "___", "type": "texto"},
        ]))
        .unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("a").unwrap().label, "A");
    }

    #[test]
    fn test_from_detected_applies_defaults_and_skips_garbage() {
        let entries = vec![
            json!({"key": "dniGarante", "label": "DNI del Garante", "placeholder_text": "D.N.I. ....", "type": "dni"}),
            json!("not an object"),
            json!({"label": "no key"}),
            json!({"key": "fechaInicio"}),
            json!({"key": "dniGarante", "label": "duplicate"}),
        ];
        let catalog = VariableCatalog::from_detected(&entries);

        assert_eq!(catalog.len(), 2);

        let dni = catalog.get("dniGarante").unwrap();
        assert_eq!(dni.label, "DNI del Garante");
        assert_eq!(dni.kind, "dni");

        let fecha = catalog.get("fechaInicio").unwrap();
        assert_eq!(fecha.label, "fechaInicio");
        assert_eq!(fecha.placeholder_text, "{{FECHAINICIO}}");
        assert_eq!(fecha.kind, "texto");
        assert_eq!(fecha.example, "");
    }

    #[test]
    fn test_pass_through_fields_are_echoed() {
        let catalog = VariableCatalog::from_detected(&[json!({
            "key": "monto",
            "label": "Monto mensual",
            "placeholder_text": "$ .....",
            "type": "moneda",
            "description": "Alquiler mensual",
            "example": "150000"
        })]);
        let echoed = serde_json::to_value(&catalog).unwrap();

        assert_eq!(echoed[0]["type"], "moneda");
        assert_eq!(echoed[0]["description"], "Alquiler mensual");
        assert_eq!(echoed[0]["example"], "150000");
    }

    #[test]
    fn test_pending_follows_catalog_order() {
        let catalog: VariableCatalog = vec![
            VariableDescriptor::new("a", "..."),
            VariableDescriptor::new("b", "..."),
            VariableDescriptor::new("c", "..."),
        ]
        .into();
        let mut values = CollectedValues::new();
        values.insert("b", "valor");
        values.insert("c", "   ");

        let pending: Vec<&str> = catalog
            .pending(&values)
            .iter()
            .map(|d| d.key.as_str())
            .collect();
        assert_eq!(pending, vec!["a", "c"]);
        assert!(!catalog.is_complete(&values));

        values.insert("a", "x");
        values.insert("c", "y");
        assert!(catalog.is_complete(&values));
    }
}
