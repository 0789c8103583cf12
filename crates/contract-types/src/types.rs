/// Tag assigned when the detection step does not classify a variable.
pub const DEFAULT_VARIABLE_TYPE: &str = "texto";

fn default_variable_type() -> String {
    DEFAULT_VARIABLE_TYPE.to_string()
}

/// Missing and `null` text fields both read as empty.
fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let text: Option<String> = serde::Deserialize::deserialize(deserializer)?;
    Ok(text.unwrap_or_default())
}

fn type_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let kind: Option<String> = serde::Deserialize::deserialize(deserializer)?;
    Ok(kind.unwrap_or_else(default_variable_type))
}

/// One fillable field of a contract template.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VariableDescriptor {
    pub key: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub label: String, // Falls back to `key` once inside a catalog
    #[serde(default, deserialize_with = "text_or_empty")]
    pub placeholder_text: String, // Literal fragment in the template, e.g. "DNI N° ....."
    #[serde(
        rename = "type",
        default = "default_variable_type",
        deserialize_with = "type_or_default"
    )]
    pub kind: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub example: String,
}

impl VariableDescriptor {
    pub fn new(key: impl Into<String>, placeholder_text: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            placeholder_text: placeholder_text.into(),
            kind: default_variable_type(),
            description: String::new(),
            example: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }
}

/// Which matching strategy located a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    WhitespaceNormalized,
    Flexible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatus {
    Applied,
    SkippedNoValue,
    SkippedNoPlaceholder,
    NoMatch,
}

/// Per-variable result of one substitution pass.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubstitutionOutcome {
    pub key: String,
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<MatchStrategy>,
    #[serde(default)]
    pub replacements: usize, // Occurrences rewritten, zero unless applied
}

impl SubstitutionOutcome {
    pub fn applied(key: impl Into<String>, strategy: MatchStrategy, replacements: usize) -> Self {
        Self {
            key: key.into(),
            status: OutcomeStatus::Applied,
            strategy: Some(strategy),
            replacements,
        }
    }

    pub fn skipped(key: impl Into<String>, status: OutcomeStatus) -> Self {
        Self {
            key: key.into(),
            status,
            strategy: None,
            replacements: 0,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.status == OutcomeStatus::Applied
    }
}

/// Output of a full substitution pass over a template.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubstitutionReport {
    pub document: String,
    pub applied_count: usize,
    pub unmatched: Vec<String>, // Keys that reached `no-match`, in catalog order
    pub outcomes: Vec<SubstitutionOutcome>,
}

impl SubstitutionReport {
    pub fn outcome(&self, key: &str) -> Option<&SubstitutionOutcome> {
        self.outcomes.iter().find(|o| o.key == key)
    }
}
