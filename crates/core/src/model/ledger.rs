use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("ledger is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One inspection point on a patrol checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub code: String,
}

/// A named checklist an operator patrols against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: String,
    pub label: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub items: Vec<ChecklistItem>,
}

impl Attribute {
    #[must_use]
    pub fn item(&self, item_id: &str) -> Option<&ChecklistItem> {
        self.items.iter().find(|item| item.id == item_id)
    }
}

/// Catalog of patrol attributes.
///
/// A missing or non-array `attributes` field reads as an empty catalog rather than
/// an error, so a half-broken cache still yields a usable (if empty) UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default, deserialize_with = "lenient_list")]
    pub attributes: Vec<Attribute>,
}

impl Ledger {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a ledger document.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Parse` if the text is not JSON or an entry is malformed.
    pub fn from_json(raw: &str) -> Result<Self, LedgerError> {
        Ok(serde_json::from_str(raw)?)
    }

    #[must_use]
    pub fn attribute(&self, attribute_id: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attribute| attribute.id == attribute_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Array(_) => {
            serde_json::from_value(value).map_err(serde::de::Error::custom)
        }
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "attributes": [
            {
                "id": "line-a",
                "label": "ラインA",
                "items": [
                    { "id": "a-1", "title": "消火器", "description": "圧力計を確認", "code": "FX-01" },
                    { "id": "a-2", "title": "非常口", "description": "通路確保", "code": "EX-02" }
                ]
            },
            { "id": "line-b", "label": "ラインB" }
        ]
    }"#;

    #[test]
    fn parses_attributes_and_items() {
        let ledger = Ledger::from_json(SAMPLE).unwrap();
        assert_eq!(ledger.attributes.len(), 2);

        let line_a = ledger.attribute("line-a").expect("line-a present");
        assert_eq!(line_a.label, "ラインA");
        assert_eq!(line_a.items.len(), 2);
        assert_eq!(line_a.item("a-2").map(|item| item.code.as_str()), Some("EX-02"));

        let line_b = ledger.attribute("line-b").expect("line-b present");
        assert!(line_b.items.is_empty());
        assert!(ledger.attribute("line-z").is_none());
    }

    #[test]
    fn non_array_attributes_read_as_empty() {
        assert!(Ledger::from_json(r#"{"attributes": "oops"}"#).unwrap().is_empty());
        assert!(Ledger::from_json(r#"{"attributes": null}"#).unwrap().is_empty());
        assert!(Ledger::from_json("{}").unwrap().is_empty());
    }

    #[test]
    fn malformed_entries_are_rejected() {
        let err = Ledger::from_json(r#"{"attributes": [{"label": "no id"}]}"#).unwrap_err();
        assert!(matches!(err, LedgerError::Parse(_)));
        assert!(Ledger::from_json("not json").is_err());
    }
}
