use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{Attribute, Session};

/// Who ran a session and against which attribute, denormalized for listings.
///
/// Fields missing from stored JSON read as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionMeta {
    pub operator: String,
    pub date: String,
    pub attribute_id: String,
    pub attribute_label: String,
}

impl SessionMeta {
    #[must_use]
    pub fn new(session: &Session, attribute: &Attribute) -> Self {
        Self {
            operator: session.operator().to_owned(),
            date: session.date().to_owned(),
            attribute_id: session.attribute_id().to_owned(),
            attribute_label: attribute.label.clone(),
        }
    }
}

/// Recorded state of one checklist item.
///
/// Only set fields exist: `completed` is either `true` or absent, and `capture` is
/// either a non-empty string or absent. Stored `false`/`""` placeholders are dropped
/// on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ItemResultDraft")]
pub struct ItemResult {
    #[serde(skip_serializing_if = "is_false")]
    completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    capture: Option<String>,
}

#[derive(Deserialize)]
struct ItemResultDraft {
    #[serde(default)]
    completed: Option<bool>,
    #[serde(default)]
    capture: Option<String>,
}

impl From<ItemResultDraft> for ItemResult {
    fn from(draft: ItemResultDraft) -> Self {
        Self {
            completed: draft.completed.unwrap_or(false),
            capture: draft.capture.filter(|value| !value.is_empty()),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ItemResult {
    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn capture(&self) -> Option<&str> {
        self.capture.as_deref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.completed && self.capture.is_none()
    }

    /// Apply a patch. Fields the patch does not mention are kept.
    #[must_use]
    pub fn merge(&self, patch: &ItemPatch) -> Self {
        let mut next = self.clone();
        if let Some(completed) = patch.completed {
            next.completed = completed;
        }
        if let Some(capture) = patch.capture.as_ref() {
            next.capture = if capture.is_empty() {
                None
            } else {
                Some(capture.clone())
            };
        }
        next
    }
}

/// Partial update for an item. `None` leaves the field untouched; `Some(false)` and
/// `Some("")` clear it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub completed: Option<bool>,
    pub capture: Option<String>,
}

impl ItemPatch {
    #[must_use]
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            capture: None,
        }
    }

    #[must_use]
    pub fn capture(value: impl Into<String>) -> Self {
        Self {
            completed: None,
            capture: Some(value.into()),
        }
    }
}

/// Persisted progress of one session: item results plus sync status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<SessionMeta>,
    #[serde(default, deserialize_with = "non_empty_items")]
    pub items: BTreeMap<String, ItemResult>,
    #[serde(default)]
    pub synced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    #[must_use]
    pub fn item(&self, item_id: &str) -> Option<&ItemResult> {
        self.items.get(item_id)
    }

    /// Merge `patch` into one item and invalidate the sync status.
    ///
    /// The item is removed when nothing is left set. `synced`/`synced_at` are cleared
    /// and `updated_at` rewritten on every call, even when the merge is a no-op.
    pub fn apply_item_patch(&mut self, item_id: &str, patch: &ItemPatch, now: DateTime<Utc>) {
        let current = self.items.get(item_id).cloned().unwrap_or_default();
        let next = current.merge(patch);
        if next.is_empty() {
            self.items.remove(item_id);
        } else {
            self.items.insert(item_id.to_owned(), next);
        }
        self.synced = false;
        self.synced_at = None;
        self.updated_at = Some(now);
    }

    /// Unsynced and has at least one recorded item.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.synced && !self.items.is_empty()
    }

    pub fn mark_synced(&mut self, at: DateTime<Utc>) {
        self.synced = true;
        self.synced_at = Some(at);
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.items.values().filter(|item| item.completed()).count()
    }
}

fn non_empty_items<'de, D>(deserializer: D) -> Result<BTreeMap<String, ItemResult>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Option::<BTreeMap<String, ItemResult>>::deserialize(deserializer)?;
    Ok(items
        .unwrap_or_default()
        .into_iter()
        .filter(|(_, item)| !item.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn clearing_the_only_field_removes_the_item() {
        let now = fixed_now();
        let mut record = ProgressRecord::default();

        record.apply_item_patch("a-1", &ItemPatch::completed(true), now);
        assert!(record.item("a-1").is_some_and(ItemResult::completed));
        record.apply_item_patch("a-1", &ItemPatch::completed(false), now);
        assert!(record.item("a-1").is_none());

        record.apply_item_patch("a-2", &ItemPatch::capture("QR-9"), now);
        assert_eq!(record.item("a-2").and_then(ItemResult::capture), Some("QR-9"));
        record.apply_item_patch("a-2", &ItemPatch::capture(""), now);
        assert!(record.items.is_empty());
    }

    #[test]
    fn patch_keeps_fields_it_does_not_mention() {
        let now = fixed_now();
        let mut record = ProgressRecord::default();
        record.apply_item_patch("a-1", &ItemPatch::capture("QR-9"), now);
        record.apply_item_patch("a-1", &ItemPatch::completed(true), now);
        record.apply_item_patch("a-1", &ItemPatch::completed(false), now);

        let item = record.item("a-1").expect("capture keeps the item alive");
        assert!(!item.completed());
        assert_eq!(item.capture(), Some("QR-9"));
    }

    #[test]
    fn every_patch_invalidates_sync_state() {
        let now = fixed_now();
        let mut record = ProgressRecord::default();
        record.apply_item_patch("a-1", &ItemPatch::completed(true), now);
        record.mark_synced(now);
        assert!(!record.is_pending());

        let later = now + Duration::minutes(3);
        // Same value again: no net change, sync state still reset.
        record.apply_item_patch("a-1", &ItemPatch::completed(true), later);
        assert!(!record.synced);
        assert!(record.synced_at.is_none());
        assert_eq!(record.updated_at, Some(later));
        assert!(record.is_pending());
    }

    #[test]
    fn serializes_only_set_fields() {
        let now = fixed_now();
        let mut record = ProgressRecord::default();
        record.apply_item_patch("a-1", &ItemPatch::completed(true), now);
        record.apply_item_patch("a-2", &ItemPatch::capture("QR-9"), now);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["items"]["a-1"], serde_json::json!({ "completed": true }));
        assert_eq!(json["items"]["a-2"], serde_json::json!({ "capture": "QR-9" }));
        assert_eq!(json["synced"], serde_json::json!(false));
        assert!(json.get("syncedAt").is_none());
        assert!(json.get("meta").is_none());
        assert_eq!(json["updatedAt"], serde_json::json!("2024-05-20T06:00:00Z"));
    }

    #[test]
    fn reading_drops_placeholder_values() {
        let record: ProgressRecord = serde_json::from_str(
            r#"{
                "items": {
                    "a-1": { "completed": false, "capture": "" },
                    "a-2": { "completed": false, "capture": "QR-9" },
                    "a-3": {}
                },
                "synced": true,
                "syncedAt": "2024-05-20T06:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(record.items.len(), 1);
        let item = record.item("a-2").unwrap();
        assert!(!item.completed());
        assert_eq!(item.capture(), Some("QR-9"));
        assert_eq!(record.synced_at, Some(fixed_now()));
    }

    #[test]
    fn missing_fields_default_to_empty_unsynced() {
        let record: ProgressRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record, ProgressRecord::default());
        assert!(!record.is_pending());
    }

    #[test]
    fn meta_without_attribute_label_still_reads() {
        let record: ProgressRecord = serde_json::from_str(
            r#"{
                "meta": { "operator": "B", "date": "2024-05-19", "attributeId": "line-b" },
                "items": { "b-1": { "completed": true } }
            }"#,
        )
        .unwrap();

        let meta = record.meta.as_ref().unwrap();
        assert_eq!(meta.attribute_id, "line-b");
        assert_eq!(meta.attribute_label, "");
        assert!(record.item("b-1").is_some_and(ItemResult::completed));
    }
}
