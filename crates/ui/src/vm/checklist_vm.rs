use patrol_core::model::{Attribute, ItemResult, ProgressRecord};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChecklistRowVm {
    pub item_id: String,
    pub title: String,
    pub description: String,
    pub code_label: Option<String>,
    pub completed: bool,
    pub capture: Option<String>,
    pub capture_label: Option<String>,
}

/// `読み取り結果: …` line shown under an item, absent when nothing was captured.
#[must_use]
pub fn capture_label(value: Option<&str>) -> Option<String> {
    value
        .filter(|value| !value.is_empty())
        .map(|value| format!("読み取り結果: {value}"))
}

/// One row per ledger item, in ledger order, joined with the stored results.
#[must_use]
pub fn map_checklist(attribute: &Attribute, progress: &ProgressRecord) -> Vec<ChecklistRowVm> {
    attribute
        .items
        .iter()
        .map(|item| {
            let result = progress.item(&item.id);
            let capture = result.and_then(ItemResult::capture).map(str::to_owned);
            ChecklistRowVm {
                item_id: item.id.clone(),
                title: item.title.clone(),
                description: item.description.clone(),
                code_label: (!item.code.is_empty()).then(|| format!("コード: {}", item.code)),
                completed: result.is_some_and(ItemResult::completed),
                capture_label: capture_label(capture.as_deref()),
                capture,
            }
        })
        .collect()
}
