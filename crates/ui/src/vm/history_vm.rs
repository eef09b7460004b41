use patrol_core::model::{ProgressRecord, SessionId};

use crate::vm::session_meta_vm::sync_badge;
use crate::vm::time_fmt::format_datetime;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRowVm {
    pub session_id: String,
    pub operator: String,
    pub date: String,
    pub attribute_label: String,
    pub item_count: usize,
    pub completed_count: usize,
    pub badge_class: &'static str,
    pub badge_label: &'static str,
    pub updated_at_str: String,
}

impl HistoryRowVm {
    fn new(session_id: &SessionId, record: &ProgressRecord) -> Self {
        let (badge_class, badge_label) = sync_badge(record.synced);
        let (operator, date, attribute_label) = match &record.meta {
            Some(meta) => (
                meta.operator.clone(),
                meta.date.clone(),
                meta.attribute_label.clone(),
            ),
            None => ("-".to_owned(), "-".to_owned(), "-".to_owned()),
        };
        Self {
            session_id: session_id.to_string(),
            operator,
            date,
            attribute_label,
            item_count: record.items.len(),
            completed_count: record.completed_count(),
            badge_class,
            badge_label,
            updated_at_str: record.updated_at.map(format_datetime).unwrap_or_default(),
        }
    }
}

/// Most recently updated sessions first; never-updated ones last, by id.
#[must_use]
pub fn map_history_rows<'a>(
    records: impl IntoIterator<Item = (&'a SessionId, &'a ProgressRecord)>,
) -> Vec<HistoryRowVm> {
    let mut entries: Vec<_> = records.into_iter().collect();
    entries.sort_by(|(a_id, a), (b_id, b)| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a_id.cmp(b_id))
    });
    entries
        .into_iter()
        .map(|(id, record)| HistoryRowVm::new(id, record))
        .collect()
}
