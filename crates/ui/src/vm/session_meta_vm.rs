use patrol_core::model::{Attribute, ProgressRecord, Session};

use crate::vm::time_fmt::format_datetime;

pub const SYNCED_LABEL: &str = "同期済み";
pub const PENDING_LABEL: &str = "未同期";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaRowVm {
    pub label: &'static str,
    pub value: String,
}

/// Header panel of an open session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionMetaVm {
    pub rows: Vec<MetaRowVm>,
    pub badge_class: &'static str,
    pub badge_label: &'static str,
    pub synced_note: Option<String>,
}

#[must_use]
pub fn sync_badge(synced: bool) -> (&'static str, &'static str) {
    if synced {
        ("badge badge--synced", SYNCED_LABEL)
    } else {
        ("badge badge--pending", PENDING_LABEL)
    }
}

#[must_use]
pub fn map_session_meta(
    session: &Session,
    attribute: &Attribute,
    progress: &ProgressRecord,
) -> SessionMetaVm {
    let mut rows = vec![
        MetaRowVm {
            label: "担当者",
            value: session.operator().to_owned(),
        },
        MetaRowVm {
            label: "巡回日",
            value: session.date().to_owned(),
        },
        MetaRowVm {
            label: "巡回属性",
            value: attribute.label.clone(),
        },
    ];
    if let Some(updated_at) = progress.updated_at {
        rows.push(MetaRowVm {
            label: "最終更新",
            value: format_datetime(updated_at),
        });
    }

    let (badge_class, badge_label) = sync_badge(progress.synced);
    let synced_note = progress
        .synced_at
        .filter(|_| progress.synced)
        .map(format_datetime);

    SessionMetaVm {
        rows,
        badge_class,
        badge_label,
        synced_note,
    }
}
