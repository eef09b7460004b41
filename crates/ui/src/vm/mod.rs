mod attribute_select_vm;
mod checklist_vm;
mod history_vm;
mod session_meta_vm;
mod sync_status_vm;
mod time_fmt;

pub use attribute_select_vm::{
    AttributeOptionVm, AttributeSelectVm, EMPTY_LEDGER_LABEL, PLACEHOLDER_LABEL,
    map_attribute_select,
};
pub use checklist_vm::{ChecklistRowVm, capture_label, map_checklist};
pub use history_vm::{HistoryRowVm, map_history_rows};
pub use session_meta_vm::{
    MetaRowVm, PENDING_LABEL, SYNCED_LABEL, SessionMetaVm, map_session_meta, sync_badge,
};
pub use sync_status_vm::SyncStatusLine;
pub use time_fmt::{format_datetime, format_timestamp};
