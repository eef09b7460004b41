use dioxus::prelude::*;

use crate::context::AppContext;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{HistoryRowVm, map_history_rows};

#[component]
pub fn HistoryView() -> Element {
    let ctx = use_context::<AppContext>();
    let progress = ctx.progress();

    let resource = use_resource(move || {
        let progress = progress.clone();
        async move {
            let records = progress.records().await;
            Ok::<_, ViewError>(map_history_rows(records.iter().map(|(id, record)| (id, record))))
        }
    });

    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page",
            h2 { "巡回履歴" }

            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "読み込み中..." }
                },
                ViewState::Ready(rows) => rsx! {
                    if rows.is_empty() {
                        p { class: "empty-state", "記録された巡回はまだありません。" }
                    } else {
                        table { class: "history-table",
                            thead {
                                tr {
                                    th { "担当者" }
                                    th { "巡回日" }
                                    th { "巡回属性" }
                                    th { "記録" }
                                    th { "最終更新" }
                                    th { "同期状態" }
                                }
                            }
                            tbody {
                                for row in rows {
                                    HistoryRow { key: "{row.session_id}", row: row.clone() }
                                }
                            }
                        }
                    }
                },
                ViewState::Error(_) => rsx! {
                    p { "{ViewError::message()}" }
                },
            }
        }
    }
}

#[component]
fn HistoryRow(row: HistoryRowVm) -> Element {
    rsx! {
        tr {
            td { "{row.operator}" }
            td { "{row.date}" }
            td { "{row.attribute_label}" }
            td { "{row.completed_count} / {row.item_count}" }
            td { "{row.updated_at_str}" }
            td {
                span { class: "{row.badge_class}", "{row.badge_label}" }
            }
        }
    }
}
