use chrono::Local;
use dioxus::prelude::*;
use patrol_core::model::{ItemResult, ProgressRecord, Session};
use services::{Connectivity, PatrolSessionService, SessionSnapshot};

use crate::capture::{
    CaptureCommit, CaptureStart, CaptureTarget, DialogReturn, ModalCapture, PROMPT_MESSAGE,
};
use crate::context::AppContext;
use crate::vm::{
    AttributeSelectVm, ChecklistRowVm, SessionMetaVm, SyncStatusLine, map_attribute_select,
    map_checklist, map_session_meta,
};

fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

fn replace_progress(mut snapshot: Signal<Option<SessionSnapshot>>, progress: ProgressRecord) {
    if let Some(current) = snapshot.write().as_mut() {
        current.progress = progress;
    }
}

async fn apply_commit(
    patrol: &PatrolSessionService,
    commit: CaptureCommit,
    snapshot: Signal<Option<SessionSnapshot>>,
) {
    if let Some(progress) = patrol.apply_capture(&commit.item_id, &commit.value).await {
        replace_progress(snapshot, progress);
    }
}

#[component]
pub fn PatrolView() -> Element {
    let ctx = use_context::<AppContext>();
    let select_vm = map_attribute_select(&ctx.patrol().ledger());

    let mut operator = use_signal(String::new);
    let mut date = use_signal(today);
    let mut attribute_id = use_signal(String::new);
    let mut snapshot = use_signal(|| None::<SessionSnapshot>);
    let status = use_signal({
        let network = ctx.network();
        move || SyncStatusLine::new(network.is_online())
    });
    let offline = use_signal({
        let network = ctx.network();
        move || !network.is_online()
    });
    let capture_target = use_signal(|| None::<CaptureTarget>);
    let mut capture_input = use_signal(String::new);

    let restored = use_resource({
        let patrol = ctx.patrol();
        move || {
            let patrol = patrol.clone();
            async move { patrol.restore().await }
        }
    });

    use_effect(move || {
        let Some(found) = restored.value().read().as_ref().cloned().flatten() else {
            return;
        };
        operator.set(found.active.session.operator().to_owned());
        date.set(found.active.session.date().to_owned());
        attribute_id.set(found.active.session.attribute_id().to_owned());
        snapshot.set(Some(found));
    });

    let on_start = {
        let patrol = ctx.patrol();
        let mut status = status;
        use_callback(move |()| {
            let Ok(session) = Session::new(operator(), date(), attribute_id()) else {
                return;
            };
            let patrol = patrol.clone();
            spawn(async move {
                if let Some(opened) = patrol.start(session).await {
                    snapshot.set(Some(opened));
                    status.write().clear_unless_offline();
                }
            });
        })
    };

    let on_reset = {
        let patrol = ctx.patrol();
        let mut status = status;
        use_callback(move |()| {
            let patrol = patrol.clone();
            spawn(async move {
                patrol.reset().await;
                snapshot.set(None);
                operator.set(String::new());
                date.set(today());
                attribute_id.set(String::new());
                status.write().clear_unless_offline();
            });
        })
    };

    let on_toggle = {
        let patrol = ctx.patrol();
        use_callback(move |(item_id, completed): (String, bool)| {
            let patrol = patrol.clone();
            spawn(async move {
                if let Some(progress) = patrol.set_completed(&item_id, completed).await {
                    replace_progress(snapshot, progress);
                }
            });
        })
    };

    let on_capture = {
        let patrol = ctx.patrol();
        let dialog = ctx.capture_dialog();
        let mut capture_target = capture_target;
        use_callback(move |item_id: String| {
            let initial = snapshot
                .peek()
                .as_ref()
                .and_then(|current| current.progress.item(&item_id))
                .and_then(ItemResult::capture)
                .unwrap_or_default()
                .to_owned();
            let patrol = patrol.clone();
            let dialog = dialog.clone();
            spawn(async move {
                match dialog.begin(CaptureTarget { item_id, initial }).await {
                    CaptureStart::ShowModal(target) => {
                        capture_input.set(target.initial.clone());
                        capture_target.set(Some(target));
                    }
                    CaptureStart::Resolved(Some(commit)) => {
                        apply_commit(&patrol, commit, snapshot).await;
                    }
                    CaptureStart::Resolved(None) => {}
                }
            });
        })
    };

    let on_capture_close = {
        let patrol = ctx.patrol();
        let mut capture_target = capture_target;
        use_callback(move |returned: DialogReturn| {
            let commit = ModalCapture::close(
                capture_target.peek().as_ref(),
                returned,
                &capture_input.peek(),
            );
            capture_target.set(None);
            capture_input.set(String::new());
            if let Some(commit) = commit {
                let patrol = patrol.clone();
                spawn(async move {
                    apply_commit(&patrol, commit, snapshot).await;
                });
            }
        })
    };

    let on_sync = {
        let patrol = ctx.patrol();
        let sync = ctx.sync();
        let mut status = status;
        use_callback(move |()| {
            let patrol = patrol.clone();
            let sync = sync.clone();
            spawn(async move {
                let report = sync.sync().await;
                status.write().show_report(&report);
                if let Some(latest) = patrol.snapshot().await {
                    snapshot.set(Some(latest));
                }
            });
        })
    };

    let on_offline_change = {
        let network = ctx.network();
        let mut offline = offline;
        let mut status = status;
        use_callback(move |is_offline: bool| {
            network.set_online(!is_offline);
            offline.set(is_offline);
            status.write().network_changed(!is_offline);
        })
    };

    let session_panel = match snapshot() {
        Some(current) => {
            let meta = map_session_meta(
                &current.active.session,
                &current.active.attribute,
                &current.progress,
            );
            let rows = map_checklist(&current.active.attribute, &current.progress);
            rsx! {
                section { class: "panel patrol-session",
                    SessionMetaPanel { meta }
                    ul { class: "checklist",
                        for row in rows {
                            ChecklistRow {
                                key: "{row.item_id}",
                                row: row.clone(),
                                on_toggle,
                                on_capture,
                            }
                        }
                    }
                }
            }
        }
        None => rsx! {
            p { class: "empty-state", "巡回を開始するとチェックリストが表示されます。" }
        },
    };

    let status_text = status.read().text().to_owned();

    rsx! {
        div { class: "page",
            h2 { "巡回チェック" }

            SessionForm {
                select_vm,
                operator: operator(),
                date: date(),
                attribute_id: attribute_id(),
                on_operator: move |value: String| operator.set(value),
                on_date: move |value: String| date.set(value),
                on_attribute: move |value: String| attribute_id.set(value),
                on_start,
                on_reset,
            }

            {session_panel}

            section { class: "panel sync-panel",
                div { class: "sync-actions",
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        onclick: move |_| on_sync.call(()),
                        "同期"
                    }
                    label { class: "offline-toggle",
                        input {
                            r#type: "checkbox",
                            checked: offline(),
                            onchange: move |evt: FormEvent| on_offline_change.call(evt.checked()),
                        }
                        "オフライン"
                    }
                }
                p { id: "sync-status", class: "sync-status", role: "status", "{status_text}" }
            }

            if let Some(target) = capture_target() {
                CaptureModal {
                    item_id: target.item_id,
                    value: capture_input(),
                    on_input: move |value: String| capture_input.set(value),
                    on_close: on_capture_close,
                }
            }
        }
    }
}

#[component]
fn SessionForm(
    select_vm: AttributeSelectVm,
    operator: String,
    date: String,
    attribute_id: String,
    on_operator: EventHandler<String>,
    on_date: EventHandler<String>,
    on_attribute: EventHandler<String>,
    on_start: Callback<()>,
    on_reset: Callback<()>,
) -> Element {
    rsx! {
        section { class: "panel session-form",
            label { class: "field",
                span { "担当者" }
                input {
                    r#type: "text",
                    name: "operator",
                    value: "{operator}",
                    oninput: move |evt| on_operator.call(evt.value()),
                }
            }
            label { class: "field",
                span { "巡回日" }
                input {
                    r#type: "date",
                    name: "patrol-date",
                    value: "{date}",
                    oninput: move |evt| on_date.call(evt.value()),
                }
            }
            label { class: "field",
                span { "巡回属性" }
                select {
                    name: "patrol-attribute",
                    disabled: select_vm.select_disabled,
                    onchange: move |evt| on_attribute.call(evt.value()),
                    for choice in select_vm.options.iter() {
                        option {
                            key: "{choice.value}",
                            value: "{choice.value}",
                            selected: choice.value == attribute_id,
                            "{choice.label}"
                        }
                    }
                }
            }
            div { class: "form-actions",
                button {
                    class: "btn btn-primary",
                    r#type: "button",
                    disabled: select_vm.submit_disabled,
                    onclick: move |_| on_start.call(()),
                    "巡回を開始"
                }
                button {
                    class: "btn",
                    r#type: "button",
                    onclick: move |_| on_reset.call(()),
                    "リセット"
                }
            }
        }
    }
}

#[component]
fn SessionMetaPanel(meta: SessionMetaVm) -> Element {
    rsx! {
        div { class: "patrol-meta",
            for row in meta.rows.iter() {
                p { key: "{row.label}",
                    strong { "{row.label}:" }
                    " {row.value}"
                }
            }
            p {
                strong { "同期状態:" }
                " "
                span { class: "{meta.badge_class}", "{meta.badge_label}" }
                if let Some(note) = meta.synced_note.as_ref() {
                    " "
                    span { class: "meta-note", "{note}" }
                }
            }
        }
    }
}

#[component]
fn ChecklistRow(
    row: ChecklistRowVm,
    on_toggle: Callback<(String, bool)>,
    on_capture: Callback<String>,
) -> Element {
    let toggle_id = row.item_id.clone();
    let capture_id = row.item_id.clone();
    let item_class = if row.completed {
        "checklist-item checklist-item--done"
    } else {
        "checklist-item"
    };

    rsx! {
        li { class: "{item_class}",
            label { class: "item-main",
                input {
                    r#type: "checkbox",
                    checked: row.completed,
                    onchange: move |evt: FormEvent| on_toggle.call((toggle_id.clone(), evt.checked())),
                }
                div { class: "item-text",
                    span { class: "item-title", "{row.title}" }
                    if !row.description.is_empty() {
                        p { class: "item-description", "{row.description}" }
                    }
                    if let Some(code) = row.code_label.as_ref() {
                        p { class: "item-code", "{code}" }
                    }
                    if let Some(info) = row.capture_label.as_ref() {
                        p { class: "capture-info", "{info}" }
                    }
                }
            }
            button {
                class: "btn capture-button",
                r#type: "button",
                onclick: move |_| on_capture.call(capture_id.clone()),
                "コード読取"
            }
        }
    }
}

#[component]
fn CaptureModal(
    item_id: String,
    value: String,
    on_input: EventHandler<String>,
    on_close: Callback<DialogReturn>,
) -> Element {
    rsx! {
        div {
            class: "modal-overlay",
            onclick: move |_| on_close.call(DialogReturn::Cancel),
            div {
                class: "modal",
                role: "dialog",
                "data-item": "{item_id}",
                onclick: move |evt| evt.stop_propagation(),
                h3 { class: "modal-title", "コード読取" }
                p { class: "modal-body", "{PROMPT_MESSAGE}" }
                input {
                    class: "capture-input",
                    r#type: "text",
                    autofocus: true,
                    value: "{value}",
                    oninput: move |evt| on_input.call(evt.value()),
                }
                div { class: "modal-actions",
                    button {
                        class: "btn",
                        r#type: "button",
                        onclick: move |_| on_close.call(DialogReturn::Cancel),
                        "キャンセル"
                    }
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        onclick: move |_| on_close.call(DialogReturn::Confirm),
                        "登録"
                    }
                }
            }
        }
    }
}
