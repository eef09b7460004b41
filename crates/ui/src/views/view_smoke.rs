use patrol_core::model::Session;
use services::sync::OFFLINE_MESSAGE;

use super::test_harness::{
    LEDGER_JSON, ViewKind, seeded_storage, services_for, setup_view_harness,
    setup_view_harness_with_storage,
};
use crate::vm::{EMPTY_LEDGER_LABEL, PLACEHOLDER_LABEL};

#[tokio::test(flavor = "current_thread")]
async fn patrol_view_without_ledger_disables_the_form() {
    let mut harness = setup_view_harness(ViewKind::Patrol, None).await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains(EMPTY_LEDGER_LABEL), "missing empty label in {html}");
    assert!(!html.contains(PLACEHOLDER_LABEL), "unexpected placeholder in {html}");
    assert!(html.contains("disabled"), "form not disabled in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn patrol_view_lists_ledger_attributes() {
    let mut harness = setup_view_harness(ViewKind::Patrol, Some(LEDGER_JSON)).await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains(PLACEHOLDER_LABEL), "missing placeholder in {html}");
    assert!(html.contains("ラインA"), "missing attribute in {html}");
    assert!(html.contains("ラインB"), "missing attribute in {html}");
    assert!(!html.contains(EMPTY_LEDGER_LABEL), "unexpected empty label in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn patrol_view_restores_the_stored_session() {
    let storage = seeded_storage(Some(LEDGER_JSON)).await;
    {
        let services = services_for(&storage, true).await;
        let patrol = services.patrol();
        let session = Session::new("佐藤", "2024-05-20", "line-a").unwrap();
        patrol.start(session).await.expect("known attribute");
        patrol.set_completed("a-1", true).await.expect("active session");
        patrol.apply_capture("a-1", " FX-01 ").await.expect("active session");
    }

    let mut harness = setup_view_harness_with_storage(ViewKind::Patrol, &storage, true).await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    for expected in [
        "担当者:",
        "佐藤",
        "消火器",
        "非常口",
        "コード: FX-01",
        "読み取り結果: FX-01",
        "未同期",
        "badge--pending",
    ] {
        assert!(html.contains(expected), "missing {expected} in {html}");
    }
}

#[tokio::test(flavor = "current_thread")]
async fn patrol_view_shows_offline_hint() {
    let storage = seeded_storage(Some(LEDGER_JSON)).await;
    let mut harness = setup_view_harness_with_storage(ViewKind::Patrol, &storage, false).await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains(OFFLINE_MESSAGE), "missing offline hint in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn history_view_lists_recorded_sessions() {
    let storage = seeded_storage(Some(LEDGER_JSON)).await;
    {
        let services = services_for(&storage, true).await;
        let patrol = services.patrol();
        let session = Session::new("佐藤", "2024-05-20", "line-a").unwrap();
        patrol.start(session).await.expect("known attribute");
        patrol.set_completed("a-1", true).await.expect("active session");
        services.sync().sync().await;
    }

    let mut harness = setup_view_harness_with_storage(ViewKind::History, &storage, true).await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    for expected in ["佐藤", "2024-05-20", "ラインA", "1 / 1", "同期済み"] {
        assert!(html.contains(expected), "missing {expected} in {html}");
    }
}

#[tokio::test(flavor = "current_thread")]
async fn history_view_without_records_says_so() {
    let mut harness = setup_view_harness(ViewKind::History, Some(LEDGER_JSON)).await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(
        html.contains("記録された巡回はまだありません。"),
        "missing empty state in {html}"
    );
}
