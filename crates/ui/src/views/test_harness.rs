use std::sync::Arc;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use patrol_core::model::SessionIdScheme;
use patrol_core::time::fixed_clock;
use services::{
    AppConfig, AppServices, LedgerSourceConfig, NetworkStatus, PatrolSessionService,
    SessionProgressStore, SyncDispatcher,
};
use storage::repository::{KeyValueStore, Storage};
use storage::keys;

use crate::capture::{CaptureDialog, ModalCapture};
use crate::context::{UiApp, build_app_context};
use crate::views::{HistoryView, PatrolView};

pub const LEDGER_JSON: &str = r#"{"attributes":[
    {"id":"line-a","label":"ラインA","items":[
        {"id":"a-1","title":"消火器","description":"圧力計を確認","code":"FX-01"},
        {"id":"a-2","title":"非常口","description":"通路に障害物がないこと"}
    ]},
    {"id":"line-b","label":"ラインB","items":[]}
]}"#;

#[derive(Clone)]
struct TestApp {
    services: AppServices,
}

impl UiApp for TestApp {
    fn patrol(&self) -> Arc<PatrolSessionService> {
        self.services.patrol()
    }

    fn progress(&self) -> Arc<SessionProgressStore> {
        self.services.progress()
    }

    fn sync(&self) -> Arc<SyncDispatcher> {
        self.services.sync()
    }

    fn network(&self) -> NetworkStatus {
        self.services.network()
    }

    fn capture_dialog(&self) -> Arc<dyn CaptureDialog> {
        Arc::new(ModalCapture)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Patrol,
    History,
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ViewHarnessProps {}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view);
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Patrol => rsx! { PatrolView {} },
        ViewKind::History => rsx! { HistoryView {} },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub services: AppServices,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Let resources resolve and the effects they trigger re-render.
    pub async fn settle(&mut self) {
        for _ in 0..4 {
            self.drive_async().await;
        }
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

/// In-memory storage with `ledger_json` in the ledger cache slot.
pub async fn seeded_storage(ledger_json: Option<&str>) -> Storage {
    let storage = Storage::in_memory();
    if let Some(raw) = ledger_json {
        storage.kv.set(keys::LEDGER, raw).await.expect("seed ledger");
    }
    storage
}

/// Services over `storage`. The ledger source never answers, so the cached
/// ledger is what gets loaded.
pub async fn services_for(storage: &Storage, online: bool) -> AppServices {
    let config = AppConfig {
        clock: fixed_clock(),
        ledger_source: LedgerSourceConfig::File("/nonexistent/patrolmate/ledger.json".into()),
        id_scheme: SessionIdScheme::Joined,
        online,
    };
    AppServices::from_storage(storage, &config).await
}

pub async fn setup_view_harness(view: ViewKind, ledger_json: Option<&str>) -> ViewHarness {
    let storage = seeded_storage(ledger_json).await;
    setup_view_harness_with_storage(view, &storage, true).await
}

pub async fn setup_view_harness_with_storage(
    view: ViewKind,
    storage: &Storage,
    online: bool,
) -> ViewHarness {
    let services = services_for(storage, online).await;
    let app = Arc::new(TestApp {
        services: services.clone(),
    });
    let dom = VirtualDom::new_with_props(ViewRouterHarness, ViewHarnessProps { app, view });
    ViewHarness { dom, services }
}
