pub mod app;
pub mod capture;
pub mod context;
pub mod routes;
pub mod views;
pub mod vm;

pub use app::App;
pub use capture::{CaptureCapability, CaptureDialog, WebviewPrompt, capture_dialog_for};
pub use context::{AppContext, UiApp, build_app_context};
