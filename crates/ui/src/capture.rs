use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use dioxus::document;
use tracing::warn;

pub const PROMPT_MESSAGE: &str = "現地で読み取ったコードを入力してください。";

/// The item a capture is being taken for, with the value already on record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureTarget {
    pub item_id: String,
    pub initial: String,
}

/// A value to store for `item_id`. Already trimmed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureCommit {
    pub item_id: String,
    pub value: String,
}

impl CaptureCommit {
    fn new(item_id: &str, raw: &str) -> Self {
        Self {
            item_id: item_id.to_owned(),
            value: raw.trim().to_owned(),
        }
    }
}

/// What the view has to do after asking for a capture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureStart {
    /// Show the in-app modal for this target and wait for [`ModalCapture::close`].
    ShowModal(CaptureTarget),
    /// The dialog already finished; `None` means it was cancelled.
    Resolved(Option<CaptureCommit>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogReturn {
    Confirm,
    Cancel,
}

/// Collects a captured code from the operator.
#[async_trait(?Send)]
pub trait CaptureDialog: Send + Sync {
    async fn begin(&self, target: CaptureTarget) -> CaptureStart;
}

/// In-app modal rendered by the patrol view.
#[derive(Clone, Copy, Debug, Default)]
pub struct ModalCapture;

impl ModalCapture {
    /// Resolve the open modal. Confirm yields the trimmed input; cancel, or no open
    /// modal, yields nothing.
    #[must_use]
    pub fn close(
        target: Option<&CaptureTarget>,
        returned: DialogReturn,
        input: &str,
    ) -> Option<CaptureCommit> {
        let target = target?;
        match returned {
            DialogReturn::Confirm => Some(CaptureCommit::new(&target.item_id, input)),
            DialogReturn::Cancel => None,
        }
    }
}

#[async_trait(?Send)]
impl CaptureDialog for ModalCapture {
    async fn begin(&self, target: CaptureTarget) -> CaptureStart {
        CaptureStart::ShowModal(target)
    }
}

/// Blocking text prompt supplied by the host.
#[async_trait(?Send)]
pub trait CapturePrompt: Send + Sync {
    /// `None` when the operator cancelled.
    async fn prompt(&self, message: &str, initial: &str) -> Option<String>;
}

/// `window.prompt` inside the desktop webview.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebviewPrompt;

#[async_trait(?Send)]
impl CapturePrompt for WebviewPrompt {
    async fn prompt(&self, message: &str, initial: &str) -> Option<String> {
        let script = format!(
            "return window.prompt({}, {});",
            serde_json::Value::from(message),
            serde_json::Value::from(initial)
        );
        match document::eval(&script).join::<Option<String>>().await {
            Ok(value) => value,
            Err(err) => {
                warn!(error = ?err, "capture prompt failed");
                None
            }
        }
    }
}

/// Capture through a host prompt, for environments without modal support.
#[derive(Clone)]
pub struct PromptCapture {
    prompt: Arc<dyn CapturePrompt>,
}

impl PromptCapture {
    #[must_use]
    pub fn new(prompt: Arc<dyn CapturePrompt>) -> Self {
        Self { prompt }
    }
}

#[async_trait(?Send)]
impl CaptureDialog for PromptCapture {
    async fn begin(&self, target: CaptureTarget) -> CaptureStart {
        let answer = self.prompt.prompt(PROMPT_MESSAGE, &target.initial).await;
        CaptureStart::Resolved(answer.map(|raw| CaptureCommit::new(&target.item_id, &raw)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptureCapability {
    #[default]
    Modal,
    PromptOnly,
}

impl CaptureCapability {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Modal => "modal",
            Self::PromptOnly => "prompt",
        }
    }
}

impl fmt::Display for CaptureCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCapability(pub String);

impl fmt::Display for UnknownCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown capture mode: {} (expected modal or prompt)", self.0)
    }
}

impl std::error::Error for UnknownCapability {}

impl FromStr for CaptureCapability {
    type Err = UnknownCapability;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "modal" => Ok(Self::Modal),
            "prompt" => Ok(Self::PromptOnly),
            _ => Err(UnknownCapability(raw.to_owned())),
        }
    }
}

/// Pick the dialog implementation for the host's capability.
#[must_use]
pub fn capture_dialog_for(
    capability: CaptureCapability,
    prompt: Arc<dyn CapturePrompt>,
) -> Arc<dyn CaptureDialog> {
    match capability {
        CaptureCapability::Modal => Arc::new(ModalCapture),
        CaptureCapability::PromptOnly => Arc::new(PromptCapture::new(prompt)),
    }
}
