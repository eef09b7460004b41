use services::SyncReport;
use services::sync::OFFLINE_MESSAGE;

/// Text of the status line under the sync button.
///
/// The offline hint follows connectivity; any other message stays until replaced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncStatusLine {
    text: String,
}

impl SyncStatusLine {
    #[must_use]
    pub fn new(online: bool) -> Self {
        let mut line = Self::default();
        line.network_changed(online);
        line
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn network_changed(&mut self, online: bool) {
        if !online {
            OFFLINE_MESSAGE.clone_into(&mut self.text);
        } else if self.text == OFFLINE_MESSAGE {
            self.text.clear();
        }
    }

    /// Drop whatever is shown unless it is the offline hint.
    pub fn clear_unless_offline(&mut self) {
        if self.text != OFFLINE_MESSAGE {
            self.text.clear();
        }
    }

    pub fn show_report(&mut self, report: &SyncReport) {
        self.text = report.message();
    }
}
