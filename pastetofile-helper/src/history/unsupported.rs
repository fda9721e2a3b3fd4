use pastetofile_core::{ClipboardHistory, CoreError, HistoryEntry};
use tracing::debug;

#[derive(Debug, Default)]
pub struct SystemHistory;

impl SystemHistory {
    pub fn new() -> Self {
        Self
    }
}

impl ClipboardHistory for SystemHistory {
    fn entries(&self) -> Result<Vec<Box<dyn HistoryEntry>>, CoreError> {
        Err(CoreError::HistoryUnavailable(
            "clipboard history requires Windows 10 or later".to_owned(),
        ))
    }

    fn clear(&self) -> bool {
        debug!("no clipboard history on this platform");
        false
    }
}
