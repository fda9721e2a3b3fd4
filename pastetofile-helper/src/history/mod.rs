//! Clipboard history store. Only Windows 10 and later expose one; other
//! platforms report it as unavailable.

use pastetofile_core::{ContentKind, HistoryEntry, Payload};

#[cfg(target_os = "windows")]
mod winrt;
#[cfg(target_os = "windows")]
pub use self::winrt::SystemHistory;

#[cfg(not(target_os = "windows"))]
mod unsupported;
#[cfg(not(target_os = "windows"))]
pub use self::unsupported::SystemHistory;

/// A history item read up front, so nothing platform-bound outlives the
/// enumeration call. A kind mapped to `None` was advertised but unreadable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedEntry {
    contents: Vec<(ContentKind, Option<Payload>)>,
}

impl CapturedEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ContentKind, payload: Option<Payload>) {
        self.contents.retain(|(existing, _)| *existing != kind);
        self.contents.push((kind, payload));
    }

    pub fn kinds(&self) -> impl Iterator<Item = ContentKind> + '_ {
        self.contents.iter().map(|(kind, _)| *kind)
    }
}

impl HistoryEntry for CapturedEntry {
    fn contains(&self, kind: ContentKind) -> bool {
        self.contents.iter().any(|(k, _)| *k == kind)
    }

    fn content(&self, kind: ContentKind) -> Option<Payload> {
        self.contents
            .iter()
            .find(|(k, _)| *k == kind)
            .and_then(|(_, payload)| payload.clone())
    }
}
