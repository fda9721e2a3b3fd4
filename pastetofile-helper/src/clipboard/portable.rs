use arboard::Clipboard;
use pastetofile_core::{ClipboardAccess, ContentKind, PixelBuffer};
use tracing::{debug, warn};

/// `arboard` exposes text and images only, so HTML and RTF always probe as
/// absent here.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }

    fn open(&self) -> Option<Clipboard> {
        match Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(err) => {
                warn!("failed to open clipboard: {err}");
                None
            }
        }
    }
}

impl ClipboardAccess for SystemClipboard {
    /// `arboard` has no format query, so probing reads the content itself.
    /// For images that means a full fetch and decode, holding the clipboard
    /// for as long as `read_image` does.
    fn is_available(&self, kind: ContentKind) -> bool {
        match kind {
            ContentKind::Text => self
                .open()
                .is_some_and(|mut clipboard| clipboard.get_text().is_ok()),
            ContentKind::Image => self
                .open()
                .is_some_and(|mut clipboard| clipboard.get_image().is_ok()),
            ContentKind::Html | ContentKind::Rtf => false,
        }
    }

    fn read_raw(&self, kind: ContentKind) -> Option<Vec<u8>> {
        debug!(%kind, "raw clipboard formats are not available on this platform");
        None
    }

    fn read_text(&self) -> Option<String> {
        let mut clipboard = self.open()?;
        match clipboard.get_text() {
            Ok(text) => Some(text),
            Err(err) => {
                debug!("no clipboard text: {err}");
                None
            }
        }
    }

    fn read_image(&self) -> Option<PixelBuffer> {
        let mut clipboard = self.open()?;
        let image = match clipboard.get_image() {
            Ok(image) => image,
            Err(err) => {
                debug!("no clipboard image: {err}");
                return None;
            }
        };
        let width = u32::try_from(image.width).ok()?;
        let height = u32::try_from(image.height).ok()?;
        PixelBuffer::from_rgba(width, height, &image.bytes)
    }

    fn clear(&self) -> bool {
        let Some(mut clipboard) = self.open() else {
            return false;
        };
        match clipboard.clear() {
            Ok(()) => true,
            Err(err) => {
                warn!("failed to clear clipboard: {err}");
                false
            }
        }
    }
}
