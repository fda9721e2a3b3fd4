use pastetofile_core::{ClipboardHistory, ContentKind, CoreError, HistoryEntry, Payload};
use tracing::{debug, warn};
use windows::{
    ApplicationModel::DataTransfer::{
        Clipboard, ClipboardHistoryItemsResultStatus, DataPackageView, StandardDataFormats,
    },
    Storage::Streams::DataReader,
    core::{HRESULT, HSTRING},
};

use super::CapturedEntry;

const E_OUTOFMEMORY: HRESULT = HRESULT(0x8007_000E_u32 as i32);

/// Windows clipboard history through the WinRT `Clipboard` statics.
#[derive(Debug, Default)]
pub struct SystemHistory;

impl SystemHistory {
    pub fn new() -> Self {
        Self
    }
}

impl ClipboardHistory for SystemHistory {
    fn entries(&self) -> Result<Vec<Box<dyn HistoryEntry>>, CoreError> {
        let views = history_views()?;
        Ok(views
            .iter()
            .map(|view| Box::new(capture(view)) as Box<dyn HistoryEntry>)
            .collect())
    }

    fn clear(&self) -> bool {
        match Clipboard::ClearHistory() {
            Ok(cleared) => cleared,
            Err(err) => {
                warn!("failed to clear clipboard history: {err}");
                false
            }
        }
    }
}

fn unavailable(err: windows::core::Error) -> CoreError {
    CoreError::HistoryUnavailable(err.to_string())
}

fn history_views() -> Result<Vec<DataPackageView>, CoreError> {
    let result = Clipboard::GetHistoryItemsAsync()
        .and_then(|op| op.get())
        .map_err(unavailable)?;
    let status = result.Status().map_err(unavailable)?;
    if status == ClipboardHistoryItemsResultStatus::AccessDenied {
        return Err(CoreError::HistoryUnavailable("access denied".to_owned()));
    }
    if status == ClipboardHistoryItemsResultStatus::ClipboardHistoryDisabled {
        return Err(CoreError::HistoryUnavailable(
            "clipboard history is disabled".to_owned(),
        ));
    }
    if status != ClipboardHistoryItemsResultStatus::Success {
        return Err(CoreError::HistoryUnavailable(format!(
            "unexpected status {}",
            status.0
        )));
    }

    let items = result.Items().map_err(unavailable)?;
    let count = items.Size().map_err(unavailable)?;
    let mut views = Vec::with_capacity(count as usize);
    for index in 0..count {
        let view = items
            .GetAt(index)
            .and_then(|item| item.Content())
            .map_err(unavailable)?;
        views.push(view);
    }
    debug!(count, "read clipboard history");
    Ok(views)
}

fn capture(view: &DataPackageView) -> CapturedEntry {
    let mut entry = CapturedEntry::new();
    for kind in ContentKind::ALL {
        match contains(view, kind) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(err) => {
                debug!(%kind, "format query failed: {err}");
                continue;
            }
        }
        let payload = match read(view, kind) {
            Ok(payload) => Some(payload),
            Err(err) => {
                warn!(%kind, "failed to read history item: {err}");
                None
            }
        };
        entry.push(kind, payload);
    }
    entry
}

fn format_id(kind: ContentKind) -> windows::core::Result<HSTRING> {
    match kind {
        ContentKind::Text => StandardDataFormats::Text(),
        ContentKind::Html => StandardDataFormats::Html(),
        ContentKind::Rtf => StandardDataFormats::Rtf(),
        ContentKind::Image => StandardDataFormats::Bitmap(),
    }
}

fn contains(view: &DataPackageView, kind: ContentKind) -> windows::core::Result<bool> {
    view.Contains(&format_id(kind)?)
}

fn read(view: &DataPackageView, kind: ContentKind) -> windows::core::Result<Payload> {
    Ok(match kind {
        ContentKind::Text => Payload::Text(view.GetTextAsync()?.get()?.to_string_lossy()),
        ContentKind::Html => Payload::Text(view.GetHtmlFormatAsync()?.get()?.to_string_lossy()),
        ContentKind::Rtf => {
            Payload::RawBytes(view.GetRtfAsync()?.get()?.to_string_lossy().into_bytes())
        }
        ContentKind::Image => Payload::EncodedImage(read_bitmap(view)?),
    })
}

fn read_bitmap(view: &DataPackageView) -> windows::core::Result<Vec<u8>> {
    let stream = view.GetBitmapAsync()?.get()?.OpenReadAsync()?.get()?;
    let size = u32::try_from(stream.Size()?)
        .map_err(|_| windows::core::Error::new(E_OUTOFMEMORY, "history bitmap too large"))?;
    let reader = DataReader::CreateDataReader(&stream)?;
    let loaded = reader.LoadAsync(size)?.get()?;
    let mut bytes = vec![0u8; loaded as usize];
    reader.ReadBytes(&mut bytes)?;
    Ok(bytes)
}
