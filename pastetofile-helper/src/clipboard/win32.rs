use std::{ffi::c_void, mem, ptr, slice, sync::OnceLock, thread, time::Duration};

use pastetofile_core::{
    ClipboardAccess, ContentKind, HTML_CLIPBOARD_FORMAT, MAX_PIXEL_BYTES, PixelBuffer,
    RTF_CLIPBOARD_FORMAT, decode_dib,
};
use tracing::{debug, warn};
use windows_sys::Win32::{
    Foundation::HANDLE,
    Globalization::MultiByteToWideChar,
    Graphics::Gdi::{
        BITMAP, BITMAPINFO, BITMAPINFOHEADER, DIB_RGB_COLORS, GetDC, GetDIBits, GetObjectW,
        ReleaseDC,
    },
    System::{
        DataExchange::{
            CloseClipboard, EmptyClipboard, GetClipboardData, IsClipboardFormatAvailable,
            OpenClipboard, RegisterClipboardFormatW,
        },
        Memory::{GlobalLock, GlobalSize, GlobalUnlock},
        Ole::{CF_BITMAP, CF_DIB, CF_DIBV5, CF_TEXT, CF_UNICODETEXT},
    },
};

const OPEN_ATTEMPTS: u32 = 10;
const OPEN_RETRY_DELAY: Duration = Duration::from_millis(20);
const CP_ACP: u32 = 0;
const BI_RGB: u32 = 0;

/// Native Win32 clipboard. Each call opens and closes the clipboard itself.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

impl ClipboardAccess for SystemClipboard {
    fn is_available(&self, kind: ContentKind) -> bool {
        match kind {
            ContentKind::Text => {
                format_available(u32::from(CF_UNICODETEXT)) || format_available(u32::from(CF_TEXT))
            }
            ContentKind::Image => [CF_BITMAP, CF_DIBV5, CF_DIB]
                .into_iter()
                .any(|format| format_available(u32::from(format))),
            ContentKind::Html | ContentKind::Rtf => {
                registered_format(kind).is_some_and(format_available)
            }
        }
    }

    fn read_raw(&self, kind: ContentKind) -> Option<Vec<u8>> {
        let format = registered_format(kind)?;
        let _clipboard = OpenClipboardGuard::open()?;
        let locked = LockedGlobal::for_format(format)?;
        Some(locked.bytes().to_vec())
    }

    fn read_text(&self) -> Option<String> {
        let _clipboard = OpenClipboardGuard::open()?;
        if let Some(locked) = LockedGlobal::for_format(u32::from(CF_UNICODETEXT)) {
            let units: Vec<u16> = locked
                .bytes()
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .take_while(|&unit| unit != 0)
                .collect();
            return Some(String::from_utf16_lossy(&units));
        }

        let locked = LockedGlobal::for_format(u32::from(CF_TEXT))?;
        let bytes = locked.bytes();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        ansi_to_string(&bytes[..end])
    }

    fn read_image(&self) -> Option<PixelBuffer> {
        let _clipboard = OpenClipboardGuard::open()?;

        if format_available(u32::from(CF_BITMAP)) {
            // SAFETY: the clipboard is open and owns the returned bitmap handle.
            let handle = unsafe { GetClipboardData(u32::from(CF_BITMAP)) };
            if let Some(image) = bitmap_pixels(handle) {
                return Some(image);
            }
            debug!("CF_BITMAP unreadable, trying DIB formats");
        }

        for format in [CF_DIBV5, CF_DIB] {
            let Some(locked) = LockedGlobal::for_format(u32::from(format)) else {
                continue;
            };
            match decode_dib(locked.bytes()) {
                Ok(image) => return Some(image),
                Err(err) => warn!(format, "failed to decode clipboard DIB: {err}"),
            }
        }
        None
    }

    fn clear(&self) -> bool {
        let Some(_clipboard) = OpenClipboardGuard::open() else {
            return false;
        };
        // SAFETY: called while this thread holds the clipboard open.
        unsafe { EmptyClipboard() != 0 }
    }
}

struct OpenClipboardGuard;

impl OpenClipboardGuard {
    fn open() -> Option<Self> {
        for attempt in 1..=OPEN_ATTEMPTS {
            // SAFETY: a null owner window is allowed; the guard closes it.
            if unsafe { OpenClipboard(0) } != 0 {
                return Some(Self);
            }
            debug!(attempt, "clipboard busy, retrying");
            thread::sleep(OPEN_RETRY_DELAY);
        }
        warn!("clipboard stayed locked by another process");
        None
    }
}

impl Drop for OpenClipboardGuard {
    fn drop(&mut self) {
        // SAFETY: only constructed after a successful OpenClipboard.
        unsafe {
            CloseClipboard();
        }
    }
}

/// A clipboard-owned global memory block, locked for reading.
struct LockedGlobal {
    handle: HANDLE,
    ptr: *const u8,
    len: usize,
}

impl LockedGlobal {
    /// Must be called while the clipboard is open.
    fn for_format(format: u32) -> Option<Self> {
        // SAFETY: the caller holds an OpenClipboardGuard.
        let handle = unsafe { GetClipboardData(format) };
        if handle == 0 {
            return None;
        }
        // SAFETY: clipboard data handles for memory formats are HGLOBALs.
        let ptr = unsafe { GlobalLock(handle) } as *const u8;
        if ptr.is_null() {
            return None;
        }
        // SAFETY: handle is locked and valid.
        let len = unsafe { GlobalSize(handle) };
        Some(Self { handle, ptr, len })
    }

    fn bytes(&self) -> &[u8] {
        // SAFETY: GlobalSize bytes stay readable until GlobalUnlock in drop.
        unsafe { slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl Drop for LockedGlobal {
    fn drop(&mut self) {
        // SAFETY: paired with the GlobalLock in for_format.
        unsafe {
            GlobalUnlock(self.handle);
        }
    }
}

fn format_available(format: u32) -> bool {
    // SAFETY: no clipboard ownership needed for this query.
    unsafe { IsClipboardFormatAvailable(format) != 0 }
}

fn registered_format(kind: ContentKind) -> Option<u32> {
    static HTML: OnceLock<u32> = OnceLock::new();
    static RTF: OnceLock<u32> = OnceLock::new();

    let (cell, name) = match kind {
        ContentKind::Html => (&HTML, HTML_CLIPBOARD_FORMAT),
        ContentKind::Rtf => (&RTF, RTF_CLIPBOARD_FORMAT),
        ContentKind::Text | ContentKind::Image => return None,
    };
    let id = *cell.get_or_init(|| {
        let wide: Vec<u16> = name.encode_utf16().chain(Some(0)).collect();
        // SAFETY: `wide` is NUL-terminated and outlives the call.
        unsafe { RegisterClipboardFormatW(wide.as_ptr()) }
    });
    (id != 0).then_some(id)
}

fn ansi_to_string(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return Some(String::new());
    }
    let len = i32::try_from(bytes.len()).ok()?;
    // SAFETY: sizing call, no output buffer.
    let needed = unsafe { MultiByteToWideChar(CP_ACP, 0, bytes.as_ptr(), len, ptr::null_mut(), 0) };
    if needed <= 0 {
        return None;
    }
    let mut wide = vec![0u16; needed as usize];
    // SAFETY: `wide` holds exactly `needed` units.
    let written = unsafe {
        MultiByteToWideChar(CP_ACP, 0, bytes.as_ptr(), len, wide.as_mut_ptr(), needed)
    };
    if written <= 0 {
        return None;
    }
    wide.truncate(written as usize);
    Some(String::from_utf16_lossy(&wide))
}

/// Copies a device-dependent bitmap out as 32-bit top-down rows.
fn bitmap_pixels(bitmap: HANDLE) -> Option<PixelBuffer> {
    if bitmap == 0 {
        return None;
    }

    // SAFETY: BITMAP is plain data; GetObjectW fills it.
    let mut info: BITMAP = unsafe { mem::zeroed() };
    let got = unsafe {
        GetObjectW(
            bitmap,
            mem::size_of::<BITMAP>() as i32,
            (&mut info as *mut BITMAP).cast::<c_void>(),
        )
    };
    if got == 0 || info.bmWidth <= 0 || info.bmHeight == 0 {
        return None;
    }

    let width = info.bmWidth.unsigned_abs();
    let height = info.bmHeight.unsigned_abs();
    let row_stride = (width as usize).checked_mul(4)?;
    let len = row_stride.checked_mul(height as usize)?;
    if len > MAX_PIXEL_BYTES {
        warn!(width, height, "clipboard bitmap too large");
        return None;
    }

    // SAFETY: BITMAPINFO is plain data.
    let mut header: BITMAPINFO = unsafe { mem::zeroed() };
    header.bmiHeader.biSize = mem::size_of::<BITMAPINFOHEADER>() as u32;
    header.bmiHeader.biWidth = info.bmWidth;
    header.bmiHeader.biHeight = -i32::try_from(height).ok()?;
    header.bmiHeader.biPlanes = 1;
    header.bmiHeader.biBitCount = 32;
    header.bmiHeader.biCompression = BI_RGB;

    let mut pixels = vec![0u8; len];
    // SAFETY: screen DC released below.
    let screen = unsafe { GetDC(0) };
    if screen == 0 {
        return None;
    }
    // SAFETY: `pixels` holds height rows of width 32-bit pixels as requested.
    let lines = unsafe {
        GetDIBits(
            screen,
            bitmap,
            0,
            height,
            pixels.as_mut_ptr().cast::<c_void>(),
            &mut header,
            DIB_RGB_COLORS,
        )
    };
    // SAFETY: paired with GetDC above.
    unsafe {
        ReleaseDC(0, screen);
    }
    if lines <= 0 || lines.unsigned_abs() != height {
        warn!(lines, height, "GetDIBits returned a partial bitmap");
        return None;
    }

    Some(PixelBuffer {
        width,
        height,
        bits_per_pixel: 32,
        row_stride,
        top_down: true,
        palette: Vec::new(),
        masks: None,
        pixels,
    })
}
