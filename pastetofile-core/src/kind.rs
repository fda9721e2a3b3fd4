use serde::{Deserialize, Serialize};

/// The closed set of clipboard content categories the pipeline understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Html,
    Rtf,
    Image,
}

impl ContentKind {
    /// Order used by the auto policy: best representation first.
    pub const AUTO_PRIORITY: [ContentKind; 4] = [
        ContentKind::Image,
        ContentKind::Html,
        ContentKind::Rtf,
        ContentKind::Text,
    ];

    /// Order used when every present kind is saved.
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Text,
        ContentKind::Html,
        ContentKind::Rtf,
        ContentKind::Image,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ContentKind::Text => "txt",
            ContentKind::Html => "html",
            ContentKind::Rtf => "rtf",
            ContentKind::Image => "png",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ContentKind::Text => "text",
            ContentKind::Html => "html",
            ContentKind::Rtf => "rtf",
            ContentKind::Image => "image",
        };
        f.write_str(name)
    }
}

/// Which kinds the clipboard advertised at probe time. Never cached.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ClipboardSnapshot {
    pub text: bool,
    pub html: bool,
    pub rtf: bool,
    pub image: bool,
}

impl ClipboardSnapshot {
    pub fn has(&self, kind: ContentKind) -> bool {
        match kind {
            ContentKind::Text => self.text,
            ContentKind::Html => self.html,
            ContentKind::Rtf => self.rtf,
            ContentKind::Image => self.image,
        }
    }

    pub fn set(&mut self, kind: ContentKind, present: bool) {
        match kind {
            ContentKind::Text => self.text = present,
            ContentKind::Html => self.html = present,
            ContentKind::Rtf => self.rtf = present,
            ContentKind::Image => self.image = present,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.text || self.html || self.rtf || self.image)
    }

    /// Highest-ranked kind present under the auto policy.
    pub fn best(&self) -> Option<ContentKind> {
        ContentKind::AUTO_PRIORITY
            .into_iter()
            .find(|kind| self.has(*kind))
    }
}

/// Channel bit masks for bit-field encoded pixels. An `alpha` of zero means
/// the pixels carry no alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMasks {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
    pub alpha: u32,
}

impl ChannelMasks {
    pub const RGB555: ChannelMasks = ChannelMasks {
        red: 0x7C00,
        green: 0x03E0,
        blue: 0x001F,
        alpha: 0,
    };
}

/// Uncompressed bitmap rows exactly as laid out in a DIB: rows padded to
/// 4-byte boundaries, BGR(A) channel order, bottom-up unless `top_down`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u16,
    pub row_stride: usize,
    pub top_down: bool,
    /// BGRX palette entries for depths of 8 bits and below.
    pub palette: Vec<[u8; 4]>,
    pub masks: Option<ChannelMasks>,
    pub pixels: Vec<u8>,
}

impl PixelBuffer {
    /// DWORD-aligned row size for the given geometry.
    pub fn stride_for(width: u32, bits_per_pixel: u16) -> Option<usize> {
        let bits = u64::from(width).checked_mul(u64::from(bits_per_pixel))?;
        let stride = bits.checked_add(31)? / 32 * 4;
        usize::try_from(stride).ok()
    }

    /// Wraps straight RGBA pixels (top row first) as a 32-bit BGRA buffer.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Option<Self> {
        let row_stride = (width as usize).checked_mul(4)?;
        let expected = row_stride.checked_mul(height as usize)?;
        if rgba.len() != expected {
            return None;
        }

        let mut pixels = rgba.to_vec();
        for px in pixels.chunks_exact_mut(4) {
            px.swap(0, 2);
        }

        Some(Self {
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
}

/// A normalized clipboard payload, consumed exactly once by the persister.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    RawBytes(Vec<u8>),
    PixelBuffer(PixelBuffer),
    /// A compressed image stream (history bitmaps), re-encoded on save.
    EncodedImage(Vec<u8>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_prefers_image_then_html_then_rtf_then_text() {
        let mut snapshot = ClipboardSnapshot {
            text: true,
            html: true,
            rtf: true,
            image: true,
        };
        assert_eq!(snapshot.best(), Some(ContentKind::Image));
        snapshot.image = false;
        assert_eq!(snapshot.best(), Some(ContentKind::Html));
        snapshot.html = false;
        assert_eq!(snapshot.best(), Some(ContentKind::Rtf));
        snapshot.rtf = false;
        assert_eq!(snapshot.best(), Some(ContentKind::Text));
        snapshot.text = false;
        assert_eq!(snapshot.best(), None);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn stride_is_padded_to_dword() {
        assert_eq!(PixelBuffer::stride_for(100, 24), Some(300));
        assert_eq!(PixelBuffer::stride_for(1, 24), Some(4));
        assert_eq!(PixelBuffer::stride_for(3, 1), Some(4));
        assert_eq!(PixelBuffer::stride_for(33, 1), Some(8));
        assert_eq!(PixelBuffer::stride_for(5, 32), Some(20));
    }

    #[test]
    fn from_rgba_swaps_to_bgra_and_checks_length() {
        let buffer = PixelBuffer::from_rgba(1, 1, &[10, 20, 30, 40]).unwrap();
        assert_eq!(buffer.pixels, vec![30, 20, 10, 40]);
        assert!(buffer.top_down);
        assert!(PixelBuffer::from_rgba(2, 1, &[0; 4]).is_none());
    }
}
