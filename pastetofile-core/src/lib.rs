use std::{io, path::PathBuf};

use thiserror::Error;

pub mod dib;
pub mod html;
pub mod kind;
pub mod naming;
pub mod persist;
pub mod png;
pub mod policy;

pub use dib::{DibHeader, decode_dib};
pub use html::{html_fragment, trim_trailing_nuls};
pub use kind::{ChannelMasks, ClipboardSnapshot, ContentKind, Payload, PixelBuffer};
pub use naming::{dated_base_name, history_base_name, resolve_unique_path};
pub use persist::{write_unique, write_unique_with};
pub use png::PngEncoder;
pub use policy::{
    Acquisition, Action, Cleared, ClipboardAccess, ClipboardHistory, Failure, HistoryEntry,
    ImageEncoder, OperationReport, SavedFile, extract, probe,
};

pub const BASE_NAME_PREFIX: &str = "PTF";
pub const MAX_COLLISION_SUFFIX: u32 = 999;
/// Upper bound for a decoded pixel buffer; larger declared bitmaps are rejected.
pub const MAX_PIXEL_BYTES: usize = 512 * 1024 * 1024;
pub const HTML_CLIPBOARD_FORMAT: &str = "HTML Format";
pub const RTF_CLIPBOARD_FORMAT: &str = "Rich Text Format";

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("DIB record is {len} bytes, smaller than a BITMAPINFOHEADER")]
    DibTooShort { len: usize },
    #[error("DIB header size {0} is below the 40-byte minimum")]
    DibHeaderTooSmall(u32),
    #[error("DIB dimensions {width}x{height} at {bits_per_pixel} bpp are invalid")]
    DibDimensions {
        width: i32,
        height: i32,
        bits_per_pixel: u16,
    },
    #[error("unsupported DIB bit depth {0}")]
    UnsupportedBitDepth(u16),
    #[error("unsupported DIB compression {0}")]
    UnsupportedCompression(u32),
    #[error("pixel buffer of {0} bytes exceeds the decode limit")]
    PixelBufferTooLarge(usize),
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    PixelBufferSize { expected: usize, actual: usize },
    #[error("failed to create {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("all candidate names for {base}.{extension} are taken")]
    NamesExhausted { base: String, extension: String },
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("clipboard history unavailable: {0}")]
    HistoryUnavailable(String),
    #[error("unknown action {0:?}")]
    UnknownAction(String),
}
