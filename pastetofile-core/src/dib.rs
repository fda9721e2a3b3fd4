use bytes::Buf;

use crate::{
    CoreError, MAX_PIXEL_BYTES,
    kind::{ChannelMasks, PixelBuffer},
};

/// Size of BITMAPINFOHEADER, the smallest header a clipboard DIB may carry.
pub const MIN_HEADER_SIZE: u32 = 40;
pub const BI_RGB: u32 = 0;
pub const BI_BITFIELDS: u32 = 3;

const RGBQUAD_SIZE: usize = 4;
const BITFIELD_MASKS_SIZE: usize = 3 * 4;
/// V2+ headers embed the RGB masks right after the BITMAPINFOHEADER fields,
/// V3+ headers add the alpha mask.
const EMBEDDED_RGB_MASKS_END: u32 = 52;
const EMBEDDED_ALPHA_MASK_END: u32 = 56;

/// Structural view of the leading BITMAPINFOHEADER fields of a DIB record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DibHeader {
    pub header_size: u32,
    pub width: i32,
    /// Negative heights describe top-down bitmaps.
    pub height: i32,
    pub bits_per_pixel: u16,
    pub compression: u32,
    pub colors_used: u32,
}

impl DibHeader {
    pub fn parse(record: &[u8]) -> Result<Self, CoreError> {
        if record.len() < MIN_HEADER_SIZE as usize {
            return Err(CoreError::DibTooShort { len: record.len() });
        }

        let mut cursor = record;
        let header_size = cursor.get_u32_le();
        if header_size < MIN_HEADER_SIZE {
            return Err(CoreError::DibHeaderTooSmall(header_size));
        }
        let width = cursor.get_i32_le();
        let height = cursor.get_i32_le();
        let _planes = cursor.get_u16_le();
        let bits_per_pixel = cursor.get_u16_le();
        let compression = cursor.get_u32_le();
        let _size_image = cursor.get_u32_le();
        let _x_pels_per_meter = cursor.get_i32_le();
        let _y_pels_per_meter = cursor.get_i32_le();
        let colors_used = cursor.get_u32_le();

        Ok(Self {
            header_size,
            width,
            height,
            bits_per_pixel,
            compression,
            colors_used,
        })
    }

    pub fn palette_len(&self) -> usize {
        if self.bits_per_pixel <= 8 {
            let colors = if self.colors_used != 0 {
                self.colors_used as usize
            } else {
                1_usize << self.bits_per_pixel
            };
            colors.saturating_mul(RGBQUAD_SIZE)
        } else if self.compression == BI_BITFIELDS {
            BITFIELD_MASKS_SIZE
        } else {
            0
        }
    }

    pub fn pixel_data_offset(&self) -> usize {
        (self.header_size as usize).saturating_add(self.palette_len())
    }

    pub fn is_top_down(&self) -> bool {
        self.height < 0
    }
}

/// Decodes a packed DIB record (header, colour table, bits) into an owned
/// pixel buffer.
///
/// Only the bytes actually present in `record` are copied: a header that
/// declares more pixel data than the record holds yields a zero-filled tail
/// rather than an out-of-bounds read.
pub fn decode_dib(record: &[u8]) -> Result<PixelBuffer, CoreError> {
    let header = DibHeader::parse(record)?;

    if !matches!(header.bits_per_pixel, 1 | 4 | 8 | 16 | 24 | 32) {
        return Err(CoreError::UnsupportedBitDepth(header.bits_per_pixel));
    }
    if header.compression != BI_RGB && header.compression != BI_BITFIELDS {
        return Err(CoreError::UnsupportedCompression(header.compression));
    }

    let invalid = || CoreError::DibDimensions {
        width: header.width,
        height: header.height,
        bits_per_pixel: header.bits_per_pixel,
    };
    if header.width <= 0 || header.height == 0 {
        return Err(invalid());
    }
    let width = header.width.unsigned_abs();
    let height = header.height.unsigned_abs();

    let row_stride = PixelBuffer::stride_for(width, header.bits_per_pixel).ok_or_else(invalid)?;
    let expected = row_stride
        .checked_mul(height as usize)
        .ok_or_else(invalid)?;
    if expected > MAX_PIXEL_BYTES {
        return Err(CoreError::PixelBufferTooLarge(expected));
    }

    let offset = header.pixel_data_offset();
    let available = record.len().saturating_sub(offset);
    let to_copy = expected.min(available);

    let mut pixels = vec![0_u8; expected];
    if to_copy > 0 {
        pixels[..to_copy].copy_from_slice(&record[offset..offset + to_copy]);
    }
    if to_copy < expected {
        tracing::debug!(expected, copied = to_copy, "DIB pixel data shorter than declared");
    }

    Ok(PixelBuffer {
        width,
        height,
        bits_per_pixel: header.bits_per_pixel,
        row_stride,
        top_down: header.is_top_down(),
        palette: read_palette(&header, record),
        masks: read_masks(&header, record),
        pixels,
    })
}

fn read_palette(header: &DibHeader, record: &[u8]) -> Vec<[u8; 4]> {
    if header.bits_per_pixel > 8 {
        return Vec::new();
    }
    let start = (header.header_size as usize).min(record.len());
    let end = header.pixel_data_offset().min(record.len());
    record[start..end]
        .chunks_exact(RGBQUAD_SIZE)
        .map(|quad| [quad[0], quad[1], quad[2], quad[3]])
        .collect()
}

fn read_masks(header: &DibHeader, record: &[u8]) -> Option<ChannelMasks> {
    if header.compression != BI_BITFIELDS {
        return (header.bits_per_pixel == 16).then_some(ChannelMasks::RGB555);
    }
    let start = if header.header_size >= EMBEDDED_RGB_MASKS_END {
        MIN_HEADER_SIZE as usize
    } else {
        header.header_size as usize
    };
    let mut masks = record.get(start..start.checked_add(BITFIELD_MASKS_SIZE)?)?;
    let red = masks.get_u32_le();
    let green = masks.get_u32_le();
    let blue = masks.get_u32_le();
    let alpha = if header.header_size >= EMBEDDED_ALPHA_MASK_END {
        let end = EMBEDDED_ALPHA_MASK_END as usize;
        record
            .get(end - 4..end)
            .map(|mut bytes| bytes.get_u32_le())
            .unwrap_or(0)
    } else {
        0
    };
    Some(ChannelMasks {
        red,
        green,
        blue,
        alpha,
    })
}
