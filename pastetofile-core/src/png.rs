use std::io::Write;

use image::{ExtendedColorType, ImageEncoder as _, codecs::png};

use crate::{
    CoreError,
    kind::{ChannelMasks, PixelBuffer},
    policy::ImageEncoder,
};

/// PNG implementation of the image-encode capability, backed by `image`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn encode_png(&self, image: &PixelBuffer, out: &mut dyn Write) -> Result<(), CoreError> {
        let rgba = to_rgba(image)?;
        png::PngEncoder::new(out).write_image(
            &rgba,
            image.width,
            image.height,
            ExtendedColorType::Rgba8,
        )?;
        Ok(())
    }

    fn transcode_png(&self, encoded: &[u8], out: &mut dyn Write) -> Result<(), CoreError> {
        let rgba = image::load_from_memory(encoded)?.to_rgba8();
        png::PngEncoder::new(out).write_image(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ExtendedColorType::Rgba8,
        )?;
        Ok(())
    }
}

/// Expands DIB-layout rows into straight RGBA, top row first.
pub fn to_rgba(buffer: &PixelBuffer) -> Result<Vec<u8>, CoreError> {
    let width = buffer.width as usize;
    let height = buffer.height as usize;
    let stride = buffer.row_stride;
    let min_stride = PixelBuffer::stride_for(buffer.width, buffer.bits_per_pixel)
        .ok_or(CoreError::UnsupportedBitDepth(buffer.bits_per_pixel))?;
    let expected = stride
        .checked_mul(height)
        .ok_or(CoreError::PixelBufferTooLarge(usize::MAX))?;
    if stride < min_stride || buffer.pixels.len() < expected {
        return Err(CoreError::PixelBufferSize {
            expected: expected.max(min_stride * height),
            actual: buffer.pixels.len(),
        });
    }

    // CF_DIB producers usually leave the alpha bits zeroed.
    let alpha_mask = match (buffer.bits_per_pixel, buffer.masks) {
        (16 | 32, Some(masks)) => masks.alpha,
        (32, None) => 0xFF00_0000,
        _ => 0,
    };
    let ignore_alpha = alpha_mask == 0
        || (buffer.bits_per_pixel == 32
            && buffer.pixels[..expected]
                .chunks_exact(4)
                .all(|px| u32::from_le_bytes([px[0], px[1], px[2], px[3]]) & alpha_mask == 0));

    let mut rgba = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let src_row = if buffer.top_down { y } else { height - 1 - y };
        let row = &buffer.pixels[src_row * stride..(src_row + 1) * stride];
        for x in 0..width {
            let px = match buffer.bits_per_pixel {
                1 | 4 | 8 => indexed(row, x, buffer.bits_per_pixel, &buffer.palette),
                16 => {
                    let value = u16::from_le_bytes([row[x * 2], row[x * 2 + 1]]);
                    masked(
                        u32::from(value),
                        buffer.masks.unwrap_or(ChannelMasks::RGB555),
                        ignore_alpha,
                    )
                }
                24 => [row[x * 3 + 2], row[x * 3 + 1], row[x * 3], 0xFF],
                32 => {
                    let p = &row[x * 4..x * 4 + 4];
                    match buffer.masks {
                        Some(masks) => {
                            let value = u32::from_le_bytes([p[0], p[1], p[2], p[3]]);
                            masked(value, masks, ignore_alpha)
                        }
                        None => [p[2], p[1], p[0], if ignore_alpha { 0xFF } else { p[3] }],
                    }
                }
                other => return Err(CoreError::UnsupportedBitDepth(other)),
            };
            rgba.extend_from_slice(&px);
        }
    }
    Ok(rgba)
}

fn indexed(row: &[u8], x: usize, bits: u16, palette: &[[u8; 4]]) -> [u8; 4] {
    let bits = usize::from(bits);
    let per_byte = 8 / bits;
    let byte = row[x / per_byte];
    let shift = 8 - bits - (x % per_byte) * bits;
    let index = usize::from(byte >> shift) & ((1 << bits) - 1);
    match palette.get(index) {
        Some(quad) => [quad[2], quad[1], quad[0], 0xFF],
        None => [0, 0, 0, 0xFF],
    }
}

fn masked(value: u32, masks: ChannelMasks, ignore_alpha: bool) -> [u8; 4] {
    [
        scale_channel(value, masks.red),
        scale_channel(value, masks.green),
        scale_channel(value, masks.blue),
        if ignore_alpha {
            0xFF
        } else {
            scale_channel(value, masks.alpha)
        },
    ]
}

fn scale_channel(value: u32, mask: u32) -> u8 {
    if mask == 0 {
        return 0;
    }
    let shift = mask.trailing_zeros();
    let max = u64::from(mask >> shift);
    let raw = u64::from((value & mask) >> shift);
    ((raw * 255 + max / 2) / max) as u8
}
