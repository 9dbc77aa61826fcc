use crate::error::CompileError;
use crate::glyph::{CELL, Glyph};
use image::{DynamicImage, RgbImage};
use log::debug;

/// Character codes are one byte, so the grid can never describe more cells.
pub const MAX_CELLS: usize = 256;

/// Decodes the raw atlas image and pins the pixel format down to what the
/// grid contract allows: 8 bits per channel, RGB, no alpha. Anything else is
/// rejected before extraction begins.
pub fn decode_atlas(bytes: &[u8]) -> Result<RgbImage, CompileError> {
    match image::load_from_memory(bytes)? {
        DynamicImage::ImageRgb8(rgb) => Ok(rgb),
        other => Err(CompileError::MalformedAtlas(format!(
            "expected 8-bit RGB pixels, got {:?}",
            other.color()
        ))),
    }
}

/// Slices the decoded grid into 8x8 cells, row-major, one glyph per
/// sequential character code starting at 0. The blue channel is the
/// foreground test: non-zero means the pixel is set.
pub fn extract_glyphs(img: &RgbImage) -> Result<Vec<Glyph>, CompileError> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    if width % CELL != 0 || height % CELL != 0 {
        return Err(CompileError::MalformedAtlas(format!(
            "image is {width}x{height}, both dimensions must be multiples of {CELL}"
        )));
    }
    let (cols, rows) = (width / CELL, height / CELL);
    if cols * rows > MAX_CELLS {
        return Err(CompileError::MalformedAtlas(format!(
            "grid holds {} cells, at most {MAX_CELLS} are addressable",
            cols * rows
        )));
    }

    let mut glyphs = Vec::with_capacity(cols * rows);
    for cy in 0..rows {
        for cx in 0..cols {
            let mut cell = [0u8; CELL];
            for (y, row) in cell.iter_mut().enumerate() {
                for x in 0..CELL {
                    let px = img.get_pixel((cx * CELL + x) as u32, (cy * CELL + y) as u32);
                    if px[2] != 0 {
                        *row |= 1 << x;
                    }
                }
            }
            let glyph = Glyph::from_rows(glyphs.len() as u8, cell);
            if !glyph.is_empty() {
                debug!(
                    "glyph 0x{:02x} '{}': box {}",
                    glyph.code(),
                    glyph.printable(),
                    glyph.bounds()
                );
            }
            glyphs.push(glyph);
        }
    }
    Ok(glyphs)
}
