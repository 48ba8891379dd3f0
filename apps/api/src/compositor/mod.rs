//! Page Compositor — renders page text + illustration into a final PNG.
//!
//! Composition is a pure function of (text, illustration bytes, watermark
//! flag): identical inputs produce byte-identical output, so rendered pages
//! can be cached and re-rendered at purchase time without re-calling the
//! narrative or illustration generators.
//!
//! Text is rasterized from an embedded 8×8 ASCII glyph set (`font8x8`)
//! scaled up to the page glyph size. No filesystem font dependency, no
//! non-determinism. CPU-bound; callers on the async runtime must wrap calls
//! in `tokio::task::spawn_blocking`.

pub mod wrap;

use std::io::Cursor;

use font8x8::legacy::BASIC_LEGACY;
use image::{imageops::FilterType, ImageFormat, Rgba, RgbaImage};
use thiserror::Error;

use self::wrap::wrap_text;

/// Canvas geometry, matching the book's landscape page format.
pub const CANVAS_WIDTH: u32 = 1200;
pub const CANVAS_HEIGHT: u32 = 800;
pub const MARGIN: u32 = 50;

/// Body glyphs render at 8 × `GLYPH_SCALE` = 32px tall.
const GLYPH_SCALE: u32 = 4;
const LINE_SPACING: u32 = 10;
const WRAP_COLUMNS: usize = 40;

/// Watermark glyphs render at 8 × 9 = 72px tall.
const WATERMARK_TEXT: &str = "PREVIEW";
const WATERMARK_SCALE: u32 = 9;
const WATERMARK_COLOR: Rgba<u8> = Rgba([200, 200, 200, 128]);

const TEXT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const PANEL_COLOR: Rgba<u8> = Rgba([255, 255, 255, 210]);
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Placeholder illustrations are a flat slate tint at the generator's size.
const PLACEHOLDER_SIZE: u32 = 1024;
const PLACEHOLDER_COLOR: Rgba<u8> = Rgba([226, 232, 240, 255]);

#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("failed to decode illustration: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to encode page image: {0}")]
    Encode(image::ImageError),
}

/// Renders page artifacts on a fixed-size canvas.
#[derive(Debug, Clone)]
pub struct PageComposer {
    width: u32,
    height: u32,
    margin: u32,
}

impl Default for PageComposer {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            margin: MARGIN,
        }
    }
}

impl PageComposer {
    /// Composes one page: illustration as background, wrapped text on a
    /// translucent panel, and (when `watermark` is set) a semi-transparent
    /// PREVIEW label centered on the canvas.
    pub fn compose(
        &self,
        text: &str,
        illustration: Option<&[u8]>,
        watermark: bool,
    ) -> Result<Vec<u8>, CompositionError> {
        let mut canvas = RgbaImage::from_pixel(self.width, self.height, BACKGROUND);

        if let Some(bytes) = illustration {
            let background = image::load_from_memory(bytes)?
                .resize_exact(self.width, self.height, FilterType::Triangle)
                .to_rgba8();
            image::imageops::overlay(&mut canvas, &background, 0, 0);
        }

        let lines = wrap_text(text, WRAP_COLUMNS);
        let line_height = 8 * GLYPH_SCALE + LINE_SPACING;

        // Text panel keeps the narrative readable over busy illustrations.
        if illustration.is_some() && !lines.is_empty() {
            let panel_height = lines.len() as u32 * line_height + LINE_SPACING;
            fill_rect(
                &mut canvas,
                self.margin.saturating_sub(LINE_SPACING),
                self.margin.saturating_sub(LINE_SPACING),
                self.width - 2 * self.margin + 2 * LINE_SPACING,
                panel_height,
                PANEL_COLOR,
            );
        }

        for (i, line) in lines.iter().enumerate() {
            draw_text(
                &mut canvas,
                line,
                self.margin,
                self.margin + i as u32 * line_height,
                GLYPH_SCALE,
                TEXT_COLOR,
            );
        }

        if watermark {
            let wm_width = WATERMARK_TEXT.len() as u32 * 8 * WATERMARK_SCALE;
            let wm_height = 8 * WATERMARK_SCALE;
            draw_text(
                &mut canvas,
                WATERMARK_TEXT,
                (self.width - wm_width) / 2,
                (self.height - wm_height) / 2,
                WATERMARK_SCALE,
                WATERMARK_COLOR,
            );
        }

        encode_png(&canvas)
    }
}

/// Deterministic substitute illustration used under the `placeholder`
/// page-failure policy.
pub fn placeholder_png() -> Vec<u8> {
    let canvas = RgbaImage::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, PLACEHOLDER_COLOR);
    // A flat canvas always encodes.
    encode_png(&canvas).unwrap_or_default()
}

fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>, CompositionError> {
    let mut out = Cursor::new(Vec::new());
    canvas
        .write_to(&mut out, ImageFormat::Png)
        .map_err(CompositionError::Encode)?;
    Ok(out.into_inner())
}

/// Source-over blend of `src` onto `dst`, leaving `dst` opaque.
fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let alpha = src.0[3] as u32;
    let inverse = 255 - alpha;
    for channel in 0..3 {
        dst.0[channel] =
            ((src.0[channel] as u32 * alpha + dst.0[channel] as u32 * inverse) / 255) as u8;
    }
    dst.0[3] = 255;
}

fn fill_rect(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    let x_end = (x + w).min(canvas.width());
    let y_end = (y + h).min(canvas.height());
    for py in y..y_end {
        for px in x..x_end {
            blend(canvas.get_pixel_mut(px, py), color);
        }
    }
}

/// Rasterizes `text` as scaled 8×8 glyph blocks starting at (origin_x, origin_y).
/// Non-ASCII characters render as '?'.
fn draw_text(
    canvas: &mut RgbaImage,
    text: &str,
    origin_x: u32,
    origin_y: u32,
    scale: u32,
    color: Rgba<u8>,
) {
    let mut pen_x = origin_x;
    for ch in text.chars() {
        let glyph = glyph_rows(ch);
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..8u32 {
                if bits & (1 << col) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let px = pen_x + col * scale + dx;
                        let py = origin_y + row as u32 * scale + dy;
                        if px < canvas.width() && py < canvas.height() {
                            blend(canvas.get_pixel_mut(px, py), color);
                        }
                    }
                }
            }
        }
        pen_x += 8 * scale;
    }
}

fn glyph_rows(ch: char) -> [u8; 8] {
    let code = ch as usize;
    if code < 128 {
        BASIC_LEGACY[code]
    } else {
        BASIC_LEGACY[b'?' as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_is_pure() {
        let composer = PageComposer::default();
        let illustration = placeholder_png();

        let a = composer
            .compose("Once upon a time.", Some(&illustration), true)
            .unwrap();
        let b = composer
            .compose("Once upon a time.", Some(&illustration), true)
            .unwrap();

        assert_eq!(a, b, "identical inputs must produce byte-identical output");
    }

    #[test]
    fn test_watermark_changes_output() {
        let composer = PageComposer::default();
        let preview = composer.compose("Some page text.", None, true).unwrap();
        let unlocked = composer.compose("Some page text.", None, false).unwrap();
        assert_ne!(preview, unlocked);
    }

    #[test]
    fn test_output_has_canvas_dimensions() {
        let composer = PageComposer::default();
        let png = composer.compose("Hello.", None, false).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), CANVAS_WIDTH);
        assert_eq!(decoded.height(), CANVAS_HEIGHT);
    }

    #[test]
    fn test_placeholder_is_deterministic_and_decodable() {
        let a = placeholder_png();
        let b = placeholder_png();
        assert_eq!(a, b);

        let decoded = image::load_from_memory(&a).unwrap();
        assert_eq!(decoded.width(), PLACEHOLDER_SIZE);
        assert_eq!(decoded.height(), PLACEHOLDER_SIZE);
    }

    #[test]
    fn test_compose_accepts_long_text() {
        let composer = PageComposer::default();
        let text = "words ".repeat(200);
        // Lines past the bottom of the canvas are clipped, not an error.
        assert!(composer.compose(&text, None, true).is_ok());
    }

    #[test]
    fn test_compose_rejects_invalid_illustration_bytes() {
        let composer = PageComposer::default();
        let result = composer.compose("text", Some(b"not an image"), false);
        assert!(matches!(result, Err(CompositionError::Decode(_))));
    }
}
