//! Percentage text to RGBA bitmap.
//!
//! Text is drawn white on a fully transparent canvas sized exactly to the
//! measured extent of the string. Outline fonts go through `ab_glyph`; when no
//! font file is available a small built-in pixel face is used instead.

use ab_glyph::{point, Font, FontVec, GlyphId, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use std::path::Path;
use tracing::{info, warn};

use crate::config::IconConfig;
use crate::error::FontError;

const FOREGROUND: [u8; 3] = [255, 255, 255];

/// Width and height in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextExtent {
    pub width: u32,
    pub height: u32,
}

enum Face {
    Outline { font: FontVec, scale: PxScale },
    Pixel { cell: u32 },
}

pub struct TextRenderer {
    face: Face,
}

/// Points at 96 DPI to pixels.
fn points_to_px(points: f32) -> f32 {
    points * 96.0 / 72.0
}

pub fn load_font(path: &Path) -> Result<FontVec, FontError> {
    let data = std::fs::read(path).map_err(|source| FontError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    FontVec::try_from_vec(data).map_err(|_| FontError::Parse(path.to_path_buf()))
}

impl TextRenderer {
    /// Build from config, falling back to the pixel face if the font cannot
    /// be loaded.
    pub fn from_config(config: &IconConfig) -> Self {
        let px = points_to_px(config.font_size);
        let Some(path) = config.font_path.as_deref() else {
            info!("no font configured, using pixel face");
            return Self::pixel(px);
        };
        match load_font(path) {
            Ok(font) => {
                info!(path = %path.display(), size_pt = config.font_size, "loaded icon font");
                Self::outline(font, px)
            }
            Err(e) => {
                warn!(error = %e, "falling back to pixel face");
                Self::pixel(px)
            }
        }
    }

    pub fn outline(font: FontVec, px: f32) -> Self {
        Self {
            face: Face::Outline {
                font,
                scale: PxScale::from(px),
            },
        }
    }

    /// Pixel face whose glyph height roughly matches `px`.
    pub fn pixel(px: f32) -> Self {
        let cell = ((px / PIXEL_GLYPH_ROWS as f32).round() as u32).max(1);
        Self {
            face: Face::Pixel { cell },
        }
    }

    /// Size the canvas for `text` must have. Never zero in either dimension.
    pub fn measure(&self, text: &str) -> TextExtent {
        let (width, height) = match &self.face {
            Face::Outline { font, scale } => {
                let scaled = font.as_scaled(*scale);
                let mut width = 0.0f32;
                let mut prev: Option<GlyphId> = None;
                for ch in text.chars() {
                    let id = font.glyph_id(ch);
                    if let Some(p) = prev {
                        width += scaled.kern(p, id);
                    }
                    width += scaled.h_advance(id);
                    prev = Some(id);
                }
                let height = scaled.ascent() - scaled.descent();
                (width.ceil() as u32, height.ceil() as u32)
            }
            Face::Pixel { cell } => {
                let n = text.chars().count() as u32;
                let advance = (PIXEL_GLYPH_COLS + 1) * cell;
                (
                    (n * advance).saturating_sub(*cell),
                    PIXEL_GLYPH_ROWS * cell,
                )
            }
        };
        TextExtent {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Draw `text` onto a fresh transparent canvas of exactly
    /// [`measure`](Self::measure) size.
    pub fn render(&self, text: &str) -> RgbaImage {
        let extent = self.measure(text);
        let mut canvas = RgbaImage::from_pixel(extent.width, extent.height, Rgba([0, 0, 0, 0]));
        match &self.face {
            Face::Outline { font, scale } => draw_outline(&mut canvas, font, *scale, text),
            Face::Pixel { cell } => draw_pixel(&mut canvas, *cell, text),
        }
        canvas
    }
}

/// Blend coverage into a pixel, keeping the strongest alpha where glyphs
/// overlap.
fn plot(canvas: &mut RgbaImage, x: i32, y: i32, coverage: f32) {
    if x < 0 || y < 0 || x as u32 >= canvas.width() || y as u32 >= canvas.height() {
        return;
    }
    let alpha = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
    let px = canvas.get_pixel_mut(x as u32, y as u32);
    if alpha > px[3] {
        *px = Rgba([FOREGROUND[0], FOREGROUND[1], FOREGROUND[2], alpha]);
    }
}

fn draw_outline(canvas: &mut RgbaImage, font: &FontVec, scale: PxScale, text: &str) {
    let scaled = font.as_scaled(scale);
    let baseline = scaled.ascent();
    let mut caret = 0.0f32;
    let mut prev: Option<GlyphId> = None;

    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(p) = prev {
            caret += scaled.kern(p, id);
        }
        let glyph = id.with_scale_and_position(scale, point(caret, baseline));
        caret += scaled.h_advance(id);
        prev = Some(id);

        // Whitespace and missing glyphs have no outline.
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            plot(
                canvas,
                bounds.min.x as i32 + gx as i32,
                bounds.min.y as i32 + gy as i32,
                coverage,
            );
        });
    }
}

const PIXEL_GLYPH_COLS: u32 = 3;
const PIXEL_GLYPH_ROWS: u32 = 5;

/// 3x5 bitmaps, one row per byte, high bit of the low three is the left column.
fn pixel_glyph(ch: char) -> Option<[u8; 5]> {
    Some(match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '?' => [0b111, 0b001, 0b011, 0b000, 0b010],
        _ => return None,
    })
}

fn draw_pixel(canvas: &mut RgbaImage, cell: u32, text: &str) {
    let advance = (PIXEL_GLYPH_COLS + 1) * cell;
    for (i, ch) in text.chars().enumerate() {
        let Some(rows) = pixel_glyph(ch) else {
            continue;
        };
        let origin_x = i as u32 * advance;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..PIXEL_GLYPH_COLS {
                if bits & (1 << (PIXEL_GLYPH_COLS - 1 - col)) == 0 {
                    continue;
                }
                let x0 = origin_x + col * cell;
                let y0 = row as u32 * cell;
                for y in y0..y0 + cell {
                    for x in x0..x0 + cell {
                        plot(canvas, x as i32, y as i32, 1.0);
                    }
                }
            }
        }
    }
}
