//! Built-in 5x7 bitmap font for the status overlay.

use image::{Rgba, RgbaImage};

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;

/// Largest supported scale; larger requests are clamped to it.
pub const MAX_SCALE: u32 = 16;

/// Drawn for characters outside the table.
const REPLACEMENT: [u8; 7] = [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111];

/// Fixed-pitch bitmap font scaled by an integer factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapFont {
    scale: u32,
}

impl BitmapFont {
    /// Creates a font with its scale clamped to `1..=MAX_SCALE`.
    #[must_use]
    pub fn new(scale: u32) -> Self {
        Self {
            scale: scale.clamp(1, MAX_SCALE),
        }
    }

    /// The effective scale.
    #[must_use]
    pub const fn scale(&self) -> u32 {
        self.scale
    }

    /// Pixel size of `text` when rendered.
    #[must_use]
    pub fn measure(&self, text: &str) -> (u32, u32) {
        let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        let width = chars
            .saturating_mul(GLYPH_ADVANCE)
            .saturating_sub(1)
            .saturating_mul(self.scale);
        let height = if chars == 0 {
            0
        } else {
            GLYPH_HEIGHT.saturating_mul(self.scale)
        };
        (width, height)
    }

    /// Renders `text` as opaque `color` on a fully transparent layer.
    ///
    /// Returns `None` for empty text.
    #[must_use]
    pub fn render(&self, text: &str, color: Rgba<u8>) -> Option<RgbaImage> {
        let (width, height) = self.measure(text);
        if width == 0 || height == 0 {
            return None;
        }

        let mut layer = RgbaImage::new(width, height);
        self.draw(text, color, (0, 0), &mut layer);
        Some(layer)
    }

    /// Renders the part of `text` that lands inside a `frame`-sized image
    /// when the text's top-left corner sits at `(x, y)`.
    ///
    /// Returns the visible layer and its top-left position in the frame, or
    /// `None` when nothing is visible.
    #[must_use]
    pub fn render_clipped(
        &self,
        text: &str,
        color: Rgba<u8>,
        x: i64,
        y: i64,
        frame: (u32, u32),
    ) -> Option<(RgbaImage, i64, i64)> {
        let (width, height) = self.measure(text);
        let left = x.max(0);
        let top = y.max(0);
        let right = x.saturating_add(i64::from(width)).min(i64::from(frame.0));
        let bottom = y.saturating_add(i64::from(height)).min(i64::from(frame.1));
        if right <= left || bottom <= top {
            return None;
        }

        let visible_w = u32::try_from(right - left).ok()?;
        let visible_h = u32::try_from(bottom - top).ok()?;
        let skip_x = u32::try_from(left - x).ok()?;
        let skip_y = u32::try_from(top - y).ok()?;

        let mut layer = RgbaImage::new(visible_w, visible_h);
        self.draw(text, color, (skip_x, skip_y), &mut layer);
        Some((layer, left, top))
    }

    /// Draws glyph pixels, offset by `skip` in text coordinates, into `layer`.
    fn draw(&self, text: &str, color: Rgba<u8>, skip: (u32, u32), layer: &mut RgbaImage) {
        let (layer_w, layer_h) = layer.dimensions();
        let advance = GLYPH_ADVANCE * self.scale;
        for (index, c) in (0u32..).zip(text.chars()) {
            let origin_x = index.saturating_mul(advance);
            if origin_x >= skip.0.saturating_add(layer_w) {
                break;
            }
            if origin_x.saturating_add(advance) <= skip.0 {
                continue;
            }
            for (row, bits) in (0u32..).zip(glyph(c)) {
                for col in 0..GLYPH_WIDTH {
                    if (bits >> (GLYPH_WIDTH - 1 - col)) & 1 == 0 {
                        continue;
                    }
                    for dy in 0..self.scale {
                        for dx in 0..self.scale {
                            let tx = origin_x.saturating_add(col * self.scale + dx);
                            let ty = row * self.scale + dy;
                            let (Some(lx), Some(ly)) =
                                (tx.checked_sub(skip.0), ty.checked_sub(skip.1))
                            else {
                                continue;
                            };
                            if lx < layer_w && ly < layer_h {
                                layer.put_pixel(lx, ly, color);
                            }
                        }
                    }
                }
            }
        }
    }
}

impl Default for BitmapFont {
    fn default() -> Self {
        Self::new(3)
    }
}

#[rustfmt::skip]
const fn glyph(c: char) -> [u8; 7] {
    match c {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        'a' => [0b00000, 0b00000, 0b01110, 0b00001, 0b01111, 0b10001, 0b01111],
        'b' => [0b10000, 0b10000, 0b10110, 0b11001, 0b10001, 0b10001, 0b11110],
        'c' => [0b00000, 0b00000, 0b01110, 0b10000, 0b10000, 0b10001, 0b01110],
        'd' => [0b00001, 0b00001, 0b01101, 0b10011, 0b10001, 0b10001, 0b01111],
        'e' => [0b00000, 0b00000, 0b01110, 0b10001, 0b11111, 0b10000, 0b01110],
        'f' => [0b00110, 0b01001, 0b01000, 0b11100, 0b01000, 0b01000, 0b01000],
        'g' => [0b00000, 0b01111, 0b10001, 0b10001, 0b01111, 0b00001, 0b01110],
        'h' => [0b10000, 0b10000, 0b10110, 0b11001, 0b10001, 0b10001, 0b10001],
        'i' => [0b00100, 0b00000, 0b01100, 0b00100, 0b00100, 0b00100, 0b01110],
        'j' => [0b00010, 0b00000, 0b00110, 0b00010, 0b00010, 0b10010, 0b01100],
        'k' => [0b10000, 0b10000, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010],
        'l' => [0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'm' => [0b00000, 0b00000, 0b11010, 0b10101, 0b10101, 0b10001, 0b10001],
        'n' => [0b00000, 0b00000, 0b10110, 0b11001, 0b10001, 0b10001, 0b10001],
        'o' => [0b00000, 0b00000, 0b01110, 0b10001, 0b10001, 0b10001, 0b01110],
        'p' => [0b00000, 0b00000, 0b11110, 0b10001, 0b11110, 0b10000, 0b10000],
        'q' => [0b00000, 0b00000, 0b01101, 0b10011, 0b01111, 0b00001, 0b00001],
        'r' => [0b00000, 0b00000, 0b10110, 0b11001, 0b10000, 0b10000, 0b10000],
        's' => [0b00000, 0b00000, 0b01110, 0b10000, 0b01110, 0b00001, 0b11110],
        't' => [0b01000, 0b01000, 0b11100, 0b01000, 0b01000, 0b01001, 0b00110],
        'u' => [0b00000, 0b00000, 0b10001, 0b10001, 0b10001, 0b10011, 0b01101],
        'v' => [0b00000, 0b00000, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'w' => [0b00000, 0b00000, 0b10001, 0b10001, 0b10101, 0b10101, 0b01010],
        'x' => [0b00000, 0b00000, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001],
        'y' => [0b00000, 0b00000, 0b10001, 0b10001, 0b01111, 0b00001, 0b01110],
        'z' => [0b00000, 0b00000, 0b11111, 0b00010, 0b00100, 0b01000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        ' ' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000],
        ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        ';' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b00100, 0b01000],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        _ => REPLACEMENT,
    }
}
