//! Layer builders for each overlay effect.
//!
//! Every builder reads from the running accumulated image and returns a
//! positioned layer to be composited over it, or `None` when the clamped
//! region is empty.

// Pixel geometry moves between f32 and integer coordinates throughout.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

use image::{imageops, Rgba, RgbaImage};

use crate::domain::{Point, Rect};

/// Rec. 709 luma weights used for saturation changes.
const LUMA_WEIGHTS: [f32; 3] = [0.2125, 0.7154, 0.0721];

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// An image placed at an offset within the frame.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Layer pixels.
    pub image: RgbaImage,
    /// Left offset in frame pixels; may be negative.
    pub x: i64,
    /// Top offset in frame pixels; may be negative.
    pub y: i64,
}

impl Layer {
    /// Composites this layer source-over onto `target`.
    pub fn composite_onto(&self, target: &mut RgbaImage) {
        imageops::overlay(target, &self.image, self.x, self.y);
    }
}

/// Integer pixel window fully inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width, always positive.
    pub width: u32,
    /// Height, always positive.
    pub height: u32,
}

impl PixelRegion {
    /// Clamps `rect` to a `width` x `height` frame.
    ///
    /// Returns `None` when nothing of the rectangle lies inside the frame,
    /// including rectangles with zero or negative size.
    #[must_use]
    pub fn clamp(rect: &Rect, width: u32, height: u32) -> Option<Self> {
        if !rect.is_finite() || rect.is_empty() {
            return None;
        }
        let x0 = rect.x.max(0.0).floor();
        let y0 = rect.y.max(0.0).floor();
        let x1 = rect.right().min(width as f32).ceil();
        let y1 = rect.bottom().min(height as f32).ceil();
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }

    fn crop(&self, source: &RgbaImage) -> RgbaImage {
        imageops::crop_imm(source, self.x, self.y, self.width, self.height).to_image()
    }

    fn place(&self, image: RgbaImage) -> Layer {
        Layer {
            image,
            x: i64::from(self.x),
            y: i64::from(self.y),
        }
    }
}

/// Rotates the hue of `region` by `angle` radians.
#[must_use]
pub fn hue_rotate(source: &RgbaImage, region: &Rect, angle: f32) -> Option<Layer> {
    let window = PixelRegion::clamp(region, source.width(), source.height())?;
    let degrees = angle.to_degrees().round() as i32;
    let rotated = imageops::huerotate(&window.crop(source), degrees);
    Some(window.place(rotated))
}

/// Solid `color` inside `inner_radius`, fading linearly to transparent at
/// `outer_radius`.
///
/// Negative radii are treated as zero and an outer radius smaller than the
/// inner one is raised to match, giving a hard edge.
#[must_use]
pub fn radial_gradient(
    width: u32,
    height: u32,
    center: Point,
    inner_radius: f32,
    outer_radius: f32,
    color: Rgba<u8>,
) -> Option<Layer> {
    let inner = inner_radius.max(0.0);
    let outer = outer_radius.max(inner);
    if outer <= 0.0 {
        return None;
    }

    let bounds = Rect::centered(center, outer * 2.0, outer * 2.0);
    let window = PixelRegion::clamp(&bounds, width, height)?;
    let base_alpha = f32::from(color.0[3]);

    let gradient = RgbaImage::from_fn(window.width, window.height, |lx, ly| {
        let px = (window.x + lx) as f32 + 0.5;
        let py = (window.y + ly) as f32 + 0.5;
        let distance = (px - center.x).hypot(py - center.y);
        let coverage = if distance <= inner {
            1.0
        } else if distance >= outer {
            0.0
        } else {
            1.0 - (distance - inner) / (outer - inner)
        };
        let [r, g, b, _] = color.0;
        Rgba([r, g, b, (base_alpha * coverage).round() as u8])
    });

    Some(window.place(gradient))
}

/// Scales saturation around luma, then adds `brightness` (0.0-1.0 of full
/// scale) to every channel.
#[must_use]
pub fn color_controls(
    source: &RgbaImage,
    region: &Rect,
    saturation: f32,
    brightness: f32,
) -> Option<Layer> {
    let window = PixelRegion::clamp(region, source.width(), source.height())?;
    let mut adjusted = window.crop(source);

    let saturation = saturation.max(0.0);
    for pixel in adjusted.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let rgb = [f32::from(r), f32::from(g), f32::from(b)];
        let luma: f32 = rgb.iter().zip(LUMA_WEIGHTS).map(|(c, w)| c * w).sum();
        let mix = |c: f32| (luma + (c - luma) * saturation).clamp(0.0, 255.0).round() as u8;
        *pixel = Rgba([mix(rgb[0]), mix(rgb[1]), mix(rgb[2]), a]);
    }

    let offset = (brightness * 255.0).round() as i32;
    Some(window.place(imageops::brighten(&adjusted, offset)))
}

/// Bulges (positive `scale`) or pinches (negative `scale`) the pixels within
/// `radius` of `center`, sampling only from inside `region`.
///
/// Samples that fall outside `region` come back transparent, so the
/// composited result keeps whatever was underneath.
#[must_use]
pub fn bump_distortion(
    source: &RgbaImage,
    region: &Rect,
    center: Point,
    radius: f32,
    scale: f32,
) -> Option<Layer> {
    if radius <= 0.0 {
        return None;
    }
    let window = PixelRegion::clamp(region, source.width(), source.height())?;
    let cropped = window.crop(source);

    let distorted = RgbaImage::from_fn(window.width, window.height, |lx, ly| {
        let gx = (window.x + lx) as f32 + 0.5;
        let gy = (window.y + ly) as f32 + 0.5;
        let (dx, dy) = (gx - center.x, gy - center.y);
        let distance = dx.hypot(dy);
        if distance >= radius {
            return *cropped.get_pixel(lx, ly);
        }

        let mut factor = 1.0 - ((radius - distance) / radius) * scale;
        factor *= factor;
        let sx = (center.x + dx * factor - window.x as f32).floor();
        let sy = (center.y + dy * factor - window.y as f32).floor();
        if sx < 0.0 || sy < 0.0 || sx >= window.width as f32 || sy >= window.height as f32 {
            TRANSPARENT
        } else {
            *cropped.get_pixel(sx as u32, sy as u32)
        }
    });

    Some(window.place(distorted))
}
