//! Overlay compositing.
//!
//! For every detected face the compositor builds an [`OverlayPlan`], a fixed
//! sequence of layer operations, and executes it against the running output
//! image. Each layer is composited source-over, so later layers win where
//! they overlap. Faces are processed strictly in detector order.

// Anchor coordinates are rounded to whole pixels.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

pub mod effects;
pub mod text;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::domain::{DirectionLabel, FaceFeature, Frame, Point, Rect};
use crate::error::OverlayError;

pub use effects::Layer;
pub use text::BitmapFont;

/// Tuning for [`OverlayCompositor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Pixels added to the face box height for the highlight region.
    pub face_height_increase: f32,
    /// Pixels the highlight region starts above the face box.
    pub face_top_offset: f32,
    /// Hue rotation applied to the face, in radians.
    pub hue_angle: f32,
    /// Eye gradient radius that stays fully opaque.
    pub eye_inner_radius: f32,
    /// Eye gradient radius where the color reaches full transparency.
    pub eye_outer_radius: f32,
    /// RGBA eye gradient color.
    pub eye_color: [u8; 4],
    /// Side of the square window around the mouth.
    pub mouth_size: f32,
    /// Mouth saturation multiplier.
    pub saturation: f32,
    /// Mouth brightness offset (fraction of full scale).
    pub brightness: f32,
    /// RGBA status text color.
    pub text_color: [u8; 4],
    /// Integer scale of the bitmap font, clamped to `1..=text::MAX_SCALE`.
    pub text_scale: u32,
    /// Distance between the text bottom and the frame bottom.
    pub text_bottom_margin: f32,
    /// The text starts at `(frame width - text width) / text_left_divisor`.
    pub text_left_divisor: f32,
    /// Bump strength for smiling faces; negative values pinch.
    pub smile_scale: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            face_height_increase: 300.0,
            face_top_offset: 30.0,
            hue_angle: 2.1,
            eye_inner_radius: 10.0,
            eye_outer_radius: 20.0,
            eye_color: [255, 0, 0, 255],
            mouth_size: 100.0,
            saturation: 1.2,
            brightness: 0.2,
            text_color: [255, 255, 255, 255],
            text_scale: 3,
            text_bottom_margin: 100.0,
            text_left_divisor: 16.0,
            smile_scale: -1.0,
        }
    }
}

impl OverlayConfig {
    /// Sets the smile bump strength.
    #[must_use]
    pub const fn with_smile_scale(mut self, scale: f32) -> Self {
        self.smile_scale = scale;
        self
    }

    /// Sets the status text scale. The font clamps it to
    /// `1..=text::MAX_SCALE`.
    #[must_use]
    pub const fn with_text_scale(mut self, scale: u32) -> Self {
        self.text_scale = scale;
        self
    }

    /// Sets the eye gradient radii.
    #[must_use]
    pub const fn with_eye_radii(mut self, inner: f32, outer: f32) -> Self {
        self.eye_inner_radius = inner;
        self.eye_outer_radius = outer;
        self
    }

    /// Region tinted by the face highlight and bounded by the smile bump.
    #[must_use]
    pub fn face_region(&self, bounds: &Rect) -> Rect {
        Rect::new(
            bounds.x,
            bounds.y - self.face_top_offset,
            bounds.width,
            bounds.height + self.face_height_increase,
        )
    }
}

/// What a plan step draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    /// Hue-rotated face region.
    FaceHighlight,
    /// Gradient over the left eye.
    LeftEyeHighlight,
    /// Gradient over the right eye.
    RightEyeHighlight,
    /// Saturated window around the mouth.
    MouthHighlight,
    /// Blink count and direction label.
    StatusText,
    /// Bump distortion over a smiling face.
    SmileDistortion,
}

impl OverlayKind {
    /// Short name used in logs and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FaceHighlight => "face highlight",
            Self::LeftEyeHighlight => "left eye highlight",
            Self::RightEyeHighlight => "right eye highlight",
            Self::MouthHighlight => "mouth highlight",
            Self::StatusText => "status text",
            Self::SmileDistortion => "smile distortion",
        }
    }
}

/// Pixel operation and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Rotate hue by `angle` radians.
    HueRotate {
        /// Radians.
        angle: f32,
    },
    /// Solid color fading out between two radii around the anchor.
    RadialGradient {
        /// Fully opaque radius.
        inner_radius: f32,
        /// Fully transparent radius.
        outer_radius: f32,
        /// RGBA color.
        color: Rgba<u8>,
    },
    /// Saturation multiplier and brightness offset.
    ColorControls {
        /// Saturation multiplier.
        saturation: f32,
        /// Brightness offset.
        brightness: f32,
    },
    /// Opaque text with its top-left corner at the anchor.
    Text {
        /// Text to draw.
        text: String,
        /// RGBA color.
        color: Rgba<u8>,
    },
    /// Radial bump or pinch around the anchor.
    BumpDistortion {
        /// Affected radius.
        radius: f32,
        /// Strength; negative pinches.
        scale: f32,
    },
}

/// One step of an [`OverlayPlan`].
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayOp {
    /// What this step draws.
    pub kind: OverlayKind,
    /// Source region, when the effect reads from one.
    pub region: Option<Rect>,
    /// Center or origin of the effect.
    pub anchor: Point,
    /// Pixel operation.
    pub effect: Effect,
}

/// Ordered overlay operations for one face.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayPlan {
    ops: Vec<OverlayOp>,
}

impl OverlayPlan {
    /// Operations in execution order.
    #[must_use]
    pub fn ops(&self) -> &[OverlayOp] {
        &self.ops
    }

    /// Kinds in execution order.
    #[must_use]
    pub fn kinds(&self) -> Vec<OverlayKind> {
        self.ops.iter().map(|op| op.kind).collect()
    }

    /// Number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if the plan draws nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Formats the status line shown on every face.
#[must_use]
pub fn status_text(blink_count: u32, direction: DirectionLabel) -> String {
    format!("Blinks: {blink_count}; {direction}")
}

/// Builds displayed frames from detected faces.
#[derive(Debug, Clone)]
pub struct OverlayCompositor {
    config: OverlayConfig,
    font: BitmapFont,
}

impl Default for OverlayCompositor {
    fn default() -> Self {
        Self::new(OverlayConfig::default())
    }
}

impl OverlayCompositor {
    /// Creates a compositor and its font.
    #[must_use]
    pub fn new(config: OverlayConfig) -> Self {
        let font = BitmapFont::new(config.text_scale);
        Self { config, font }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Builds the layer sequence for one face on a `frame_width` x
    /// `frame_height` frame.
    #[must_use]
    pub fn plan(
        &self,
        face: &FaceFeature,
        status: &str,
        frame_width: u32,
        frame_height: u32,
    ) -> OverlayPlan {
        let cfg = &self.config;
        let face_region = cfg.face_region(&face.bounds);
        let eye_color = Rgba(cfg.eye_color);

        let mut ops = vec![
            OverlayOp {
                kind: OverlayKind::FaceHighlight,
                region: Some(face_region),
                anchor: face_region.center(),
                effect: Effect::HueRotate {
                    angle: cfg.hue_angle,
                },
            },
            OverlayOp {
                kind: OverlayKind::LeftEyeHighlight,
                region: None,
                anchor: face.left_eye,
                effect: Effect::RadialGradient {
                    inner_radius: cfg.eye_inner_radius,
                    outer_radius: cfg.eye_outer_radius,
                    color: eye_color,
                },
            },
            OverlayOp {
                kind: OverlayKind::RightEyeHighlight,
                region: None,
                anchor: face.right_eye,
                effect: Effect::RadialGradient {
                    inner_radius: cfg.eye_inner_radius,
                    outer_radius: cfg.eye_outer_radius,
                    color: eye_color,
                },
            },
            OverlayOp {
                kind: OverlayKind::MouthHighlight,
                region: Some(Rect::centered(face.mouth, cfg.mouth_size, cfg.mouth_size)),
                anchor: face.mouth,
                effect: Effect::ColorControls {
                    saturation: cfg.saturation,
                    brightness: cfg.brightness,
                },
            },
        ];

        if !status.is_empty() {
            let (text_width, text_height) = self.font.measure(status);
            let (tw, th) = (text_width as f32, text_height as f32);
            let divisor = if cfg.text_left_divisor > 0.0 {
                cfg.text_left_divisor
            } else {
                1.0
            };
            let anchor = Point::new(
                ((frame_width as f32 - tw) / divisor).floor(),
                (frame_height as f32 - th - cfg.text_bottom_margin).floor(),
            );
            ops.push(OverlayOp {
                kind: OverlayKind::StatusText,
                region: Some(Rect::new(anchor.x, anchor.y, tw, th)),
                anchor,
                effect: Effect::Text {
                    text: status.to_owned(),
                    color: Rgba(cfg.text_color),
                },
            });
        }

        if face.smiling {
            ops.push(OverlayOp {
                kind: OverlayKind::SmileDistortion,
                region: Some(face_region),
                anchor: face.bounds.center(),
                effect: Effect::BumpDistortion {
                    radius: face.bounds.width / 2.0,
                    scale: cfg.smile_scale,
                },
            });
        }

        OverlayPlan { ops }
    }

    /// Composites every face's overlays and the status text onto `frame`.
    ///
    /// With no faces the frame is returned untouched. A face whose geometry
    /// cannot be drawn keeps the layers already applied and skips the rest.
    #[must_use]
    pub fn composite(
        &self,
        mut frame: Frame,
        faces: &[FaceFeature],
        blink_count: u32,
        direction: DirectionLabel,
    ) -> Frame {
        if faces.is_empty() {
            return frame;
        }

        let status = status_text(blink_count, direction);
        let (width, height) = (frame.width(), frame.height());
        for (index, face) in faces.iter().enumerate() {
            let plan = self.plan(face, &status, width, height);
            if let Err(e) = self.execute(&mut frame.image, &plan) {
                warn!(
                    frame = frame.sequence,
                    face = index,
                    "Skipping remaining overlays: {e}"
                );
            }
        }
        frame
    }

    /// Runs `plan` against `image`, compositing each layer as it is built.
    ///
    /// # Errors
    ///
    /// Stops at the first operation with non-finite geometry. Layers
    /// composited before the failure stay in `image`.
    pub fn execute(&self, image: &mut RgbaImage, plan: &OverlayPlan) -> Result<(), OverlayError> {
        for op in plan.ops() {
            match self.build_layer(image, op)? {
                Some(layer) => layer.composite_onto(image),
                None => trace!(kind = op.kind.as_str(), "Layer clipped out of frame"),
            }
        }
        Ok(())
    }

    fn build_layer(&self, image: &RgbaImage, op: &OverlayOp) -> Result<Option<Layer>, OverlayError> {
        let name = op.kind.as_str();
        if !op.anchor.is_finite() || op.region.is_some_and(|r| !r.is_finite()) {
            return Err(OverlayError::NonFinite(name));
        }
        let region = op.region.unwrap_or_default();

        let layer = match &op.effect {
            Effect::HueRotate { angle } => effects::hue_rotate(image, &region, *angle),
            Effect::RadialGradient {
                inner_radius,
                outer_radius,
                color,
            } => {
                if !inner_radius.is_finite() || !outer_radius.is_finite() {
                    return Err(OverlayError::NonFinite(name));
                }
                effects::radial_gradient(
                    image.width(),
                    image.height(),
                    op.anchor,
                    *inner_radius,
                    *outer_radius,
                    *color,
                )
            }
            Effect::ColorControls {
                saturation,
                brightness,
            } => effects::color_controls(image, &region, *saturation, *brightness),
            Effect::Text { text, color } => self
                .font
                .render_clipped(
                    text,
                    *color,
                    op.anchor.x as i64,
                    op.anchor.y as i64,
                    image.dimensions(),
                )
                .map(|(rendered, x, y)| Layer {
                    image: rendered,
                    x,
                    y,
                }),
            Effect::BumpDistortion { radius, scale } => {
                if !radius.is_finite() || !scale.is_finite() {
                    return Err(OverlayError::NonFinite(name));
                }
                effects::bump_distortion(image, &region, op.anchor, *radius, *scale)
            }
        };
        Ok(layer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn face(smiling: bool) -> FaceFeature {
        FaceFeature {
            bounds: Rect::new(100.0, 80.0, 120.0, 140.0),
            left_eye: Point::new(130.0, 130.0),
            right_eye: Point::new(190.0, 130.0),
            mouth: Point::new(160.0, 190.0),
            left_eye_closed: false,
            right_eye_closed: false,
            smiling,
            yaw: None,
            roll: None,
        }
    }

    fn frame() -> Frame {
        let image = RgbaImage::from_fn(400, 600, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 90, 255])
        });
        Frame::new(0, image)
    }

    #[test]
    fn test_status_text_format() {
        assert_eq!(
            status_text(3, DirectionLabel::LookingLeft),
            "Blinks: 3; Looking Left"
        );
    }

    #[test]
    fn test_plan_order_without_smile() {
        let plan = OverlayCompositor::default().plan(&face(false), "Blinks: 0", 400, 600);
        assert_eq!(
            plan.kinds(),
            vec![
                OverlayKind::FaceHighlight,
                OverlayKind::LeftEyeHighlight,
                OverlayKind::RightEyeHighlight,
                OverlayKind::MouthHighlight,
                OverlayKind::StatusText,
            ]
        );
    }

    #[test]
    fn test_plan_smile_is_last() {
        let plan = OverlayCompositor::default().plan(&face(true), "Blinks: 0", 400, 600);
        assert_eq!(plan.len(), 6);
        assert_eq!(plan.kinds().last(), Some(&OverlayKind::SmileDistortion));

        let smile = &plan.ops()[5];
        assert_eq!(smile.anchor, Point::new(160.0, 150.0));
        assert_eq!(smile.region, Some(Rect::new(100.0, 50.0, 120.0, 440.0)));
        assert_eq!(
            smile.effect,
            Effect::BumpDistortion {
                radius: 60.0,
                scale: -1.0
            }
        );
    }

    #[test]
    fn test_plan_geometry() {
        let compositor = OverlayCompositor::default();
        let status = "Blinks: 0; Looking Straight";
        let plan = compositor.plan(&face(false), status, 400, 600);

        assert_eq!(
            plan.ops()[0].region,
            Some(Rect::new(100.0, 50.0, 120.0, 440.0))
        );
        assert_eq!(
            plan.ops()[3].region,
            Some(Rect::new(110.0, 140.0, 100.0, 100.0))
        );

        let (tw, th) = BitmapFont::new(3).measure(status);
        let text = &plan.ops()[4];
        let expected_x = ((400.0 - tw as f32) / 16.0).floor();
        let expected_y = 600.0 - th as f32 - 100.0;
        assert_eq!(text.anchor, Point::new(expected_x, expected_y));
    }

    #[test]
    fn test_empty_status_skips_text() {
        let plan = OverlayCompositor::default().plan(&face(false), "", 400, 600);
        assert!(!plan.kinds().contains(&OverlayKind::StatusText));
    }

    #[test]
    fn test_no_faces_is_identity() {
        let input = frame();
        let output =
            OverlayCompositor::default().composite(input.clone(), &[], 0, DirectionLabel::default());
        assert_eq!(output, input);
    }

    #[test]
    fn test_face_changes_frame() {
        let input = frame();
        let output = OverlayCompositor::default().composite(
            input.clone(),
            &[face(false)],
            1,
            DirectionLabel::LookingStraight,
        );
        assert_eq!(output.sequence, input.sequence);
        assert_eq!(output.image.dimensions(), input.image.dimensions());
        // Left eye center is painted with the gradient color
        assert_eq!(output.image.get_pixel(130, 130).0, [255, 0, 0, 255]);
        // Far corner is outside every layer
        assert_eq!(output.image.get_pixel(399, 0), input.image.get_pixel(399, 0));
    }

    #[test]
    fn test_smile_changes_face_region() {
        let compositor = OverlayCompositor::default();
        let plain = compositor.composite(frame(), &[face(false)], 0, DirectionLabel::default());
        let smiling = compositor.composite(frame(), &[face(true)], 0, DirectionLabel::default());
        assert_ne!(plain.image, smiling.image);
    }

    #[test]
    fn test_non_finite_face_abandons_remaining_layers() {
        let mut broken = face(true);
        broken.mouth = Point::new(f32::NAN, 190.0);
        let input = frame();

        let compositor = OverlayCompositor::default();
        let mut image = input.image.clone();
        let plan = compositor.plan(&broken, "Blinks: 0", 400, 600);
        let err = compositor.execute(&mut image, &plan).unwrap_err();
        assert_eq!(err, OverlayError::NonFinite("mouth highlight"));
        // Eye layer before the failure stays applied
        assert_eq!(image.get_pixel(130, 130).0, [255, 0, 0, 255]);

        let output = compositor.composite(input, &[broken], 0, DirectionLabel::default());
        assert_eq!(output.image, image);
    }

    #[test]
    fn test_broken_face_does_not_block_next_face() {
        let mut broken = face(false);
        broken.bounds.x = f32::INFINITY;
        let mut other = face(false);
        other.left_eye = Point::new(300.0, 400.0);

        let output =
            OverlayCompositor::default().composite(frame(), &[broken, other], 0, DirectionLabel::default());
        assert_eq!(output.image.get_pixel(300, 400).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_face_outside_frame_is_noop_for_region_layers() {
        let mut far = face(false);
        far.bounds = Rect::new(5000.0, 5000.0, 10.0, 10.0);
        far.left_eye = Point::new(5000.0, 5000.0);
        far.right_eye = Point::new(5000.0, 5000.0);
        far.mouth = Point::new(5000.0, 5000.0);

        let compositor = OverlayCompositor::default();
        let mut image = frame().image;
        let before = image.clone();
        let plan = compositor.plan(&far, "", 400, 600);
        compositor.execute(&mut image, &plan).unwrap();
        assert_eq!(image, before);
    }

    #[test]
    fn test_oversized_text_scale_on_small_frame() {
        let compositor =
            OverlayCompositor::new(OverlayConfig::default().with_text_scale(u32::MAX));
        let small = Frame::new(0, RgbaImage::from_pixel(64, 64, Rgba([10, 20, 30, 255])));
        let mut tiny_face = face(false);
        tiny_face.bounds = Rect::new(8.0, 8.0, 30.0, 30.0);
        tiny_face.left_eye = Point::new(15.0, 18.0);
        tiny_face.right_eye = Point::new(30.0, 18.0);
        tiny_face.mouth = Point::new(22.0, 30.0);

        let out = compositor.composite(small, &[tiny_face], 0, DirectionLabel::LookingStraight);
        assert_eq!(out.image.dimensions(), (64, 64));
    }
}
