//! Overlay compositing tests on synthetic frames.

#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use face_fx_core::domain::{DirectionLabel, Point, Rect};
use face_fx_core::overlay::{status_text, OverlayCompositor, OverlayConfig, OverlayKind};
use face_fx_test_support::{FaceFeatureBuilder, SyntheticFrameBuilder};

fn face_box() -> Rect {
    Rect::new(200.0, 150.0, 200.0, 200.0)
}

#[test]
fn test_empty_faces_byte_identical() {
    let compositor = OverlayCompositor::default();
    let frame = SyntheticFrameBuilder::gradient(9, 640, 480);
    let output = compositor.composite(frame.clone(), &[], 12, DirectionLabel::HeadTiltedLeft);
    assert_eq!(output.image.as_raw(), frame.image.as_raw());
    assert_eq!(output.sequence, 9);
}

#[test]
fn test_smile_distortion_runs_last() {
    let compositor = OverlayCompositor::default();
    let face = FaceFeatureBuilder::new(face_box()).smiling(true).build();
    let plan = compositor.plan(&face, &status_text(0, DirectionLabel::default()), 640, 480);
    assert_eq!(
        plan.kinds(),
        vec![
            OverlayKind::FaceHighlight,
            OverlayKind::LeftEyeHighlight,
            OverlayKind::RightEyeHighlight,
            OverlayKind::MouthHighlight,
            OverlayKind::StatusText,
            OverlayKind::SmileDistortion,
        ]
    );
}

#[test]
fn test_smiling_differs_only_inside_face_region() {
    let compositor = OverlayCompositor::default();
    let builder = FaceFeatureBuilder::new(face_box());
    let base = SyntheticFrameBuilder::checkerboard(0, 640, 480, 6);

    let plain = compositor.composite(
        base.clone(),
        &[builder.clone().build()],
        0,
        DirectionLabel::default(),
    );
    let smiling = compositor.composite(
        base,
        &[builder.smiling(true).build()],
        0,
        DirectionLabel::default(),
    );

    let region = OverlayConfig::default().face_region(&face_box());
    let mut inside = 0;
    for (x, y, pixel) in smiling.image.enumerate_pixels() {
        if pixel == plain.image.get_pixel(x, y) {
            continue;
        }
        let (fx, fy) = (x as f32, y as f32);
        assert!(
            fx >= region.x && fx < region.right() && fy >= region.y && fy < region.bottom(),
            "pixel ({x}, {y}) changed outside the face region"
        );
        inside += 1;
    }
    assert!(inside > 0);
}

#[test]
fn test_status_text_drawn_in_text_color() {
    let config = OverlayConfig {
        text_color: [0, 255, 0, 255],
        ..OverlayConfig::default()
    };
    let compositor = OverlayCompositor::new(config);
    // Face far from the text band so only the text lands there
    let face = FaceFeatureBuilder::new(Rect::new(500.0, 0.0, 60.0, 60.0)).build();
    let frame = SyntheticFrameBuilder::uniform(0, 640, 480, [10, 10, 10]);

    let plan = compositor.plan(&face, &status_text(4, DirectionLabel::LookingLeft), 640, 480);
    let text = plan
        .ops()
        .iter()
        .find(|op| op.kind == OverlayKind::StatusText)
        .unwrap();
    let band = text.region.unwrap();

    let output = compositor.composite(frame, &[face], 4, DirectionLabel::LookingLeft);
    let green = (band.x as u32..band.right() as u32)
        .flat_map(|x| (band.y as u32..band.bottom() as u32).map(move |y| (x, y)))
        .filter(|&(x, y)| output.image.get_pixel(x, y).0 == [0, 255, 0, 255])
        .count();
    assert!(green > 0);
}

#[test]
fn test_later_face_wins_overlap() {
    let compositor = OverlayCompositor::default();
    let eye = Point::new(100.0, 100.0);
    let first = FaceFeatureBuilder::new(Rect::new(50.0, 50.0, 100.0, 100.0))
        .eyes(eye, eye)
        .build();
    let second = FaceFeatureBuilder::new(Rect::new(50.0, 50.0, 100.0, 100.0))
        .eyes(Point::new(300.0, 200.0), Point::new(300.0, 200.0))
        .build();

    let frame = SyntheticFrameBuilder::gray(0, 400, 400);
    let single = compositor.composite(frame.clone(), &[first.clone()], 0, DirectionLabel::default());
    let both = compositor.composite(frame, &[first, second], 0, DirectionLabel::default());
    // The second face's hue rotation is drawn over the first face's eye
    assert_ne!(both.image.get_pixel(100, 100), single.image.get_pixel(100, 100));
    assert_eq!(both.image.get_pixel(300, 200).0, [255, 0, 0, 255]);
}
