// THEORY:
// The renderer is the only consumer of the detector's results in the live tool.
// It never mutates the caller's frame: it draws onto a copy, so the same input
// can be analyzed and rendered again with a different style.
//
// Each region gets two marks. The motion vector is a line from the box center
// to `center + motion * vector_scale`, so its direction and length show where
// the blob is heading. The rotated box is drawn by joining its four corners
// in cyclic order. Lines wider than one pixel are drawn as offset copies of the
// one-pixel line, i.e. a square brush.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use crate::core_modules::region::Region;
use crate::core_modules::rotated_rect::Point2;

/// Colors and line widths of the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub vector_color: Rgb<u8>,
    /// Multiplier from mean displacement (pixels per frame) to line length.
    pub vector_scale: f32,
    pub vector_width: u32,
    pub box_color: Rgb<u8>,
    pub box_width: u32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            vector_color: Rgb([0, 255, 0]),
            vector_scale: 10.0,
            vector_width: 1,
            box_color: Rgb([255, 0, 0]),
            box_width: 2,
        }
    }
}

/// Draws every region's motion vector and bounding box onto a copy of `frame`.
pub fn render_regions(frame: &RgbImage, regions: &[Region], style: &RenderStyle) -> RgbImage {
    let mut canvas = frame.clone();
    for region in regions {
        let center = region.bounds.center;
        let tip = Point2::new(
            center.x + region.motion.dx * style.vector_scale,
            center.y + region.motion.dy * style.vector_scale,
        );
        draw_thick_line(&mut canvas, center, tip, style.vector_width, style.vector_color);

        let corners = region.bounds.corners();
        for (i, &corner) in corners.iter().enumerate() {
            let previous = corners[(i + corners.len() - 1) % corners.len()];
            draw_thick_line(&mut canvas, previous, corner, style.box_width, style.box_color);
        }
    }
    canvas
}

fn draw_thick_line(canvas: &mut RgbImage, from: Point2, to: Point2, width: u32, color: Rgb<u8>) {
    let width = width.max(1) as i32;
    // Even widths put the extra pixel on the negative side.
    let offsets = -(width / 2)..width - width / 2;
    for ox in offsets.clone() {
        for oy in offsets.clone() {
            let (ox, oy) = (ox as f32, oy as f32);
            draw_line_segment_mut(canvas, (from.x + ox, from.y + oy), (to.x + ox, to.y + oy), color);
        }
    }
}
