// THEORY:
// The minimum-area rotated rectangle is the tightest box, at any orientation,
// that contains a blob. It is what the size filter measures and what gets drawn.
//
// The rectangle is fitted over pixel *cells*, not pixel centers: every boundary
// pixel contributes the four corners of its unit square. A blob that covers N
// pixels along an axis therefore measures exactly N along that axis, which keeps
// the size filter exact for axis-aligned blobs and never produces a degenerate
// (zero-width) box. A fit over pixel centers, such as OpenCV's `minAreaRect` on
// contour points, measures the same blob as N - 1, so a 100 pixel blob passes a
// 100 pixel minimum here but not there.
//
// The optimum has one side collinear with an edge of the convex hull, so every
// hull edge is tried as a side direction (rotating calipers, quadratic form).

use imageproc::geometry::convex_hull;
use imageproc::point::Point;

use crate::core_modules::contour::PixelPoint;

/// A point in continuous image coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Side lengths of a rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size2 {
    pub width: f32,
    pub height: f32,
}

/// A rectangle of arbitrary orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    pub center: Point2,
    pub size: Size2,
    /// Rotation of the `width` side from the x axis, in degrees, within `[0, 90)`.
    pub angle: f32,
}

impl RotatedRect {
    /// The smallest-area rectangle covering every pixel cell of `points`.
    ///
    /// Returns `None` for an empty point set.
    pub fn enclosing_pixels(points: &[PixelPoint]) -> Option<Self> {
        let mut cells: Vec<(i32, i32)> = points
            .iter()
            .flat_map(|p| [(p.x, p.y), (p.x + 1, p.y), (p.x + 1, p.y + 1), (p.x, p.y + 1)])
            .collect();
        if cells.is_empty() {
            return None;
        }
        // Neighbouring pixels share corners.
        cells.sort_unstable();
        cells.dedup();
        let corners: Vec<Point<i32>> = cells.into_iter().map(|(x, y)| Point::new(x, y)).collect();
        let hull: Vec<(f64, f64)> = convex_hull(corners.as_slice())
            .into_iter()
            .map(|p| (p.x as f64, p.y as f64))
            .collect();
        min_area_rect(&hull)
    }

    /// The shorter of the two sides.
    pub fn min_side(&self) -> f32 {
        self.size.width.min(self.size.height)
    }

    /// The four corners in cyclic order.
    pub fn corners(&self) -> [Point2; 4] {
        let (sin, cos) = self.angle.to_radians().sin_cos();
        let (a, b) = (sin * 0.5, cos * 0.5);
        let Point2 { x: cx, y: cy } = self.center;
        let Size2 { width: w, height: h } = self.size;
        let p0 = Point2::new(cx - a * h - b * w, cy + b * h - a * w);
        let p1 = Point2::new(cx + a * h - b * w, cy - b * h - a * w);
        let p2 = Point2::new(2.0 * cx - p0.x, 2.0 * cy - p0.y);
        let p3 = Point2::new(2.0 * cx - p1.x, 2.0 * cy - p1.y);
        [p0, p1, p2, p3]
    }
}

fn min_area_rect(hull: &[(f64, f64)]) -> Option<RotatedRect> {
    // (area, origin, side direction, extents along / across it)
    let mut best: Option<(f64, (f64, f64), (f64, f64), [f64; 4])> = None;

    for (i, &origin) in hull.iter().enumerate() {
        let next = hull[(i + 1) % hull.len()];
        let (ex, ey) = (next.0 - origin.0, next.1 - origin.1);
        let length = ex.hypot(ey);
        if length == 0.0 {
            continue;
        }
        let (ux, uy) = (ex / length, ey / length);

        let mut extents = [f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY];
        for &(px, py) in hull {
            let (dx, dy) = (px - origin.0, py - origin.1);
            let along = dx * ux + dy * uy;
            let across = dy * ux - dx * uy;
            extents[0] = extents[0].min(along);
            extents[1] = extents[1].max(along);
            extents[2] = extents[2].min(across);
            extents[3] = extents[3].max(across);
        }
        let area = (extents[1] - extents[0]) * (extents[3] - extents[2]);
        if best.is_none_or(|(best_area, ..)| area < best_area) {
            best = Some((area, origin, (ux, uy), extents));
        }
    }

    let (_, origin, (ux, uy), [a0, a1, c0, c1]) = best?;
    let (mid_along, mid_across) = ((a0 + a1) * 0.5, (c0 + c1) * 0.5);
    let center = Point2::new(
        (origin.0 + ux * mid_along - uy * mid_across) as f32,
        (origin.1 + uy * mid_along + ux * mid_across) as f32,
    );

    let mut width = (a1 - a0) as f32;
    let mut height = (c1 - c0) as f32;
    let mut angle = uy.atan2(ux).to_degrees() as f32;
    // Quarter turns only swap the side labels.
    while angle < 0.0 {
        angle += 90.0;
        std::mem::swap(&mut width, &mut height);
    }
    while angle >= 90.0 {
        angle -= 90.0;
        std::mem::swap(&mut width, &mut height);
    }

    Some(RotatedRect {
        center,
        size: Size2 { width, height },
        angle,
    })
}
