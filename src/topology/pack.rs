//! Circle packing for services that have no position yet.
//!
//! Only the new services are packed; anything already on the canvas keeps
//! its place, so a batch of new nodes may land on top of old ones.

use eframe::egui::{Pos2, Vec2, pos2, vec2};

const EPSILON: f32 = 1e-3;

#[derive(Clone, Copy, Debug)]
struct Circle {
    center: Vec2,
    radius: f32,
}

impl Circle {
    fn overlaps(&self, other: &Circle) -> bool {
        let min_distance = self.radius + other.radius - EPSILON;
        (self.center - other.center).length_sq() < min_distance * min_distance
    }
}

/// Pack one circle per weight (area proportional to `max(weight, 1)`) and
/// scale the pack to fit `canvas`, keeping roughly `padding` screen pixels
/// between neighbours. Returns circle centres in canvas coordinates.
pub fn pack_centers(weights: &[u64], canvas: Vec2, padding: f32) -> Vec<Pos2> {
    let canvas_center = (canvas / 2.0).to_pos2();
    match weights.len() {
        0 => return Vec::new(),
        1 => return vec![canvas_center],
        _ => {}
    }

    let radii = weights
        .iter()
        .map(|&weight| (weight.max(1) as f32).sqrt())
        .collect::<Vec<_>>();
    let extent = canvas.x.min(canvas.y).max(1.0);

    // The padding is given in screen pixels, but the pack scale is only
    // known after packing: estimate it unpadded, then pack again padded.
    let unpadded = pack_siblings(&radii);
    let estimate = fit_scale(&unpadded, extent);
    let pad = if padding > 0.0 {
        padding / 2.0 / estimate
    } else {
        0.0
    };

    let padded_radii = radii.iter().map(|radius| radius + pad).collect::<Vec<_>>();
    let packed = pack_siblings(&padded_radii);
    let scale = fit_scale(&packed, extent);
    let (center, _) = enclosing(&packed);

    packed
        .iter()
        .map(|circle| canvas_center + (circle.center - center) * scale)
        .collect()
}

fn fit_scale(circles: &[Circle], extent: f32) -> f32 {
    let (_, radius) = enclosing(circles);
    if radius <= EPSILON {
        1.0
    } else {
        extent / (2.0 * radius)
    }
}

/// Approximate enclosing circle: centred on the bounding box of the pack.
fn enclosing(circles: &[Circle]) -> (Vec2, f32) {
    let mut min = vec2(f32::INFINITY, f32::INFINITY);
    let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
    for circle in circles {
        min = min.min(circle.center - Vec2::splat(circle.radius));
        max = max.max(circle.center + Vec2::splat(circle.radius));
    }
    let center = (min + max) / 2.0;
    let radius = circles
        .iter()
        .map(|circle| (circle.center - center).length() + circle.radius)
        .fold(0.0_f32, f32::max);
    (center, radius)
}

/// Place each circle tangent to two already placed ones, choosing the
/// non-overlapping spot closest to the origin.
fn pack_siblings(radii: &[f32]) -> Vec<Circle> {
    let mut placed: Vec<Circle> = Vec::with_capacity(radii.len());

    for &radius in radii {
        let next = match placed.len() {
            0 => Circle {
                center: Vec2::ZERO,
                radius,
            },
            1 => Circle {
                center: vec2(placed[0].radius + radius, 0.0),
                radius,
            },
            _ => best_tangent_spot(&placed, radius).unwrap_or_else(|| fallback_spot(&placed, radius)),
        };
        placed.push(next);
    }

    placed
}

fn best_tangent_spot(placed: &[Circle], radius: f32) -> Option<Circle> {
    let mut best: Option<(f32, Circle)> = None;

    for (i, a) in placed.iter().enumerate() {
        for b in &placed[i + 1..] {
            for center in tangent_centers(a, b, radius).into_iter().flatten() {
                let candidate = Circle { center, radius };
                if placed.iter().any(|other| candidate.overlaps(other)) {
                    continue;
                }
                let distance = center.length_sq();
                if best.is_none_or(|(best_distance, _)| distance < best_distance) {
                    best = Some((distance, candidate));
                }
            }
        }
    }

    best.map(|(_, circle)| circle)
}

/// Centres of a circle of `radius` touching both `a` and `b`.
fn tangent_centers(a: &Circle, b: &Circle, radius: f32) -> [Option<Vec2>; 2] {
    let da = a.radius + radius;
    let db = b.radius + radius;
    let offset = b.center - a.center;
    let d = offset.length();
    if d <= EPSILON || d > da + db || d < (da - db).abs() {
        return [None, None];
    }

    let along = (da * da - db * db + d * d) / (2.0 * d);
    let h_sq = da * da - along * along;
    if h_sq < 0.0 {
        return [None, None];
    }

    let direction = offset / d;
    let base = a.center + direction * along;
    let perpendicular = direction.rot90() * h_sq.sqrt();
    [Some(base + perpendicular), Some(base - perpendicular)]
}

fn fallback_spot(placed: &[Circle], radius: f32) -> Circle {
    let right = placed
        .iter()
        .map(|circle| circle.center.x + circle.radius)
        .fold(f32::NEG_INFINITY, f32::max);
    Circle {
        center: vec2(right + radius, 0.0),
        radius,
    }
}

/// Top-left corner for a node of `size` centred on `center`.
pub fn origin_for_center(center: Pos2, size: Vec2) -> Pos2 {
    pos2(center.x - size.x / 2.0, center.y - size.y / 2.0)
}
