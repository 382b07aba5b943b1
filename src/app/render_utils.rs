use std::f32::consts::TAU;

use eframe::egui::{Color32, Painter, Pos2, Rect, Shape, Stroke, pos2};

use crate::env::UnitStatus;
use crate::topology::Transform;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, transform: Transform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * transform.scale.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.min + transform.translate;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([pos2(x, rect.top()), pos2(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([pos2(rect.left(), y), pos2(rect.right(), y)], stroke);
        y += step;
    }
}

/// World position to absolute screen position inside the canvas rect.
pub(super) fn world_to_screen(rect: Rect, transform: Transform, world: Pos2) -> Pos2 {
    rect.min + transform.to_screen(world).to_vec2()
}

pub(super) fn status_color(status: UnitStatus) -> Color32 {
    match status {
        UnitStatus::Error => Color32::from_rgb(214, 74, 64),
        UnitStatus::Pending => Color32::from_rgb(236, 178, 72),
        UnitStatus::Running => Color32::from_rgb(86, 178, 112),
    }
}

/// Start and end angle of each non-empty status slice, clockwise from
/// twelve o'clock.
pub(super) fn pie_angles(counts: &[(UnitStatus, u64)]) -> Vec<(UnitStatus, f32, f32)> {
    let total = counts.iter().map(|(_, count)| *count).sum::<u64>();
    if total == 0 {
        return Vec::new();
    }

    let mut start = 0.0;
    counts
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|&(status, count)| {
            let end = start + TAU * (count as f32 / total as f32);
            let slice = (status, start, end);
            start = end;
            slice
        })
        .collect()
}

pub(super) fn pie_shapes(center: Pos2, radius: f32, counts: &[(UnitStatus, u64)]) -> Vec<Shape> {
    let slices = pie_angles(counts);
    if let [(status, _, _)] = slices.as_slice() {
        return vec![Shape::circle_filled(center, radius, status_color(*status))];
    }

    let mut shapes = Vec::new();
    for (status, start, end) in slices {
        // Convex pieces only: split every slice into quarter turns at most.
        let pieces = ((end - start) / (TAU / 4.0)).ceil().max(1.0) as usize;
        let step = (end - start) / pieces as f32;
        for piece in 0..pieces {
            let from = start + step * piece as f32;
            let to = from + step;
            let segments = ((to - from) / 0.12).ceil().max(1.0) as usize;
            let mut points = Vec::with_capacity(segments + 2);
            points.push(center);
            for segment in 0..=segments {
                let angle = from + (to - from) * segment as f32 / segments as f32;
                points.push(center + radius * eframe::egui::vec2(angle.sin(), -angle.cos()));
            }
            shapes.push(Shape::convex_polygon(
                points,
                status_color(status),
                Stroke::NONE,
            ));
        }
    }
    shapes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pie_slices_are_ordered_and_cover_the_circle() {
        let slices = pie_angles(&[
            (UnitStatus::Error, 1),
            (UnitStatus::Pending, 0),
            (UnitStatus::Running, 3),
        ]);

        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].0, UnitStatus::Error);
        assert!((slices[0].2 - TAU / 4.0).abs() < 1e-4);
        assert_eq!(slices[1].0, UnitStatus::Running);
        assert!((slices[1].2 - TAU).abs() < 1e-4);
    }

    #[test]
    fn empty_service_has_no_pie() {
        assert!(pie_angles(&[]).is_empty());
        assert!(pie_shapes(Pos2::ZERO, 10.0, &[(UnitStatus::Running, 0)]).is_empty());
    }

    #[test]
    fn single_status_is_one_full_circle() {
        let shapes = pie_shapes(Pos2::ZERO, 10.0, &[(UnitStatus::Running, 4)]);
        assert_eq!(shapes.len(), 1);
    }
}
