use eframe::egui::{Rect, Vec2, pos2, vec2};

use super::viewbox::ViewBox;

/// Logarithmic scale with a `[1, 10]` domain, unclamped like its d3
/// counterpart: weights beyond the domain keep growing slowly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogScale {
    domain: (f32, f32),
    range: (f32, f32),
}

impl LogScale {
    pub const fn new(range_start: f32, range_end: f32) -> Self {
        Self {
            domain: (1.0, 10.0),
            range: (range_start, range_end),
        }
    }

    pub fn apply(&self, value: f32) -> f32 {
        let (d0, d1) = self.domain;
        let t = (value.ln() - d0.ln()) / (d1.ln() - d0.ln());
        self.range.0 + t * (self.range.1 - self.range.0)
    }
}

/// Node artwork is wider than it is tall, so each axis has its own scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ServiceScale {
    pub width: LogScale,
    pub height: LogScale,
}

impl Default for ServiceScale {
    fn default() -> Self {
        Self {
            width: LogScale::new(164.0, 200.0),
            height: LogScale::new(64.0, 100.0),
        }
    }
}

impl ServiceScale {
    /// Zero-unit services (subordinates) are sized like single-unit ones.
    pub fn size(&self, weight: u64) -> Vec2 {
        let weight = weight.max(1) as f32;
        vec2(self.width.apply(weight), self.height.apply(weight))
    }
}

// Pixel sizes measured on the 224px reference artwork.
const REFERENCE_HEIGHT: f32 = 224.0;
const NAME_FONT: f32 = 22.0;
const NAME_PADDING: f32 = 26.0;
const CHARM_FONT: f32 = 16.0;
const CHARM_PADDING: f32 = 118.0;
const SUB_RELATION_OFFSET: f32 = 26.0;
const HEALTH_MASK_BORDER: f32 = 2.05;

/// Geometry of everything drawn inside a node, relative to its origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeMetrics {
    pub size: Vec2,
    pub relative_center: Vec2,
    pub name_font: f32,
    pub name_anchor: Vec2,
    pub charm_font: f32,
    pub charm_anchor: Vec2,
    pub exposed_badge: Option<Rect>,
    pub health_mask: Vec2,
    pub health_radius: f32,
    pub sub_relation_anchor: Option<Vec2>,
}

impl NodeMetrics {
    pub fn for_box(view: &ViewBox) -> Self {
        let (w, h) = (view.w, view.h);
        let relative_center = view.relative_center();

        let name_font = h * (NAME_FONT / REFERENCE_HEIGHT);
        let charm_font = h * (CHARM_FONT / REFERENCE_HEIGHT);

        let exposed_badge = view.exposed.then(|| {
            let side = w / 6.0;
            Rect::from_min_size(
                pos2(w / 10.0 * 7.0, relative_center.y - side / 2.0),
                vec2(side, side),
            )
        });

        let health_mask = vec2(w / 3.0, h / 3.0);

        Self {
            size: vec2(w, h),
            relative_center,
            name_font,
            name_anchor: vec2(
                w / 2.0,
                h * (NAME_PADDING / REFERENCE_HEIGHT) + name_font / 2.0,
            ),
            charm_font,
            charm_anchor: vec2(
                w / 2.0,
                h * (CHARM_PADDING / REFERENCE_HEIGHT) - charm_font / 2.0,
            ),
            exposed_badge,
            health_mask,
            health_radius: health_mask.x / HEALTH_MASK_BORDER,
            sub_relation_anchor: view
                .subordinate
                .then(|| vec2(w, h / 2.0 - SUB_RELATION_OFFSET)),
        }
    }
}
