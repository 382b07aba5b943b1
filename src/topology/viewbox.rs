use std::collections::BTreeMap;

use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

use crate::env::{Service, UnitStatus};

use super::context::Transform;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragPhase {
    #[default]
    None,
    Started,
    Active,
}

/// Transparent border of the node artwork, as fractions of its size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Margins {
    pub const SERVICE: Self = Self {
        top: 0.0,
        bottom: 0.1667,
        left: 0.086758,
        right: 0.086758,
    };
    pub const SUBORDINATE: Self = Self {
        top: 0.05,
        bottom: 0.1,
        left: 0.084848,
        right: 0.084848,
    };
}

/// Visual state of one service on the canvas, keyed by the service id.
///
/// The box never owns the service: `id` is only a key back into the
/// database.
#[derive(Clone, Debug)]
pub struct ViewBox {
    pub id: String,
    pub charm: String,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub w: f32,
    pub h: f32,
    pub pending: bool,
    pub drag_phase: DragPhase,
    pub drag_origin: Option<Pos2>,
    /// Bumped on every drag start so late acknowledgments can be matched
    /// to the drag that issued them.
    pub drag_generation: u64,
    /// Creation sequence; later boxes paint above earlier ones.
    pub stack_order: u64,
    pub subordinate: bool,
    pub exposed: bool,
    pub unit_count: u64,
    pub aggregated_status: BTreeMap<UnitStatus, u64>,
}

pub type ViewBoxStore = BTreeMap<String, ViewBox>;

impl ViewBox {
    pub fn from_service(service: &Service) -> Self {
        let mut view = Self {
            id: service.id.clone(),
            charm: String::new(),
            x: service.x,
            y: service.y,
            w: 0.0,
            h: 0.0,
            pending: false,
            drag_phase: DragPhase::None,
            drag_origin: None,
            drag_generation: 0,
            stack_order: 0,
            subordinate: false,
            exposed: false,
            unit_count: 0,
            aggregated_status: BTreeMap::new(),
        };
        view.sync_from(service);
        view
    }

    pub fn sync_from(&mut self, service: &Service) {
        self.charm.clone_from(&service.charm);
        self.pending = service.pending;
        self.subordinate = service.subordinate;
        self.exposed = service.exposed;
        self.unit_count = service.unit_count();
        self.aggregated_status = service.aggregated_status();
    }

    pub fn is_placed(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }

    pub fn position(&self) -> Pos2 {
        pos2(self.x.unwrap_or(0.0), self.y.unwrap_or(0.0))
    }

    pub fn set_position(&mut self, position: Pos2) {
        self.x = Some(position.x);
        self.y = Some(position.y);
    }

    pub fn size(&self) -> Vec2 {
        vec2(self.w, self.h)
    }

    pub fn margins(&self) -> Margins {
        if self.subordinate {
            Margins::SUBORDINATE
        } else {
            Margins::SERVICE
        }
    }

    /// Centre of the visible artwork relative to the box origin.
    pub fn relative_center(&self) -> Vec2 {
        let margins = self.margins();
        vec2(
            self.w * (margins.left + (1.0 - margins.left - margins.right) / 2.0),
            self.h * (margins.top + (1.0 - margins.top - margins.bottom) / 2.0),
        )
    }

    pub fn world_rect(&self) -> Rect {
        Rect::from_min_size(self.position(), self.size())
    }

    /// Whether a canvas-local screen point lands on the artwork itself,
    /// excluding the transparent margins.
    pub fn contains_point(&self, screen: Pos2, transform: Transform) -> bool {
        let world = transform.to_world(screen);
        let margins = self.margins();
        let origin = self.position();

        world.x >= origin.x + self.w * margins.left
            && world.x <= origin.x + self.w * (1.0 - margins.right)
            && world.y >= origin.y + self.h * margins.top
            && world.y <= origin.y + self.h * (1.0 - margins.bottom)
    }
}

/// Topmost box, in paint order, whose full rectangle covers the point.
pub fn hit_test(store: &ViewBoxStore, screen: Pos2, transform: Transform) -> Option<&ViewBox> {
    let world = transform.to_world(screen);
    store
        .values()
        .filter(|view| view.is_placed() && view.world_rect().contains(world))
        .max_by_key(|view| view.stack_order)
}
