use eframe::egui::{Pos2, Vec2};

/// Canvas pan/zoom; maps world coordinates to canvas-local screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub scale: f32,
    pub translate: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: Vec2::ZERO,
        }
    }
}

impl Transform {
    pub fn to_screen(self, world: Pos2) -> Pos2 {
        (world.to_vec2() * self.scale + self.translate).to_pos2()
    }

    pub fn to_world(self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.translate) / self.scale).to_pos2()
    }
}

/// Notifications for renderers that live outside the service module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TopologyEvent {
    ServiceMoved { service_id: String },
    ClearState,
    AddRelationDragStart { service_id: String },
    AddRelationDrag { service_id: String },
    AddRelationDragEnd,
    CancelRelationBuild,
    ShowCharmPanel,
    NavigateTo { url: String },
}

/// State shared by everything drawn on one canvas.
///
/// Only the gesture handlers and the click-action dispatcher write the
/// active service and relation flags.
#[derive(Debug)]
pub struct TopologyContext {
    transform: Transform,
    width: f32,
    height: f32,
    active_service: Option<String>,
    building_relation: bool,
    ignore_click: bool,
    events: Vec<TopologyEvent>,
}

impl TopologyContext {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            transform: Transform::default(),
            width,
            height,
            active_service: None,
            building_relation: false,
            ignore_click: false,
            events: Vec::new(),
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn active_service(&self) -> Option<&str> {
        self.active_service.as_deref()
    }

    pub fn building_relation(&self) -> bool {
        self.building_relation
    }

    pub fn ignore_click(&self) -> bool {
        self.ignore_click
    }

    pub(super) fn set_transform(&mut self, transform: Transform) -> bool {
        let changed = self.transform != transform;
        self.transform = transform;
        changed
    }

    pub(super) fn set_size(&mut self, width: f32, height: f32) -> bool {
        let changed = self.width != width || self.height != height;
        self.width = width;
        self.height = height;
        changed
    }

    pub(super) fn set_active_service(&mut self, service_id: Option<String>) {
        self.active_service = service_id;
    }

    pub(super) fn set_building_relation(&mut self, building: bool) {
        self.building_relation = building;
    }

    pub(super) fn set_ignore_click(&mut self, ignore: bool) {
        self.ignore_click = ignore;
    }

    /// Returns the flag and clears it.
    pub(super) fn take_ignore_click(&mut self) -> bool {
        std::mem::take(&mut self.ignore_click)
    }

    pub(super) fn emit(&mut self, event: TopologyEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<TopologyEvent> {
        std::mem::take(&mut self.events)
    }
}
