use std::collections::HashSet;
use std::time::{Duration, Instant};

use eframe::egui::{
    self, Align2, Color32, CornerRadius, FontId, Pos2, Rect, Sense, Shape, Stroke, StrokeKind, Ui,
    vec2,
};

use crate::env::Database;
use crate::topology::ServiceModule;
use crate::util::humanize_number;

use super::super::render_utils::{blend_color, draw_background, pie_shapes, world_to_screen};
use super::super::ViewModel;
use super::scene::{CanvasNode, CanvasScene};

const NODE_FILL: Color32 = Color32::from_rgb(232, 232, 226);
const SUBORDINATE_FILL: Color32 = Color32::from_rgb(208, 214, 224);
const ACTIVE_STROKE: Color32 = Color32::from_rgb(245, 206, 93);
const MATCH_STROKE: Color32 = Color32::from_rgb(103, 196, 255);

/// Screen-space centre of a service's artwork.
fn node_center(module: &ServiceModule<CanvasScene>, rect: Rect, service_id: &str) -> Option<Pos2> {
    let view = module.view_box(service_id)?;
    let transform = module.context().transform();
    Some(world_to_screen(
        rect,
        transform,
        view.position() + view.relative_center(),
    ))
}

impl ViewModel {
    pub(in crate::app) fn draw_canvas(&mut self, ui: &mut Ui, matches: &HashSet<String>) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.canvas_rect = rect;
        self.module.set_canvas_size(rect.size());

        self.handle_canvas_zoom(ui, rect, &response);
        self.handle_canvas_pan(&response);
        for event in Self::pointer_events(ui, rect, &response) {
            self.module.handle_pointer(event, &mut self.db, &self.env);
        }
        self.module.tick(Instant::now(), &mut self.db, &self.env);
        self.sync_topology();

        let painter = ui.painter_at(rect);
        let transform = self.module.context().transform();
        draw_background(&painter, rect, transform);

        self.draw_relations(&painter, rect);
        self.draw_relation_preview(ui, &painter, rect);

        let active = self.module.context().active_service().map(str::to_owned);
        let mut hovered = None;
        let pointer = ui.input(|input| input.pointer.hover_pos());
        for node in self.module.scene().nodes() {
            let Some(metrics) = node.metrics else {
                continue;
            };
            let origin = world_to_screen(rect, transform, node.position);
            let z = transform.scale;

            let artwork = artwork_rect(node, origin, z);
            if !rect.intersects(artwork) {
                continue;
            }

            let is_active = active.as_deref() == Some(node.service_id.as_str());
            let is_selected = self.selected.as_deref() == Some(node.service_id.as_str());
            let is_match = matches.contains(&node.service_id);
            draw_node(&painter, node, origin, z, is_active || is_selected, is_match);

            let pie_center = origin + metrics.relative_center * z;
            let pie_radius = metrics.health_radius * z;
            if pointer.is_some_and(|pointer| pointer.distance(pie_center) <= pie_radius) {
                hovered = Some(node.service_id.clone());
            }
        }

        if let Some(service_id) = &hovered
            && let Some(node) = self.module.scene().node(service_id)
        {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "{}  |  {}  |  {} units",
                    node.service_id,
                    node.charm,
                    humanize_number(node.unit_count)
                ),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        self.schedule_repaint(ui, &response);
    }

    fn draw_relations(&self, painter: &egui::Painter, rect: Rect) {
        for relation in self.db.relations() {
            let [near, far] = relation.endpoints.as_slice() else {
                continue;
            };
            let (Some(start), Some(end)) = (
                node_center(&self.module, rect, &near.service),
                node_center(&self.module, rect, &far.service),
            ) else {
                continue;
            };

            let errored = relation_has_errors(&self.db, &near.service, &far.service);
            let color = if errored {
                Color32::from_rgb(214, 74, 64)
            } else {
                Color32::from_rgb(124, 134, 148)
            };
            let stroke = Stroke::new(2.0, color);

            if relation.scope == "container" {
                painter.extend(Shape::dashed_line(&[start, end], stroke, 8.0, 5.0));
            } else {
                painter.line_segment([start, end], stroke);
            }
        }
    }

    fn draw_relation_preview(&self, ui: &Ui, painter: &egui::Painter, rect: Rect) {
        let Some(source) = &self.relation_source else {
            return;
        };
        let (Some(start), Some(pointer)) = (
            node_center(&self.module, rect, source),
            ui.input(|input| input.pointer.hover_pos()),
        ) else {
            return;
        };
        painter.extend(Shape::dashed_line(
            &[start, pointer],
            Stroke::new(2.0, ACTIVE_STROKE),
            6.0,
            4.0,
        ));
    }

    fn schedule_repaint(&self, ui: &Ui, response: &egui::Response) {
        let ctx = ui.ctx();
        if response.dragged() {
            ctx.request_repaint();
        }
        if self.module.calls_in_flight() > 0 {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
        if let Some(deadline) = self.module.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(Instant::now()));
        }
    }
}

fn relation_has_errors(db: &Database, near: &str, far: &str) -> bool {
    [near, far]
        .into_iter()
        .filter_map(|id| db.service(id))
        .any(|service| service.has_unit_errors())
}

/// Drawn artwork without its transparent margins.
fn artwork_rect(node: &CanvasNode, origin: Pos2, z: f32) -> Rect {
    let Some(metrics) = node.metrics else {
        return Rect::from_min_size(origin, vec2(0.0, 0.0));
    };
    let size = metrics.size;
    let margins = node.margins;
    Rect::from_min_max(
        origin + vec2(size.x * margins.left, size.y * margins.top) * z,
        origin + vec2(size.x * (1.0 - margins.right), size.y * (1.0 - margins.bottom)) * z,
    )
}

fn draw_node(
    painter: &egui::Painter,
    node: &CanvasNode,
    origin: Pos2,
    z: f32,
    highlighted: bool,
    search_match: bool,
) {
    let Some(metrics) = node.metrics else {
        return;
    };
    let artwork = artwork_rect(node, origin, z);

    let mut fill = if node.subordinate {
        SUBORDINATE_FILL
    } else {
        NODE_FILL
    };
    if node.pending {
        fill = blend_color(fill, Color32::TRANSPARENT, 0.45);
    }
    let stroke = if highlighted {
        Stroke::new(3.0, ACTIVE_STROKE)
    } else if search_match {
        Stroke::new(2.5, MATCH_STROKE)
    } else {
        Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190))
    };
    let corner = CornerRadius::same((12.0 * z).clamp(2.0, 40.0) as u8);
    painter.rect_filled(artwork, corner, fill);
    painter.rect_stroke(artwork, corner, stroke, StrokeKind::Inside);

    painter.text(
        origin + metrics.name_anchor * z,
        Align2::CENTER_CENTER,
        node.service_id.as_str(),
        FontId::proportional((metrics.name_font * z).max(6.0)),
        Color32::from_gray(30),
    );
    painter.text(
        origin + metrics.charm_anchor * z,
        Align2::CENTER_CENTER,
        node.charm.as_str(),
        FontId::proportional((metrics.charm_font * z).max(5.0)),
        Color32::from_gray(90),
    );

    let pie_center = origin + metrics.relative_center * z;
    let pie_radius = metrics.health_radius * z;
    painter.circle_filled(pie_center, pie_radius + 2.0 * z, Color32::from_gray(250));
    painter.extend(pie_shapes(pie_center, pie_radius, &node.status));

    if let Some(badge) = metrics.exposed_badge {
        let badge = Rect::from_min_size(origin + badge.min.to_vec2() * z, badge.size() * z);
        painter.circle_filled(badge.center(), badge.width() / 2.0, Color32::from_rgb(72, 138, 214));
        painter.text(
            badge.center(),
            Align2::CENTER_CENTER,
            "E",
            FontId::proportional((badge.width() * 0.6).max(5.0)),
            Color32::WHITE,
        );
    }

    if let Some(anchor) = metrics.sub_relation_anchor {
        let block = Rect::from_min_size(origin + anchor * z, vec2(18.0, 18.0) * z);
        painter.rect_filled(block, CornerRadius::same(3), Color32::from_rgb(124, 134, 148));
    }
}
