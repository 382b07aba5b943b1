use std::time::Instant;

use eframe::egui::{self, Pos2, Rect, Ui};

use crate::topology::{PointerEvent, Transform};

use super::super::ViewModel;

const MIN_SCALE: f32 = 0.25;
const MAX_SCALE: f32 = 2.5;

impl ViewModel {
    pub(in crate::app) fn handle_canvas_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let local = (pointer - rect.min).to_pos2();
        let transform = self.module.context().transform();
        let world_before = transform.to_world(local);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        let scale = (transform.scale * zoom_factor).clamp(MIN_SCALE, MAX_SCALE);
        self.module.set_transform(Transform {
            scale,
            translate: local.to_vec2() - world_before.to_vec2() * scale,
        });
    }

    pub(in crate::app) fn handle_canvas_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            let mut transform = self.module.context().transform();
            transform.translate += response.drag_delta();
            self.module.set_transform(transform);
        }
    }

    /// Primary-button input translated to canvas-local pointer events.
    ///
    /// Presses count only when the canvas itself is hovered; moves and
    /// releases are always forwarded so a drag can leave the canvas.
    pub(in crate::app) fn pointer_events(
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) -> Vec<PointerEvent> {
        let at = Instant::now();
        let local = |pos: Pos2| (pos - rect.min).to_pos2();
        let canvas_hovered = response.hovered();

        let mut events = ui.input(|input| {
            input
                .events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::PointerButton {
                        pos,
                        button: egui::PointerButton::Primary,
                        pressed: true,
                        ..
                    } if canvas_hovered && rect.contains(*pos) => Some(PointerEvent::Down {
                        pos: local(*pos),
                        at,
                    }),
                    egui::Event::PointerButton {
                        pos,
                        button: egui::PointerButton::Primary,
                        pressed: false,
                        ..
                    } => Some(PointerEvent::Up {
                        pos: local(*pos),
                        at,
                    }),
                    egui::Event::PointerMoved(pos) => Some(PointerEvent::Move {
                        pos: local(*pos),
                        at,
                    }),
                    _ => None,
                })
                .collect::<Vec<_>>()
        });

        if response.double_clicked()
            && let Some(pos) = response.interact_pointer_pos()
        {
            events.push(PointerEvent::DoubleClick { pos: local(pos) });
        }

        events
    }
}
