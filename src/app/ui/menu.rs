use eframe::egui::{self, Color32, Context, Id, LayerId, Order, RichText, Shape, Stroke, pos2, vec2};

use crate::topology::{ArrowDirection, ClickAction, MENU_ARROW_OFFSET};

use super::super::ViewModel;

const ARROW_DEPTH: f32 = 10.0;
const ARROW_HALF_HEIGHT: f32 = 8.0;

impl ViewModel {
    pub(in crate::app) fn draw_service_menu(&mut self, ctx: &Context) {
        let Some(placement) = self.module.menu().placement else {
            return;
        };
        let Some(service_id) = self.module.context().active_service().map(str::to_owned) else {
            return;
        };
        let destroy_disabled = self.module.menu().destroy_disabled;

        // Keep clear of the arrow on whichever side it is drawn.
        let nudge = match placement.arrow {
            ArrowDirection::Left => ARROW_DEPTH,
            ArrowDirection::Right => -ARROW_DEPTH,
        };
        let origin = self.canvas_rect.min + vec2(placement.left + nudge, placement.top);

        let mut chosen = None;
        let area = egui::Area::new(Id::new("service_menu"))
            .order(Order::Foreground)
            .fixed_pos(origin)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_min_width(170.0);
                    ui.label(RichText::new(service_id.as_str()).strong());
                    ui.separator();
                    if ui.button("View details").clicked() {
                        chosen = Some(ClickAction::ViewDetails);
                    }
                    let destroy = ui
                        .add_enabled(!destroy_disabled, egui::Button::new("Destroy"))
                        .on_disabled_hover_text("This service cannot be destroyed from the canvas.");
                    if destroy.clicked() {
                        chosen = Some(ClickAction::DestroyConfirm);
                    }
                });
            });

        let menu_rect = area.response.rect;
        let tip_y = origin.y + MENU_ARROW_OFFSET;
        let (base_x, tip_x) = match placement.arrow {
            ArrowDirection::Left => (menu_rect.left(), menu_rect.left() - ARROW_DEPTH),
            ArrowDirection::Right => (menu_rect.right(), menu_rect.right() + ARROW_DEPTH),
        };
        ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("service_menu_arrow")))
            .add(Shape::convex_polygon(
                vec![
                    pos2(tip_x, tip_y),
                    pos2(base_x, tip_y - ARROW_HALF_HEIGHT),
                    pos2(base_x, tip_y + ARROW_HALF_HEIGHT),
                ],
                ctx.style().visuals.window_fill,
                Stroke::new(1.0, Color32::from_gray(90)),
            ));

        self.module.set_menu_width(menu_rect.width() + ARROW_DEPTH);

        if let Some(action) = chosen {
            self.module.menu_action(action, &self.db);
        }
    }
}
