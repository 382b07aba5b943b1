use eframe::egui::{self, Color32, RichText, Ui};

use crate::env::NotificationLevel;
use crate::topology::relation_rows;
use crate::util::{humanize_number, service_id_from_url};

use super::super::render_utils::status_color;
use super::super::ViewModel;

const ERROR_TEXT: Color32 = Color32::from_rgb(226, 104, 94);

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Service Details");
        ui.add_space(6.0);

        egui::ScrollArea::vertical()
            .id_salt("details_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                self.draw_selected_service(ui);
                ui.separator();
                self.draw_notifications(ui);
            });
    }

    fn draw_selected_service(&mut self, ui: &mut Ui) {
        let Some(selected_id) = self.selected.clone() else {
            ui.label("Double-click a service, or pick View details from its menu.");
            return;
        };
        let Some(service) = self.db.service(&selected_id) else {
            ui.label("Selected service no longer exists in the environment.");
            return;
        };

        ui.label(RichText::new(service.id.as_str()).strong());
        ui.small(service.charm.as_str());
        ui.add_space(6.0);

        ui.label(format!("Units: {}", humanize_number(service.unit_count())));
        ui.label(format!("Exposed: {}", if service.exposed { "yes" } else { "no" }));
        if service.subordinate {
            ui.label("Subordinate");
        }
        if service.pending {
            ui.label("Pending deployment");
        }

        ui.horizontal_wrapped(|ui| {
            for (status, count) in service.aggregated_status() {
                ui.label(
                    RichText::new(format!("{} {}", humanize_number(count), status.label()))
                        .color(status_color(status)),
                );
            }
        });

        ui.separator();
        ui.label(RichText::new("Relations").strong());
        let rows = relation_rows(&self.db, &selected_id);
        if rows.is_empty() {
            ui.label("No relations.");
        }
        for row in &rows {
            let text = format!(
                "{}  {}  ({} / {}, {})",
                row.label, row.interface, row.name, row.role, row.scope
            );
            let text = if row.errored {
                RichText::new(text).color(ERROR_TEXT)
            } else {
                RichText::new(text)
            };
            ui.label(text).on_hover_text(row.relation_id.as_str());
            for unit in &row.errored_units {
                ui.small(RichText::new(format!("    {unit}: relation hook failed")).color(ERROR_TEXT));
            }
        }

        ui.separator();
        ui.label(RichText::new("Units").strong());
        for unit in &service.units {
            let mut line = format!("{}  {}", unit.id, unit.agent_state);
            if let Some(hook) = &unit.agent_state_hook {
                line.push_str(&format!("  ({hook})"));
            }
            ui.label(RichText::new(line).color(status_color(unit.status())));
        }
    }

    fn draw_notifications(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Notifications").strong());
        if self.db.notifications().is_empty() {
            ui.label("Nothing to report.");
            return;
        }

        let mut dismissed = None;
        let mut follow = None;
        for (index, notification) in self.db.notifications().iter().enumerate() {
            let color = match notification.level {
                NotificationLevel::Error => ERROR_TEXT,
                NotificationLevel::Info => ui.visuals().text_color(),
            };
            ui.label(RichText::new(notification.title.as_str()).color(color).strong());
            ui.label(notification.message.as_str());
            ui.horizontal(|ui| {
                if ui.link(notification.link.as_str()).clicked() {
                    follow = Some(notification.link.clone());
                }
                if ui.small_button("Dismiss").clicked() {
                    dismissed = Some(index);
                }
            });
            ui.add_space(4.0);
        }

        if let Some(url) = follow {
            self.selected = service_id_from_url(&url).map(str::to_owned);
            self.location = Some(url);
        }
        if let Some(index) = dismissed {
            self.db.dismiss_notification(index);
        }
    }
}
