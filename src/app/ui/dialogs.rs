use std::collections::BTreeSet;

use eframe::egui::{self, Align2, Context, RichText};
use tracing::info;

use crate::env::Service;
use crate::topology::DESTROY_PROMPT;
use crate::util::charm_name;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_destroy_dialog(&mut self, ctx: &Context) {
        let Some(dialog) = self.module.destroy_dialog().cloned() else {
            return;
        };

        let mut confirm = false;
        let mut cancel = false;
        egui::Window::new("Destroy service")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(DESTROY_PROMPT);
                ui.label(RichText::new(dialog.service_id.as_str()).strong());
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    let destroy = ui.add_enabled(
                        dialog.control_enabled,
                        egui::Button::new("Destroy service"),
                    );
                    confirm = destroy.clicked();
                    if !dialog.control_enabled {
                        ui.spinner();
                    }
                    cancel = ui.button("Cancel").clicked();
                });
            });

        if confirm {
            self.module.confirm_destroy(&self.env);
        }
        if cancel {
            self.module.cancel_destroy();
        }
    }

    pub(in crate::app) fn draw_charm_panel(&mut self, ctx: &Context) {
        if !self.charm_panel_open {
            return;
        }

        let charms = self
            .db
            .services()
            .iter()
            .map(|service| service.charm.clone())
            .collect::<BTreeSet<_>>();

        let mut open = true;
        let mut deploy = None;
        egui::Window::new("Charms")
            .open(&mut open)
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.label("Add a charm as a pending service; it can be placed before the environment confirms it.");
                ui.separator();
                for charm in &charms {
                    ui.horizontal(|ui| {
                        ui.label(charm_name(charm)).on_hover_text(charm.as_str());
                        if ui.small_button("Add").clicked() {
                            deploy = Some(charm.clone());
                        }
                    });
                }
            });
        self.charm_panel_open = open;

        if let Some(charm) = deploy {
            self.add_pending_service(&charm);
        }
    }

    pub(in crate::app) fn add_pending_service(&mut self, charm: &str) {
        let service_id = loop {
            self.pending_serial += 1;
            let candidate = format!("{}-{}", charm_name(charm), self.pending_serial);
            if self.db.service(&candidate).is_none() {
                break candidate;
            }
        };

        info!(%service_id, charm, "pending service added");
        let mut service = Service::new(service_id, charm);
        service.pending = true;
        self.db.add_service(service);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::env::demo_database;
    use crate::topology::TopologyConfig;

    use super::super::super::LaunchOptions;
    use super::*;

    #[test]
    fn pending_services_get_fresh_ids_and_enter_the_topology() {
        let options = LaunchOptions {
            fixture: None,
            config: TopologyConfig::default(),
            latency: Duration::ZERO,
            read_only: false,
        };
        let mut model = ViewModel::new(demo_database().expect("demo environment"), &options);
        model.sync_topology();

        model.add_pending_service("cs:precise/mysql-26");
        model.add_pending_service("cs:precise/mysql-26");
        model.sync_topology();

        for id in ["mysql-1", "mysql-2"] {
            let view = model.module.view_box(id).expect("pending box");
            assert!(view.pending);
            assert!(view.is_placed());
        }
    }
}
