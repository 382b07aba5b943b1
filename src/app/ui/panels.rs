use std::collections::HashSet;

use eframe::egui::{self, Align, Context, Layout, Rect};
use tracing::{debug, info};

use crate::env::{Database, SimulatedEnvironment};
use crate::topology::{ServiceModule, TopologyEvent};
use crate::util::service_id_from_url;

use super::super::canvas::CanvasScene;
use super::super::{LaunchOptions, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(db: Database, options: &LaunchOptions) -> Self {
        let env = SimulatedEnvironment::new(options.latency, options.read_only);
        // The first reconciliation waits for the canvas so packing sees its
        // real size.
        let module = ServiceModule::new(
            options.config.clone(),
            CanvasScene::default(),
            egui::vec2(1280.0, 800.0),
        );

        Self {
            db,
            env,
            module,
            canvas_rect: Rect::NOTHING,
            search: String::new(),
            selected: None,
            location: None,
            charm_panel_open: false,
            relation_source: None,
            pending_serial: 0,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source_label: &str,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        let matches = self.search_matches();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("service-topology");
                    ui.separator();
                    ui.label(format!("environment: {source_label}"));
                    ui.label(format!("services: {}", self.db.services().len()));
                    ui.label(format!("relations: {}", self.db.relations().len()));
                    if self.env.is_read_only() {
                        ui.label(egui::RichText::new("read-only").strong());
                    }
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload environment"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Charms").clicked() {
                        self.charm_panel_open = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if self.module.calls_in_flight() > 0 {
                            ui.spinner();
                            ui.label(format!("{} pending", self.module.calls_in_flight()));
                        }
                        if let Some(location) = &self.location {
                            ui.monospace(location.as_str());
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| self.draw_controls(ui, &matches));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading environment...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_canvas(ui, &matches);
            }
        });

        self.draw_service_menu(ctx);
        self.draw_destroy_dialog(ctx);
        self.draw_charm_panel(ctx);
        self.sync_topology();
    }

    /// Deliver remote completions, reconcile model changes and react to
    /// what the topology reported.
    pub(in crate::app) fn sync_topology(&mut self) {
        self.module.poll_completions(&mut self.db);

        if self.db.has_changes() {
            let changes = self.db.take_changes();
            debug!(?changes, "model changed");
            self.module.update(&mut self.db);

            if let Some(selected) = &self.selected
                && self.db.service(selected).is_none()
            {
                self.selected = None;
            }
        }

        for event in self.module.take_events() {
            self.handle_topology_event(event);
        }
    }

    fn handle_topology_event(&mut self, event: TopologyEvent) {
        match event {
            TopologyEvent::ServiceMoved { .. } | TopologyEvent::AddRelationDrag { .. } => {}
            TopologyEvent::ClearState => {
                self.charm_panel_open = false;
            }
            TopologyEvent::AddRelationDragStart { service_id } => {
                info!(%service_id, "building relation");
                self.relation_source = Some(service_id);
            }
            TopologyEvent::AddRelationDragEnd | TopologyEvent::CancelRelationBuild => {
                self.relation_source = None;
            }
            TopologyEvent::ShowCharmPanel => {
                self.charm_panel_open = true;
            }
            TopologyEvent::NavigateTo { url } => {
                info!(%url, "navigate");
                self.selected = service_id_from_url(&url).map(str::to_owned);
                self.location = Some(url);
            }
        }
    }

    pub(in crate::app) fn search_matches(&self) -> HashSet<String> {
        super::controls::matching_services(&self.db, &self.search)
    }
}
