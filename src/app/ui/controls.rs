use std::collections::HashSet;

use eframe::egui::{self, RichText, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::env::Database;
use crate::topology::ClickAction;
use crate::util::humanize_number;

use super::super::ViewModel;

const CLICK_ACTIONS: [ClickAction; 4] = [
    ClickAction::ToggleMenu,
    ClickAction::ViewDetails,
    ClickAction::DestroyConfirm,
    ClickAction::HideMenu,
];

fn click_action_label(action: ClickAction) -> &'static str {
    match action {
        ClickAction::ToggleMenu => "Toggle menu",
        ClickAction::ViewDetails => "View details",
        ClickAction::DestroyConfirm => "Destroy (confirm)",
        ClickAction::HideMenu => "Hide menu",
    }
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Services whose id or charm name fuzzily matches `query`; empty for a
/// blank query.
pub(in crate::app) fn matching_services(db: &Database, query: &str) -> HashSet<String> {
    let query = query.trim();
    if query.is_empty() {
        return HashSet::new();
    }

    let matcher = SkimMatcherV2::default();
    db.services()
        .iter()
        .filter(|service| {
            fuzzy_match_score(&matcher, &service.id, query).is_some()
                || fuzzy_match_score(&matcher, service.charm_name(), query).is_some()
        })
        .map(|service| service.id.clone())
        .collect()
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui, matches: &HashSet<String>) {
        ui.heading("Services");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search").on_hover_text("Fuzzy-highlight services by name or charm.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();

        let searching = !self.search.trim().is_empty();
        let mut clicked = None;
        egui::ScrollArea::vertical()
            .id_salt("service_list_scroll")
            .max_height(360.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for service in self.db.services() {
                    if searching && !matches.contains(&service.id) {
                        continue;
                    }

                    let mut label = format!(
                        "{}  ({} units)",
                        service.id,
                        humanize_number(service.unit_count())
                    );
                    if service.pending {
                        label.push_str("  [pending]");
                    }
                    let text = if service.has_unit_errors() {
                        RichText::new(label).color(egui::Color32::from_rgb(226, 104, 94))
                    } else {
                        RichText::new(label)
                    };

                    let is_selected = self.selected.as_deref() == Some(service.id.as_str());
                    if ui
                        .selectable_label(is_selected, text)
                        .on_hover_text(service.charm.as_str())
                        .clicked()
                    {
                        clicked = Some(service.id.clone());
                    }
                }
            });
        if let Some(service_id) = clicked {
            self.selected = Some(service_id);
        }

        ui.separator();

        let mut action = self.module.config().click_action;
        ui.label("Click on a service")
            .on_hover_text("What a plain click on a service node does.");
        egui::ComboBox::from_id_salt("click_action")
            .selected_text(click_action_label(action))
            .show_ui(ui, |ui| {
                for candidate in CLICK_ACTIONS {
                    ui.selectable_value(&mut action, candidate, click_action_label(candidate));
                }
            });
        if action != self.module.config().click_action {
            self.module.set_click_action(action);
        }

        ui.separator();

        let transform = self.module.context().transform();
        ui.label(format!("Zoom: {:.0}%", transform.scale * 100.0));
        ui.label(format!(
            "Long press: {} ms",
            self.module.config().long_press_delay.as_millis()
        ));
        if self.module.context().building_relation() {
            ui.label(RichText::new("Building relation...").strong());
        }
        ui.small("Long-press a service to start a relation. Drag the canvas to pan, scroll to zoom.");
    }
}
