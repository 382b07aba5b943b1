use tracing::debug;

use crate::env::Database;
use crate::util::service_url;

use super::context::TopologyEvent;
use super::menu::{MenuPlacement, place_menu};
use super::scene::SceneBackend;
use super::ServiceModule;

/// Everything a click on a service, or an entry of its menu, can do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ClickAction {
    #[default]
    ToggleMenu,
    ViewDetails,
    DestroyConfirm,
    HideMenu,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServiceMenu {
    pub destroy_disabled: bool,
    pub placement: Option<MenuPlacement>,
    /// Last measured on-screen width, used to place the menu left of a node.
    pub width: f32,
}

impl Default for ServiceMenu {
    fn default() -> Self {
        Self {
            destroy_disabled: false,
            placement: None,
            width: 220.0,
        }
    }
}

impl<S: SceneBackend> ServiceModule<S> {
    pub fn menu(&self) -> &ServiceMenu {
        &self.menu
    }

    pub fn dispatch(&mut self, action: ClickAction, service_id: Option<&str>, db: &Database) {
        debug!(?action, service_id, "click action");

        match action {
            ClickAction::ToggleMenu => match service_id {
                Some(id) if self.context.active_service() != Some(id) => self.show_menu(id, db),
                _ => self.hide_menu(),
            },
            ClickAction::ViewDetails => {
                self.hide_menu();
                if let Some(id) = service_id {
                    self.view_details(id);
                }
            }
            ClickAction::DestroyConfirm => {
                self.hide_menu();
                if let Some(id) = service_id {
                    self.destroy_confirm(id);
                }
            }
            ClickAction::HideMenu => self.hide_menu(),
        }
    }

    /// An entry of the open menu was chosen; it acts on the active service.
    pub fn menu_action(&mut self, action: ClickAction, db: &Database) {
        let Some(active) = self.context.active_service().map(str::to_owned) else {
            return;
        };
        if action == ClickAction::DestroyConfirm && self.menu.destroy_disabled {
            debug!(service_id = %active, "destroy is disabled for this service");
            return;
        }
        self.dispatch(action, Some(&active), db);
    }

    pub fn set_menu_width(&mut self, width: f32) {
        if (self.menu.width - width).abs() > 0.5 {
            self.menu.width = width;
            self.update_menu_location();
        }
    }

    fn show_menu(&mut self, service_id: &str, db: &Database) {
        if !self.store.contains_key(service_id) {
            return;
        }
        self.hide_menu();

        self.context.set_active_service(Some(service_id.to_owned()));
        self.menu.destroy_disabled = db
            .service(service_id)
            .is_some_and(|service| service.charm_name() == self.config.protected_charm);
        self.update_menu_location();
    }

    pub(super) fn hide_menu(&mut self) {
        if self.context.active_service().is_none() {
            return;
        }
        self.context.set_active_service(None);
        self.menu.destroy_disabled = false;
        self.menu.placement = None;
    }

    pub(super) fn update_menu_location(&mut self) {
        self.menu.placement = self
            .context
            .active_service()
            .and_then(|id| self.store.get(id))
            .map(|view| {
                place_menu(
                    view,
                    self.context.transform(),
                    self.context.width(),
                    self.menu.width,
                )
            });
    }

    pub(super) fn view_details(&mut self, service_id: &str) {
        self.context.emit(TopologyEvent::NavigateTo {
            url: service_url(service_id),
        });
    }
}
