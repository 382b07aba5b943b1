use tracing::{debug, info, warn};

use crate::env::{
    Database, EnvError, Environment, Notification, NotificationLevel, PendingCall, Reply,
};
use crate::util::service_url;

use super::scene::SceneBackend;
use super::ServiceModule;

pub const DESTROY_PROMPT: &str = "Are you sure you want to destroy the service? This cannot be undone.";

/// Confirmation dialog for destroying one service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DestroyDialog {
    pub service_id: String,
    pub open: bool,
    /// Cleared while the destroy call is outstanding so it is issued once.
    pub control_enabled: bool,
}

impl<S: SceneBackend> ServiceModule<S> {
    pub fn destroy_dialog(&self) -> Option<&DestroyDialog> {
        self.destroy_dialog.as_ref().filter(|dialog| dialog.open)
    }

    pub(super) fn destroy_confirm(&mut self, service_id: &str) {
        if self
            .destroy_dialog
            .as_ref()
            .is_some_and(|dialog| !dialog.control_enabled)
        {
            debug!(service_id, "destroy already in flight");
            return;
        }
        self.destroy_dialog = Some(DestroyDialog {
            service_id: service_id.to_owned(),
            open: true,
            control_enabled: true,
        });
    }

    pub fn cancel_destroy(&mut self) {
        if let Some(dialog) = &mut self.destroy_dialog {
            dialog.open = false;
        }
    }

    pub fn confirm_destroy(&mut self, env: &dyn Environment) {
        let Some(dialog) = self.destroy_dialog.as_mut().filter(|dialog| dialog.open) else {
            return;
        };
        if !dialog.control_enabled {
            return;
        }
        dialog.control_enabled = false;

        let service_id = dialog.service_id.clone();
        let reply = Reply::new(
            PendingCall::ServiceDestroyed {
                service_id: service_id.clone(),
            },
            self.reply_sender(),
        );
        info!(%service_id, "destroying service");
        self.calls_in_flight += 1;
        env.destroy_service(&service_id, reply);
    }

    pub(super) fn destroy_completed(
        &mut self,
        service_id: &str,
        result: Result<(), EnvError>,
        db: &mut Database,
    ) {
        match result {
            Ok(()) => {
                let relation_ids = db
                    .relations_for_service(service_id)
                    .into_iter()
                    .map(|relation| relation.id.clone())
                    .collect::<Vec<_>>();
                for relation_id in &relation_ids {
                    db.destroy_relation(relation_id);
                }
                db.destroy_service(service_id);
                db.fire_update();
                info!(service_id, relations = relation_ids.len(), "service destroyed");
            }
            Err(error) => {
                warn!(service_id, %error, "destroy failed");
                db.add_notification(Notification {
                    title: "Error destroying service".to_owned(),
                    message: format!("Service name: {service_id}"),
                    level: NotificationLevel::Error,
                    link: service_url(service_id),
                    model_id: service_id.to_owned(),
                });
            }
        }

        if let Some(dialog) = &mut self.destroy_dialog
            && dialog.service_id == service_id
        {
            dialog.open = false;
            dialog.control_enabled = true;
        }
    }
}
