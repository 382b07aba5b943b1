//! Service nodes on the topology canvas: keeps one [`ViewBox`] per
//! service in the database, turns pointer input into menu, drag and
//! relation gestures, and drives the destroy workflow.

mod actions;
mod config;
mod context;
mod destroy;
mod gesture;
mod interaction;
mod menu;
mod pack;
mod reconcile;
mod relations;
mod scale;
mod scene;
mod viewbox;

#[cfg(test)]
mod testing;

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use eframe::egui::Vec2;
use tracing::debug;

use crate::env::{Completion, Database, PendingCall};

pub use actions::{ClickAction, ServiceMenu};
pub use config::TopologyConfig;
pub use context::{TopologyContext, TopologyEvent, Transform};
pub use destroy::{DESTROY_PROMPT, DestroyDialog};
pub use gesture::PointerEvent;
pub use interaction::DragMotion;
pub use menu::{ArrowDirection, MENU_ARROW_OFFSET, MenuPlacement, MenuSide};
pub use reconcile::{AnnotationSyncPolicy, Delta};
pub use relations::{RelationRow, relation_rows};
pub use scale::NodeMetrics;
pub use scene::SceneBackend;
pub use viewbox::{DragPhase, Margins, ViewBox, ViewBoxStore};

use gesture::{GestureMachine, GestureTuning};
use scale::ServiceScale;

pub struct ServiceModule<S: SceneBackend> {
    config: TopologyConfig,
    scale: ServiceScale,
    store: ViewBoxStore,
    scene: S,
    handles: HashMap<String, S::Handle>,
    context: TopologyContext,
    gestures: GestureMachine,
    menu: ServiceMenu,
    destroy_dialog: Option<DestroyDialog>,
    completions_tx: Sender<Completion>,
    completions_rx: Receiver<Completion>,
    calls_in_flight: usize,
    next_stack_order: u64,
}

impl<S: SceneBackend> ServiceModule<S> {
    pub fn new(config: TopologyConfig, scene: S, canvas: Vec2) -> Self {
        let gestures = GestureMachine::new(GestureTuning {
            long_press_delay: config.long_press_delay,
            long_press_tolerance: config.long_press_tolerance,
            drag_threshold: config.drag_threshold,
        });
        let (completions_tx, completions_rx) = mpsc::channel();

        Self {
            config,
            scale: ServiceScale::default(),
            store: ViewBoxStore::new(),
            scene,
            handles: HashMap::new(),
            context: TopologyContext::new(canvas.x, canvas.y),
            gestures,
            menu: ServiceMenu::default(),
            destroy_dialog: None,
            completions_tx,
            completions_rx,
            calls_in_flight: 0,
            next_stack_order: 0,
        }
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    pub fn store(&self) -> &ViewBoxStore {
        &self.store
    }

    pub fn view_box(&self, service_id: &str) -> Option<&ViewBox> {
        self.store.get(service_id)
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn context(&self) -> &TopologyContext {
        &self.context
    }

    pub fn take_events(&mut self) -> Vec<TopologyEvent> {
        self.context.take_events()
    }

    pub fn set_click_action(&mut self, action: ClickAction) {
        self.config.click_action = action;
    }

    /// Pan/zoom changed: the menu follows the node on screen.
    pub fn set_transform(&mut self, transform: Transform) {
        if self.context.set_transform(transform) {
            self.update_menu_location();
        }
    }

    pub fn set_canvas_size(&mut self, size: Vec2) {
        if self.context.set_size(size.x, size.y) {
            self.update_menu_location();
        }
    }

    pub fn calls_in_flight(&self) -> usize {
        self.calls_in_flight
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.gestures.next_deadline()
    }

    pub(crate) fn reply_sender(&self) -> Sender<Completion> {
        self.completions_tx.clone()
    }

    /// Route finished remote calls back to the drag or destroy that issued
    /// them.
    pub fn poll_completions(&mut self, db: &mut Database) {
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.calls_in_flight = self.calls_in_flight.saturating_sub(1);
            debug!(call = ?completion.call, ok = completion.result.is_ok(), "remote call completed");

            match completion.call {
                PendingCall::AnnotationsUpdated {
                    service_id,
                    drag_generation,
                } => self.settle_drag(&service_id, drag_generation, completion.result),
                PendingCall::ServiceDestroyed { service_id } => {
                    self.destroy_completed(&service_id, completion.result, db)
                }
            }
        }
    }
}
