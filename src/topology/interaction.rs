use std::time::Instant;

use eframe::egui::{Pos2, Vec2};
use serde_json::Value;
use tracing::{debug, warn};

use crate::env::{
    ANNOTATION_X, ANNOTATION_Y, Annotations, Database, EnvError, Environment, PendingCall, Reply,
};

use super::context::TopologyEvent;
use super::gesture::{Gesture, HitTarget, PointerEvent};
use super::scene::SceneBackend;
use super::viewbox::{DragPhase, hit_test};
use super::ServiceModule;

/// How a node moves: pointer deltas are already in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DragMotion {
    Delta(Vec2),
    To(Pos2),
}

impl<S: SceneBackend> ServiceModule<S> {
    /// Feed one canvas-local pointer event through the gesture machine.
    pub fn handle_pointer(&mut self, event: PointerEvent, db: &mut Database, env: &dyn Environment) {
        let transform = self.context.transform();
        let store = &self.store;
        let gestures = self.gestures.handle(event, |pos| {
            hit_test(store, pos, transform).map(|view| HitTarget {
                service_id: view.id.clone(),
                pending: view.pending,
            })
        });

        for gesture in gestures {
            self.apply_gesture(gesture, db, env);
        }
    }

    /// Fire scheduled gesture transitions that are due.
    pub fn tick(&mut self, now: Instant, db: &mut Database, env: &dyn Environment) {
        for gesture in self.gestures.tick(now) {
            self.apply_gesture(gesture, db, env);
        }
    }

    fn apply_gesture(&mut self, gesture: Gesture, db: &mut Database, env: &dyn Environment) {
        match gesture {
            Gesture::Press { .. } => self.context.set_ignore_click(false),
            Gesture::Click {
                service_id: Some(service_id),
                pos,
            } => self.service_click(&service_id, pos, db),
            Gesture::Click {
                service_id: None, ..
            } => self.canvas_click(),
            Gesture::DoubleClick { service_id } => self.service_double_click(&service_id),
            Gesture::DragStart { service_id } => self.drag_start(&service_id),
            Gesture::Drag { service_id, delta } => {
                let scale = self.context.transform().scale;
                self.drag(&service_id, DragMotion::Delta(delta / scale));
            }
            Gesture::DragEnd { service_id } => self.drag_end(&service_id, db, env),
            Gesture::Pan { delta } => {
                let mut transform = self.context.transform();
                transform.translate += delta;
                self.set_transform(transform);
            }
            Gesture::RelationBuildStart { service_id } => self.relation_build_start(&service_id),
        }
    }

    pub(super) fn service_click(&mut self, service_id: &str, pos: Pos2, db: &Database) {
        let transform = self.context.transform();
        let Some(view) = self.store.get(service_id) else {
            return;
        };
        // Transparent margins of the artwork do not count.
        if !view.contains_point(pos, transform) {
            return;
        }

        if view.pending {
            self.clear_state();
            self.context.emit(TopologyEvent::ShowCharmPanel);
            return;
        }

        if self.context.take_ignore_click() {
            debug!(service_id, "click after drag suppressed");
            return;
        }

        self.dispatch(self.config.click_action, Some(service_id), db);
    }

    pub(super) fn service_double_click(&mut self, service_id: &str) {
        if self.store.get(service_id).is_none_or(|view| view.pending) {
            return;
        }
        self.hide_menu();
        self.view_details(service_id);
    }

    pub(super) fn canvas_click(&mut self) {
        self.clear_state();
    }

    /// Close the menu and abandon any long press or relation build.
    pub fn clear_state(&mut self) {
        self.hide_menu();
        self.gestures.cancel_long_press();
        if self.context.building_relation() {
            self.context.set_building_relation(false);
            self.context.emit(TopologyEvent::CancelRelationBuild);
        }
        self.context.emit(TopologyEvent::ClearState);
    }

    pub(super) fn relation_build_start(&mut self, service_id: &str) {
        if self.context.building_relation() || !self.store.contains_key(service_id) {
            return;
        }
        self.context.set_building_relation(true);
        self.context.emit(TopologyEvent::AddRelationDragStart {
            service_id: service_id.to_owned(),
        });
    }

    pub(super) fn drag_start(&mut self, service_id: &str) {
        if self.context.building_relation() {
            return;
        }
        let Some(view) = self.store.get_mut(service_id) else {
            return;
        };
        view.drag_origin = Some(view.position());
        view.drag_phase = DragPhase::Started;
        view.drag_generation += 1;
    }

    pub(super) fn drag(&mut self, service_id: &str, motion: DragMotion) {
        if self.context.building_relation() {
            self.context.emit(TopologyEvent::AddRelationDrag {
                service_id: service_id.to_owned(),
            });
            return;
        }
        if matches!(motion, DragMotion::Delta(_)) {
            self.gestures.cancel_long_press();
        }

        let Some(view) = self.store.get_mut(service_id) else {
            return;
        };
        let position = match motion {
            DragMotion::Delta(delta) => view.position() + delta,
            DragMotion::To(position) => position,
        };
        view.set_position(position);

        let first_move = view.drag_phase == DragPhase::Started;
        if first_move {
            view.drag_phase = DragPhase::Active;
        }

        if let Some(&handle) = self.handles.get(service_id) {
            self.scene.move_node(handle, position);
        }
        if first_move {
            self.hide_menu();
        }
        if self.context.active_service() == Some(service_id) {
            self.update_menu_location();
        }
        self.context.emit(TopologyEvent::ServiceMoved {
            service_id: service_id.to_owned(),
        });
    }

    pub(super) fn drag_end(&mut self, service_id: &str, db: &mut Database, env: &dyn Environment) {
        if self.context.building_relation() {
            self.context.set_ignore_click(true);
            self.context.set_building_relation(false);
            self.context.emit(TopologyEvent::AddRelationDragEnd);
            return;
        }

        let Some(view) = self.store.get_mut(service_id) else {
            return;
        };
        if view.drag_phase == DragPhase::None {
            return;
        }
        // Only a gesture that went through `drag_start` has an origin; a
        // plain click on a node still awaiting its last write has none.
        let Some(origin) = view.drag_origin.take() else {
            return;
        };
        let position = view.position();
        if origin == position {
            view.drag_phase = DragPhase::None;
            return;
        }

        self.context.set_ignore_click(true);

        if view.pending {
            view.drag_phase = DragPhase::None;
            if let Some(service) = db.service_mut(service_id) {
                service.dragged = true;
                service.x = Some(position.x);
                service.y = Some(position.y);
            }
            debug!(service_id, "pending service position kept locally");
            return;
        }

        let mut patch = Annotations::new();
        patch.insert(ANNOTATION_X.to_owned(), Value::from(f64::from(position.x)));
        patch.insert(ANNOTATION_Y.to_owned(), Value::from(f64::from(position.y)));
        let reply = Reply::new(
            PendingCall::AnnotationsUpdated {
                service_id: service_id.to_owned(),
                drag_generation: view.drag_generation,
            },
            self.reply_sender(),
        );

        debug!(service_id, x = position.x, y = position.y, "persisting position");
        self.calls_in_flight += 1;
        env.update_annotations(service_id, patch, reply);
    }

    /// Acknowledgment of a position write; a later drag supersedes it.
    pub(super) fn settle_drag(
        &mut self,
        service_id: &str,
        drag_generation: u64,
        result: Result<(), EnvError>,
    ) {
        if let Err(error) = result {
            warn!(service_id, %error, "position update failed; node left unsettled");
            return;
        }

        let Some(view) = self.store.get_mut(service_id) else {
            debug!(service_id, "position acknowledged for a removed service");
            return;
        };
        if view.drag_generation != drag_generation {
            debug!(service_id, "stale position acknowledgment ignored");
            return;
        }

        view.drag_phase = DragPhase::None;
        view.drag_origin = None;
        self.context.emit(TopologyEvent::ServiceMoved {
            service_id: service_id.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use eframe::egui::pos2;

    use crate::env::{ANNOTATION_X, ANNOTATION_Y, Service};

    use super::super::testing::{RecordingScene, ScriptedEnvironment, module, service};
    use super::super::ClickAction;
    use super::*;

    fn setup() -> (ServiceModule<RecordingScene>, Database) {
        let mut module = module();
        let mut db = Database::new(vec![service("mysql", 1), service("wordpress", 1)], Vec::new());
        module.update(&mut db);
        module.take_events();
        (module, db)
    }

    /// Screen point well inside the artwork of a box.
    fn inside(module: &ServiceModule<RecordingScene>, id: &str) -> Pos2 {
        let view = module.view_box(id).expect("box");
        module.context().transform().to_screen(view.position() + view.size() / 2.0)
    }

    fn press_drag_release(
        module: &mut ServiceModule<RecordingScene>,
        db: &mut Database,
        env: &ScriptedEnvironment,
        from: Pos2,
        by: Vec2,
    ) {
        let at = Instant::now();
        module.handle_pointer(PointerEvent::Down { pos: from, at }, db, env);
        module.handle_pointer(PointerEvent::Move { pos: from + by, at }, db, env);
        module.handle_pointer(PointerEvent::Up { pos: from + by, at }, db, env);
    }

    fn click(
        module: &mut ServiceModule<RecordingScene>,
        db: &mut Database,
        env: &ScriptedEnvironment,
        pos: Pos2,
    ) {
        let at = Instant::now();
        module.handle_pointer(PointerEvent::Down { pos, at }, db, env);
        module.handle_pointer(PointerEvent::Up { pos, at }, db, env);
    }

    #[test]
    fn click_toggles_the_menu() {
        let (mut module, mut db) = setup();
        let env = ScriptedEnvironment::default();
        let pos = inside(&module, "mysql");

        click(&mut module, &mut db, &env, pos);
        assert_eq!(module.context().active_service(), Some("mysql"));
        assert!(module.menu().placement.is_some());

        click(&mut module, &mut db, &env, pos);
        assert_eq!(module.context().active_service(), None);
    }

    #[test]
    fn clicking_another_service_switches_the_menu() {
        let (mut module, mut db) = setup();
        let env = ScriptedEnvironment::default();
        let mysql = inside(&module, "mysql");
        let wordpress = inside(&module, "wordpress");

        click(&mut module, &mut db, &env, mysql);
        click(&mut module, &mut db, &env, wordpress);
        assert_eq!(module.context().active_service(), Some("wordpress"));
    }

    #[test]
    fn canvas_click_clears_state() {
        let (mut module, mut db) = setup();
        let env = ScriptedEnvironment::default();
        let pos = inside(&module, "mysql");
        click(&mut module, &mut db, &env, pos);

        click(&mut module, &mut db, &env, pos2(-500.0, -500.0));
        assert_eq!(module.context().active_service(), None);
        assert!(module.take_events().contains(&TopologyEvent::ClearState));
    }

    #[test]
    fn click_in_the_bottom_margin_is_ignored() {
        let (mut module, mut db) = setup();
        let env = ScriptedEnvironment::default();
        let view = module.view_box("mysql").expect("box").clone();
        let margin = module
            .context()
            .transform()
            .to_screen(view.position() + Vec2::new(view.w / 2.0, view.h - 1.0));

        click(&mut module, &mut db, &env, margin);
        assert_eq!(module.context().active_service(), None);
    }

    #[test]
    fn drag_moves_the_box_in_world_units_and_persists_the_position() {
        let (mut module, mut db) = setup();
        let env = ScriptedEnvironment::default();
        let mut transform = module.context().transform();
        transform.scale = 2.0;
        module.set_transform(transform);
        let before = module.view_box("mysql").expect("box").position();

        let pos = inside(&module, "mysql");
        press_drag_release(&mut module, &mut db, &env, pos, Vec2::new(40.0, 20.0));

        let view = module.view_box("mysql").expect("box");
        assert_eq!(view.position(), before + Vec2::new(20.0, 10.0));
        assert_eq!(view.drag_phase, DragPhase::Active);
        assert_eq!(module.calls_in_flight(), 1);

        let calls = env.annotation_calls.borrow();
        assert_eq!(calls.len(), 1);
        let (service_id, patch, _) = &calls[0];
        assert_eq!(service_id, "mysql");
        assert_eq!(patch[ANNOTATION_X], Value::from(f64::from(before.x + 20.0)));
        assert_eq!(patch[ANNOTATION_Y], Value::from(f64::from(before.y + 10.0)));
    }

    #[test]
    fn acknowledged_position_settles_the_drag() {
        let (mut module, mut db) = setup();
        let env = ScriptedEnvironment::default();
        let pos = inside(&module, "mysql");
        press_drag_release(&mut module, &mut db, &env, pos, Vec2::new(30.0, 0.0));
        module.take_events();

        env.resolve_annotations(Ok(()));
        module.poll_completions(&mut db);

        let view = module.view_box("mysql").expect("box");
        assert_eq!(view.drag_phase, DragPhase::None);
        assert_eq!(module.calls_in_flight(), 0);
        assert_eq!(
            module.take_events(),
            vec![TopologyEvent::ServiceMoved {
                service_id: "mysql".to_owned()
            }]
        );
    }

    #[test]
    fn failed_position_write_leaves_the_drag_unsettled() {
        let (mut module, mut db) = setup();
        let env = ScriptedEnvironment::default();
        let pos = inside(&module, "mysql");
        press_drag_release(&mut module, &mut db, &env, pos, Vec2::new(30.0, 0.0));

        env.resolve_annotations(Err(EnvError::Rejected("boom".to_owned())));
        module.poll_completions(&mut db);

        assert_eq!(module.view_box("mysql").expect("box").drag_phase, DragPhase::Active);
        assert_eq!(module.calls_in_flight(), 0);
    }

    #[test]
    fn late_acknowledgment_of_an_earlier_drag_is_ignored() {
        let (mut module, mut db) = setup();
        let env = ScriptedEnvironment::default();
        let pos = inside(&module, "mysql");
        press_drag_release(&mut module, &mut db, &env, pos, Vec2::new(30.0, 0.0));
        let pos = inside(&module, "mysql");
        press_drag_release(&mut module, &mut db, &env, pos, Vec2::new(30.0, 0.0));

        env.resolve_annotations(Ok(()));
        module.poll_completions(&mut db);
        assert_eq!(module.view_box("mysql").expect("box").drag_phase, DragPhase::Active);

        env.resolve_annotations(Ok(()));
        module.poll_completions(&mut db);
        assert_eq!(module.view_box("mysql").expect("box").drag_phase, DragPhase::None);
    }

    #[test]
    fn click_after_drag_is_suppressed_once() {
        let (mut module, mut db) = setup();
        let env = ScriptedEnvironment::default();
        let start = inside(&module, "mysql");
        let by = Vec2::new(30.0, 0.0);

        press_drag_release(&mut module, &mut db, &env, start, by);
        module.handle_pointer(PointerEvent::Click { pos: start + by }, &mut db, &env);
        assert_eq!(module.context().active_service(), None);

        click(&mut module, &mut db, &env, start + by);
        assert_eq!(module.context().active_service(), Some("mysql"));
    }

    #[test]
    fn dragging_hides_the_menu_on_first_move() {
        let (mut module, mut db) = setup();
        let env = ScriptedEnvironment::default();
        let start = inside(&module, "mysql");
        click(&mut module, &mut db, &env, start);
        assert!(module.context().active_service().is_some());

        press_drag_release(&mut module, &mut db, &env, start, Vec2::new(30.0, 0.0));
        assert_eq!(module.context().active_service(), None);
    }

    #[test]
    fn press_without_movement_does_not_persist() {
        let (mut module, mut db) = setup();
        let env = ScriptedEnvironment::default();
        module.drag_start("mysql");
        module.drag_end("mysql", &mut db, &env);

        assert!(env.annotation_calls.borrow().is_empty());
        assert_eq!(module.view_box("mysql").expect("box").drag_phase, DragPhase::None);
        assert!(!module.context().ignore_click());
    }

    #[test]
    fn pending_service_drag_stays_local() {
        let mut module = module();
        let mut ghost = Service::new("ghost", "cs:precise/ghost-1");
        ghost.pending = true;
        let mut db = Database::new(vec![ghost], Vec::new());
        module.update(&mut db);
        let env = ScriptedEnvironment::default();
        let start = inside(&module, "ghost");

        press_drag_release(&mut module, &mut db, &env, start, Vec2::new(25.0, 5.0));

        assert!(env.annotation_calls.borrow().is_empty());
        let view = module.view_box("ghost").expect("box").clone();
        let ghost = db.service("ghost").expect("service");
        assert!(ghost.dragged);
        assert_eq!((ghost.x, ghost.y), (view.x, view.y));
        assert_eq!(view.drag_phase, DragPhase::None);
    }

    #[test]
    fn clicking_a_pending_service_opens_the_charm_panel() {
        let mut module = module();
        let mut ghost = Service::new("ghost", "cs:precise/ghost-1");
        ghost.pending = true;
        let mut db = Database::new(vec![ghost], Vec::new());
        module.update(&mut db);
        module.take_events();
        let env = ScriptedEnvironment::default();

        let pos = inside(&module, "ghost");
        click(&mut module, &mut db, &env, pos);

        let events = module.take_events();
        assert!(events.contains(&TopologyEvent::ShowCharmPanel));
        assert_eq!(module.context().active_service(), None);
    }

    #[test]
    fn long_press_builds_a_relation_and_swallows_the_click() {
        let (mut module, mut db) = setup();
        let env = ScriptedEnvironment::default();
        let pos = inside(&module, "mysql");
        let start = Instant::now();

        module.handle_pointer(PointerEvent::Down { pos, at: start }, &mut db, &env);
        module.tick(start + Duration::from_millis(800), &mut db, &env);
        assert!(module.context().building_relation());

        let target = inside(&module, "wordpress");
        let later = start + Duration::from_millis(900);
        module.handle_pointer(PointerEvent::Move { pos: target, at: later }, &mut db, &env);
        module.handle_pointer(PointerEvent::Up { pos: target, at: later }, &mut db, &env);

        assert!(!module.context().building_relation());
        let events = module.take_events();
        assert_eq!(
            events,
            vec![
                TopologyEvent::AddRelationDragStart {
                    service_id: "mysql".to_owned()
                },
                TopologyEvent::AddRelationDrag {
                    service_id: "mysql".to_owned()
                },
                TopologyEvent::AddRelationDragEnd,
            ]
        );
        assert!(env.annotation_calls.borrow().is_empty());
        assert_eq!(module.context().active_service(), None);
    }

    #[test]
    fn position_hint_for_another_service_keeps_the_long_press() {
        let (mut module, mut db) = setup();
        let env = ScriptedEnvironment::default();
        let pos = inside(&module, "mysql");
        let start = Instant::now();

        module.handle_pointer(PointerEvent::Down { pos, at: start }, &mut db, &env);
        let wordpress = module.view_box("wordpress").expect("box").position();
        let service = db.service_mut("wordpress").expect("service");
        service
            .annotations
            .insert(ANNOTATION_X.to_owned(), Value::from(f64::from(wordpress.x) + 300.0));
        service
            .annotations
            .insert(ANNOTATION_Y.to_owned(), Value::from(f64::from(wordpress.y) + 200.0));
        module.update(&mut db);
        assert_eq!(
            module.view_box("wordpress").expect("box").position(),
            wordpress + Vec2::new(300.0, 200.0)
        );

        module.tick(start + Duration::from_millis(800), &mut db, &env);
        assert!(module.context().building_relation());
    }

    #[test]
    fn click_on_overlapping_boxes_hits_the_one_added_last() {
        let mut module = module();
        let env = ScriptedEnvironment::default();
        let mut db = Database::new(vec![service("zookeeper", 1)], Vec::new());
        module.update(&mut db);
        db.add_service(service("apache", 1));
        module.update(&mut db);
        assert_eq!(
            module.view_box("apache").expect("box").position(),
            module.view_box("zookeeper").expect("box").position()
        );

        let pos = inside(&module, "apache");
        click(&mut module, &mut db, &env, pos);
        assert_eq!(module.context().active_service(), Some("apache"));
    }

    #[test]
    fn canvas_drag_pans() {
        let (mut module, mut db) = setup();
        let env = ScriptedEnvironment::default();
        press_drag_release(&mut module, &mut db, &env, pos2(-400.0, -400.0), Vec2::new(10.0, 6.0));
        assert_eq!(module.context().transform().translate, Vec2::new(10.0, 6.0));
    }

    #[test]
    fn double_click_navigates_to_details() {
        let (mut module, mut db) = setup();
        let env = ScriptedEnvironment::default();
        let pos = inside(&module, "mysql");
        module.handle_pointer(
            PointerEvent::DoubleClick { pos },
            &mut db,
            &env,
        );
        assert_eq!(
            module.take_events(),
            vec![TopologyEvent::NavigateTo {
                url: "/service/mysql/".to_owned()
            }]
        );
    }

    #[test]
    fn configured_click_action_is_dispatched() {
        let (mut module, mut db) = setup();
        let env = ScriptedEnvironment::default();
        module.set_click_action(ClickAction::ViewDetails);

        let pos = inside(&module, "wordpress");
        click(&mut module, &mut db, &env, pos);
        assert_eq!(
            module.take_events(),
            vec![TopologyEvent::NavigateTo {
                url: "/service/wordpress/".to_owned()
            }]
        );
    }
}
