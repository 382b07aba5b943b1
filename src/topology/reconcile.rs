use std::collections::HashSet;

use eframe::egui::{Pos2, pos2, vec2};
use tracing::{debug, info};

use crate::env::Database;

use super::interaction::DragMotion;
use super::pack::{origin_for_center, pack_centers};
use super::scale::NodeMetrics;
use super::scene::SceneBackend;
use super::viewbox::{DragPhase, ViewBox};
use super::ServiceModule;

/// When annotation position hints move a node that is already placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum AnnotationSyncPolicy {
    /// Only when both `gui.x` and `gui.y` differ from the current position.
    #[default]
    BothAxes,
    /// When either coordinate differs; a missing axis keeps its value.
    EitherAxis,
}

impl AnnotationSyncPolicy {
    pub fn target(self, view: &ViewBox, hint: (Option<f32>, Option<f32>)) -> Option<Pos2> {
        let (x, y) = hint;
        let x_moved = x.is_some_and(|x| view.x != Some(x));
        let y_moved = y.is_some_and(|y| view.y != Some(y));

        let reposition = match self {
            Self::BothAxes => x_moved && y_moved,
            Self::EitherAxis => x_moved || y_moved,
        };

        reposition.then(|| {
            pos2(
                x.or(view.x).unwrap_or_default(),
                y.or(view.y).unwrap_or_default(),
            )
        })
    }
}

/// Ids touched by one reconciliation pass; the three sets are disjoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Delta {
    pub entered: Vec<String>,
    pub updated: Vec<String>,
    pub exited: Vec<String>,
}

impl Delta {
    pub fn is_structural(&self) -> bool {
        !self.entered.is_empty() || !self.exited.is_empty()
    }
}

impl<S: SceneBackend> ServiceModule<S> {
    /// Bring the boxes and their visuals in line with the database.
    ///
    /// Safe to run redundantly: a pass with no model change creates and
    /// removes nothing.
    pub fn update(&mut self, db: &mut Database) -> Delta {
        let live = db
            .services()
            .iter()
            .map(|service| service.id.as_str())
            .collect::<HashSet<_>>();
        let exited = self
            .store
            .keys()
            .filter(|id| !live.contains(id.as_str()))
            .cloned()
            .collect::<Vec<_>>();
        for id in &exited {
            self.remove_box(id);
        }

        let mut entered = Vec::new();
        let mut updated = Vec::new();
        for service in db.services() {
            let size = self.scale.size(service.unit_count());
            match self.store.get_mut(&service.id) {
                Some(view) => {
                    view.sync_from(service);
                    view.w = size.x;
                    view.h = size.y;
                    updated.push(service.id.clone());
                }
                None => {
                    let mut view = ViewBox::from_service(service);
                    view.w = size.x;
                    view.h = size.y;
                    self.next_stack_order += 1;
                    view.stack_order = self.next_stack_order;
                    self.store.insert(service.id.clone(), view);
                    entered.push(service.id.clone());
                }
            }
        }

        self.place_new_boxes();

        for id in &entered {
            if let Some(view) = self.store.get(id) {
                let handle = self.scene.create_node(view);
                self.handles.insert(id.clone(), handle);
            }
        }

        self.apply_position_hints(db);
        self.refresh_visuals();
        self.update_menu_location();

        let delta = Delta {
            entered,
            updated,
            exited,
        };
        if delta.is_structural() {
            info!(
                entered = delta.entered.len(),
                exited = delta.exited.len(),
                total = self.store.len(),
                "topology reconciled"
            );
        }
        delta
    }

    fn remove_box(&mut self, service_id: &str) {
        if self.context.active_service() == Some(service_id) {
            self.hide_menu();
        }
        self.store.remove(service_id);
        if let Some(handle) = self.handles.remove(service_id) {
            self.scene.remove_node(handle);
        }
        self.gestures.forget(service_id);
    }

    /// Pack only the boxes that have never been placed.
    fn place_new_boxes(&mut self) {
        let unplaced = self
            .store
            .values()
            .filter(|view| !view.is_placed())
            .map(|view| (view.id.clone(), view.unit_count))
            .collect::<Vec<_>>();
        if unplaced.is_empty() {
            return;
        }

        let weights = unplaced
            .iter()
            .map(|(_, weight)| *weight)
            .collect::<Vec<_>>();
        let canvas = vec2(self.context.width(), self.context.height());
        let centers = pack_centers(&weights, canvas, self.config.pack_padding);

        for ((id, _), center) in unplaced.iter().zip(centers) {
            if let Some(view) = self.store.get_mut(id) {
                let origin = origin_for_center(center, view.size());
                view.set_position(origin);
            }
        }
        debug!(count = unplaced.len(), "packed new services");
    }

    /// Consume `gui.x`/`gui.y` hints, moving nodes through the drag path.
    fn apply_position_hints(&mut self, db: &mut Database) {
        let policy = self.config.annotation_sync;
        let mut moves = Vec::new();

        for service in db.services_mut() {
            let Some(view) = self.store.get(&service.id) else {
                continue;
            };
            let Some(target) = policy.target(view, service.position_hint()) else {
                continue;
            };

            service.clear_position_hint();
            if view.drag_phase == DragPhase::None {
                moves.push((service.id.clone(), target));
            }
        }

        for (service_id, target) in moves {
            debug!(service_id, x = target.x, y = target.y, "applying position annotation");
            self.drag(&service_id, DragMotion::To(target));
        }
    }

    fn refresh_visuals(&mut self) {
        for (id, view) in &self.store {
            if let Some(&handle) = self.handles.get(id) {
                let metrics = NodeMetrics::for_box(view);
                self.scene.update_node(handle, view, &metrics);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde_json::Value;

    use crate::env::{ANNOTATION_X, ANNOTATION_Y, Service};

    use super::super::testing::{module, service};
    use super::super::{TopologyConfig, TopologyEvent};
    use super::*;

    fn database(ids: &[&str]) -> Database {
        Database::new(ids.iter().map(|id| service(id, 1)).collect(), Vec::new())
    }

    fn store_ids<S: SceneBackend>(module: &ServiceModule<S>) -> BTreeSet<String> {
        module.store().keys().cloned().collect()
    }

    fn hint(db: &mut Database, id: &str, x: Option<f64>, y: Option<f64>) {
        let service = db.service_mut(id).expect("service exists");
        if let Some(x) = x {
            service.annotations.insert(ANNOTATION_X.to_owned(), Value::from(x));
        }
        if let Some(y) = y {
            service.annotations.insert(ANNOTATION_Y.to_owned(), Value::from(y));
        }
    }

    #[test]
    fn store_matches_collection_membership() {
        let mut module = module();
        let mut db = database(&["mysql", "wordpress", "memcached"]);

        let delta = module.update(&mut db);
        assert_eq!(delta.entered.len(), 3);
        assert_eq!(
            store_ids(&module),
            ["memcached", "mysql", "wordpress"]
                .into_iter()
                .map(str::to_owned)
                .collect()
        );
        assert_eq!(module.scene().live.len(), 3);

        db.destroy_service("memcached");
        db.add_service(service("haproxy", 2));
        let delta = module.update(&mut db);

        assert_eq!(delta.entered, vec!["haproxy".to_owned()]);
        assert_eq!(delta.exited, vec!["memcached".to_owned()]);
        assert_eq!(delta.updated.len(), 2);
        let expected = db
            .services()
            .iter()
            .map(|service| service.id.clone())
            .collect::<BTreeSet<_>>();
        assert_eq!(store_ids(&module), expected);
        assert_eq!(
            module.scene().live.values().cloned().collect::<BTreeSet<_>>(),
            expected
        );
    }

    #[test]
    fn second_pass_without_changes_creates_and_removes_nothing() {
        let mut module = module();
        let mut db = database(&["mysql", "wordpress"]);
        module.update(&mut db);
        let created = module.scene().created;
        let removed = module.scene().removed;

        let delta = module.update(&mut db);
        assert!(!delta.is_structural());
        assert_eq!(module.scene().created, created);
        assert_eq!(module.scene().removed, removed);
    }

    #[test]
    fn reordering_the_collection_keeps_identity() {
        let mut module = module();
        let mut db = database(&["a", "b", "c"]);
        module.update(&mut db);
        let before = module.scene().live.clone();

        let mut reversed = database(&["c", "b", "a"]);
        let delta = module.update(&mut reversed);
        assert!(!delta.is_structural());
        assert_eq!(module.scene().live, before);
    }

    #[test]
    fn placed_boxes_are_never_repacked() {
        let mut module = module();
        let mut db = database(&["mysql"]);
        module.update(&mut db);
        let before = module.view_box("mysql").expect("box").position();

        db.add_service(service("wordpress", 1));
        db.add_service(service("haproxy", 1));
        module.update(&mut db);

        assert_eq!(module.view_box("mysql").expect("box").position(), before);
        assert!(module.store().values().all(ViewBox::is_placed));
    }

    #[test]
    fn boxes_are_sized_from_unit_count() {
        let mut module = module();
        let mut db = Database::new(vec![service("rsyslog", 0), service("mysql", 10)], Vec::new());
        module.update(&mut db);

        let rsyslog = module.view_box("rsyslog").expect("box");
        assert_eq!((rsyslog.w, rsyslog.h), (164.0, 64.0));
        let mysql = module.view_box("mysql").expect("box");
        assert!((mysql.w - 200.0).abs() < 1e-3);
    }

    #[test]
    fn removing_the_active_service_closes_its_menu() {
        let mut module = module();
        let mut db = database(&["mysql", "wordpress"]);
        module.update(&mut db);
        module.dispatch(super::super::ClickAction::ToggleMenu, Some("mysql"), &db);
        assert_eq!(module.context().active_service(), Some("mysql"));

        db.destroy_service("mysql");
        module.update(&mut db);
        assert_eq!(module.context().active_service(), None);
        assert!(module.menu().placement.is_none());
    }

    #[test]
    fn both_axes_hint_moves_through_the_drag_path_and_is_consumed() {
        let mut module = module();
        let mut db = database(&["mysql"]);
        module.update(&mut db);
        module.take_events();

        hint(&mut db, "mysql", Some(40.0), Some(60.0));
        module.update(&mut db);

        let view = module.view_box("mysql").expect("box");
        assert_eq!((view.x, view.y), (Some(40.0), Some(60.0)));
        assert!(db.service("mysql").expect("service").annotations.is_empty());
        assert!(module.take_events().contains(&TopologyEvent::ServiceMoved {
            service_id: "mysql".to_owned()
        }));
    }

    #[test]
    fn hint_matching_current_position_is_ignored() {
        let mut module = module();
        let mut db = database(&["mysql"]);
        module.update(&mut db);
        let view = module.view_box("mysql").expect("box").clone();
        module.take_events();

        hint(
            &mut db,
            "mysql",
            view.x.map(f64::from),
            view.y.map(f64::from),
        );
        module.update(&mut db);

        assert!(module.take_events().is_empty());
        assert_eq!(db.service("mysql").expect("service").annotations.len(), 2);
    }

    #[test]
    fn single_axis_change_is_ignored_with_both_axes_policy() {
        let mut module = module();
        let mut db = database(&["mysql"]);
        module.update(&mut db);
        let before = module.view_box("mysql").expect("box").clone();

        hint(&mut db, "mysql", Some(f64::from(before.x.unwrap_or(0.0)) + 50.0), before.y.map(f64::from));
        module.update(&mut db);

        let after = module.view_box("mysql").expect("box");
        assert_eq!(after.position(), before.position());
    }

    #[test]
    fn single_axis_change_moves_with_either_axis_policy() {
        let config = TopologyConfig {
            annotation_sync: AnnotationSyncPolicy::EitherAxis,
            ..TopologyConfig::default()
        };
        let mut module = super::super::testing::module_with(config);
        let mut db = database(&["mysql"]);
        module.update(&mut db);
        let before = module.view_box("mysql").expect("box").clone();
        let new_x = before.x.unwrap_or(0.0) + 50.0;

        hint(&mut db, "mysql", Some(f64::from(new_x)), None);
        module.update(&mut db);

        let after = module.view_box("mysql").expect("box");
        assert_eq!(after.x, Some(new_x));
        assert_eq!(after.y, before.y);
        assert!(db.service("mysql").expect("service").annotations.is_empty());
    }

    #[test]
    fn hint_is_consumed_but_not_applied_mid_drag() {
        let mut module = module();
        let mut db = database(&["mysql"]);
        module.update(&mut db);
        let before = module.view_box("mysql").expect("box").position();
        module.drag_start("mysql");

        hint(&mut db, "mysql", Some(1.0), Some(2.0));
        module.update(&mut db);

        assert_eq!(module.view_box("mysql").expect("box").position(), before);
        assert!(db.service("mysql").expect("service").annotations.is_empty());
    }

    #[test]
    fn pending_service_keeps_its_dragged_position() {
        let mut module = module();
        let mut pending = Service::new("ghost", "cs:precise/ghost-1");
        pending.pending = true;
        pending.x = Some(12.0);
        pending.y = Some(34.0);
        let mut db = Database::new(vec![pending], Vec::new());

        module.update(&mut db);
        let view = module.view_box("ghost").expect("box");
        assert!(view.pending);
        assert_eq!((view.x, view.y), (Some(12.0), Some(34.0)));
    }
}
