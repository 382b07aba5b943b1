//! Doubles shared by the topology tests.

use std::cell::RefCell;
use std::collections::BTreeMap;

use eframe::egui::{Pos2, vec2};

use crate::env::{Annotations, EnvError, Environment, Reply, Service, Unit};

use super::scale::NodeMetrics;
use super::scene::SceneBackend;
use super::viewbox::ViewBox;
use super::{ServiceModule, TopologyConfig};

#[derive(Debug, Default)]
pub struct RecordingScene {
    next: u32,
    pub live: BTreeMap<u32, String>,
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub moves: Vec<(u32, Pos2)>,
}

impl SceneBackend for RecordingScene {
    type Handle = u32;

    fn create_node(&mut self, view: &ViewBox) -> u32 {
        self.next += 1;
        self.created += 1;
        self.live.insert(self.next, view.id.clone());
        self.next
    }

    fn update_node(&mut self, handle: u32, view: &ViewBox, _metrics: &NodeMetrics) {
        assert_eq!(self.live.get(&handle), Some(&view.id));
        self.updated += 1;
    }

    fn move_node(&mut self, handle: u32, position: Pos2) {
        self.moves.push((handle, position));
    }

    fn remove_node(&mut self, handle: u32) {
        assert!(self.live.remove(&handle).is_some(), "node removed twice");
        self.removed += 1;
    }
}

/// Environment that holds every reply until the test resolves it.
#[derive(Debug, Default)]
pub struct ScriptedEnvironment {
    pub annotation_calls: RefCell<Vec<(String, Annotations, Reply)>>,
    pub destroy_calls: RefCell<Vec<(String, Reply)>>,
}

impl ScriptedEnvironment {
    /// Answer the oldest outstanding annotation update.
    pub fn resolve_annotations(&self, result: Result<(), EnvError>) {
        let (_, _, reply) = self.annotation_calls.borrow_mut().remove(0);
        reply.send(result);
    }

    pub fn resolve_destroy(&self, result: Result<(), EnvError>) {
        let (_, reply) = self.destroy_calls.borrow_mut().remove(0);
        reply.send(result);
    }
}

impl Environment for ScriptedEnvironment {
    fn update_annotations(&self, service_id: &str, patch: Annotations, reply: Reply) {
        self.annotation_calls
            .borrow_mut()
            .push((service_id.to_owned(), patch, reply));
    }

    fn destroy_service(&self, service_id: &str, reply: Reply) {
        self.destroy_calls
            .borrow_mut()
            .push((service_id.to_owned(), reply));
    }
}

pub fn module() -> ServiceModule<RecordingScene> {
    module_with(TopologyConfig::default())
}

pub fn module_with(config: TopologyConfig) -> ServiceModule<RecordingScene> {
    ServiceModule::new(config, RecordingScene::default(), vec2(1000.0, 800.0))
}

pub fn service(id: &str, units: usize) -> Service {
    let mut service = Service::new(id, format!("cs:precise/{id}-1"));
    service.units = (0..units)
        .map(|index| Unit {
            id: format!("{id}/{index}"),
            agent_state: "started".to_owned(),
            agent_state_hook: None,
        })
        .collect();
    service
}
