use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::util::charm_name;

pub const ANNOTATION_X: &str = "gui.x";
pub const ANNOTATION_Y: &str = "gui.y";

pub type Annotations = BTreeMap<String, Value>;

/// Coarse unit health, ordered the way status charts stack it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnitStatus {
    Error,
    Pending,
    Running,
}

impl UnitStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Pending => "pending",
            Self::Running => "running",
        }
    }

    fn from_agent_state(agent_state: &str) -> Self {
        if agent_state.contains("error") {
            Self::Error
        } else if agent_state == "started" {
            Self::Running
        } else {
            Self::Pending
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Unit {
    pub id: String,
    #[serde(default = "default_agent_state")]
    pub agent_state: String,
    #[serde(default)]
    pub agent_state_hook: Option<String>,
}

fn default_agent_state() -> String {
    "pending".to_owned()
}

impl Unit {
    pub fn status(&self) -> UnitStatus {
        UnitStatus::from_agent_state(&self.agent_state)
    }

    pub fn failed_in_relation_hook(&self) -> bool {
        self.status() == UnitStatus::Error
            && self
                .agent_state_hook
                .as_deref()
                .is_some_and(|hook| hook.contains("relation"))
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
    pub id: String,
    #[serde(default)]
    pub charm: String,
    #[serde(default)]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub subordinate: bool,
    #[serde(default)]
    pub exposed: bool,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub annotations: Annotations,
    /// Set when a pending service was dragged before the environment
    /// confirmed it; `x`/`y` are persisted as annotations on deploy.
    #[serde(skip)]
    pub dragged: bool,
    #[serde(skip)]
    pub x: Option<f32>,
    #[serde(skip)]
    pub y: Option<f32>,
}

impl Service {
    pub fn new(id: impl Into<String>, charm: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            charm: charm.into(),
            units: Vec::new(),
            subordinate: false,
            exposed: false,
            pending: false,
            annotations: Annotations::new(),
            dragged: false,
            x: None,
            y: None,
        }
    }

    pub fn unit_count(&self) -> u64 {
        self.units.len() as u64
    }

    pub fn charm_name(&self) -> &str {
        charm_name(&self.charm)
    }

    pub fn aggregated_status(&self) -> BTreeMap<UnitStatus, u64> {
        let mut aggregated = BTreeMap::new();
        for unit in &self.units {
            *aggregated.entry(unit.status()).or_insert(0) += 1;
        }
        aggregated
    }

    pub fn has_unit_errors(&self) -> bool {
        self.units
            .iter()
            .any(|unit| unit.status() == UnitStatus::Error)
    }

    pub fn position_hint(&self) -> (Option<f32>, Option<f32>) {
        let read = |key: &str| {
            self.annotations
                .get(key)
                .and_then(Value::as_f64)
                .map(|value| value as f32)
        };
        (read(ANNOTATION_X), read(ANNOTATION_Y))
    }

    pub fn clear_position_hint(&mut self) {
        self.annotations.remove(ANNOTATION_X);
        self.annotations.remove(ANNOTATION_Y);
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Endpoint {
    pub service: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Relation {
    pub id: String,
    pub interface: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    pub endpoints: Vec<Endpoint>,
}

fn default_scope() -> String {
    "global".to_owned()
}

impl Relation {
    pub fn involves(&self, service_id: &str) -> bool {
        self.endpoints
            .iter()
            .any(|endpoint| endpoint.service == service_id)
    }

    pub fn near(&self, service_id: &str) -> Option<&Endpoint> {
        self.endpoints
            .iter()
            .find(|endpoint| endpoint.service == service_id)
    }

    /// The opposite endpoint; `None` for peer relations.
    pub fn far(&self, service_id: &str) -> Option<&Endpoint> {
        self.endpoints
            .iter()
            .find(|endpoint| endpoint.service != service_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub level: NotificationLevel,
    pub link: String,
    pub model_id: String,
}

/// Journal entry describing a change the topology has not yet observed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelChange {
    ServiceAdded(String),
    ServiceDestroyed(String),
    RelationDestroyed(String),
    Updated,
}

#[derive(Clone, Debug, Default)]
pub struct Database {
    services: Vec<Service>,
    relations: Vec<Relation>,
    notifications: Vec<Notification>,
    changes: Vec<ModelChange>,
}

impl Database {
    pub fn new(services: Vec<Service>, relations: Vec<Relation>) -> Self {
        Self {
            services,
            relations,
            notifications: Vec::new(),
            changes: vec![ModelChange::Updated],
        }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn services_mut(&mut self) -> impl Iterator<Item = &mut Service> {
        self.services.iter_mut()
    }

    pub fn service(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|service| service.id == id)
    }

    pub fn service_mut(&mut self, id: &str) -> Option<&mut Service> {
        self.services.iter_mut().find(|service| service.id == id)
    }

    pub fn add_service(&mut self, service: Service) {
        self.changes.push(ModelChange::ServiceAdded(service.id.clone()));
        self.services.push(service);
    }

    pub fn destroy_service(&mut self, id: &str) -> bool {
        let before = self.services.len();
        self.services.retain(|service| service.id != id);
        let removed = self.services.len() != before;
        if removed {
            self.changes.push(ModelChange::ServiceDestroyed(id.to_owned()));
        }
        removed
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn relations_for_service(&self, service_id: &str) -> Vec<&Relation> {
        self.relations
            .iter()
            .filter(|relation| relation.involves(service_id))
            .collect()
    }

    pub fn destroy_relation(&mut self, id: &str) -> bool {
        let before = self.relations.len();
        self.relations.retain(|relation| relation.id != id);
        let removed = self.relations.len() != before;
        if removed {
            self.changes.push(ModelChange::RelationDestroyed(id.to_owned()));
        }
        removed
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn add_notification(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn dismiss_notification(&mut self, index: usize) {
        if index < self.notifications.len() {
            self.notifications.remove(index);
        }
    }

    pub fn fire_update(&mut self) {
        self.changes.push(ModelChange::Updated);
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn take_changes(&mut self) -> Vec<ModelChange> {
        std::mem::take(&mut self.changes)
    }
}
