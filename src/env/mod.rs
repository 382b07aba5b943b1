mod client;
mod fixture;
mod model;

pub use client::{Completion, EnvError, Environment, PendingCall, Reply, SimulatedEnvironment};
pub use fixture::{demo_database, load_database};
pub use model::{
    ANNOTATION_X, ANNOTATION_Y, Annotations, Database, Endpoint, ModelChange, Notification,
    NotificationLevel, Relation, Service, Unit, UnitStatus,
};
