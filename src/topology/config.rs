use std::time::Duration;

use super::actions::ClickAction;
use super::reconcile::AnnotationSyncPolicy;

#[derive(Clone, Debug)]
pub struct TopologyConfig {
    pub long_press_delay: Duration,
    /// Largest averaged `(|dx| + |dy|) / 2` pointer travel that still counts
    /// as holding still for a long press.
    pub long_press_tolerance: f32,
    pub drag_threshold: f32,
    pub annotation_sync: AnnotationSyncPolicy,
    /// Charm whose service may not be destroyed from the menu.
    pub protected_charm: String,
    pub pack_padding: f32,
    pub click_action: ClickAction,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            long_press_delay: Duration::from_millis(750),
            long_press_tolerance: 5.0,
            drag_threshold: 4.0,
            annotation_sync: AnnotationSyncPolicy::BothAxes,
            protected_charm: "juju-gui".to_owned(),
            pack_padding: 300.0,
            click_action: ClickAction::ToggleMenu,
        }
    }
}
