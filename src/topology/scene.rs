use std::fmt::Debug;

use eframe::egui::Pos2;

use super::scale::NodeMetrics;
use super::viewbox::ViewBox;

/// Rendering surface that owns the visual element for each service.
///
/// The reconciler only ever holds opaque handles; what a node looks like
/// is up to the backend.
pub trait SceneBackend {
    type Handle: Copy + Eq + Debug;

    fn create_node(&mut self, view: &ViewBox) -> Self::Handle;
    fn update_node(&mut self, handle: Self::Handle, view: &ViewBox, metrics: &NodeMetrics);
    fn move_node(&mut self, handle: Self::Handle, position: Pos2);
    fn remove_node(&mut self, handle: Self::Handle);
}
