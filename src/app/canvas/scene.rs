use std::collections::BTreeMap;

use eframe::egui::Pos2;

use crate::env::UnitStatus;
use crate::topology::{Margins, NodeMetrics, SceneBackend, ViewBox};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(in crate::app) struct NodeHandle(u64);

/// Retained drawing state for one service node.
#[derive(Clone, Debug)]
pub(in crate::app) struct CanvasNode {
    pub service_id: String,
    pub charm: String,
    pub position: Pos2,
    pub metrics: Option<NodeMetrics>,
    pub margins: Margins,
    pub pending: bool,
    pub subordinate: bool,
    pub exposed: bool,
    pub unit_count: u64,
    pub status: Vec<(UnitStatus, u64)>,
}

#[derive(Debug, Default)]
pub(in crate::app) struct CanvasScene {
    next: u64,
    nodes: BTreeMap<NodeHandle, CanvasNode>,
}

impl CanvasScene {
    /// Nodes in creation order, which is also paint order.
    pub(in crate::app) fn nodes(&self) -> impl Iterator<Item = &CanvasNode> {
        self.nodes.values()
    }

    pub(in crate::app) fn node(&self, service_id: &str) -> Option<&CanvasNode> {
        self.nodes
            .values()
            .find(|node| node.service_id == service_id)
    }
}

impl SceneBackend for CanvasScene {
    type Handle = NodeHandle;

    fn create_node(&mut self, view: &ViewBox) -> NodeHandle {
        self.next += 1;
        let handle = NodeHandle(self.next);
        self.nodes.insert(
            handle,
            CanvasNode {
                service_id: view.id.clone(),
                charm: String::new(),
                position: view.position(),
                metrics: None,
                margins: view.margins(),
                pending: view.pending,
                subordinate: view.subordinate,
                exposed: view.exposed,
                unit_count: view.unit_count,
                status: Vec::new(),
            },
        );
        handle
    }

    fn update_node(&mut self, handle: NodeHandle, view: &ViewBox, metrics: &NodeMetrics) {
        let Some(node) = self.nodes.get_mut(&handle) else {
            return;
        };
        node.charm = crate::util::charm_name(&view.charm).to_owned();
        node.position = view.position();
        node.metrics = Some(*metrics);
        node.margins = view.margins();
        node.pending = view.pending;
        node.subordinate = view.subordinate;
        node.exposed = view.exposed;
        node.unit_count = view.unit_count;
        node.status = view
            .aggregated_status
            .iter()
            .map(|(status, count)| (*status, *count))
            .collect();
    }

    fn move_node(&mut self, handle: NodeHandle, position: Pos2) {
        if let Some(node) = self.nodes.get_mut(&handle) {
            node.position = position;
        }
    }

    fn remove_node(&mut self, handle: NodeHandle) {
        self.nodes.remove(&handle);
    }
}
